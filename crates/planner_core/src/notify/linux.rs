use crate::error::AppError;
use crate::notify::{Notice, Notifier};
use notify_rust::Notification;

const APP_NAME: &str = "planner";

pub struct LinuxNotifier;

impl Notifier for LinuxNotifier {
    fn notify(&self, notice: &Notice) -> Result<(), AppError> {
        Notification::new()
            .appname(APP_NAME)
            .summary(&notice.title)
            .body(&notice.message)
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }
}
