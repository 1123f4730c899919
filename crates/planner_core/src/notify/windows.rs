use crate::error::AppError;
use crate::notify::{Notice, Notifier};
use tauri_winrt_notification::Toast;

pub struct WindowsNotifier;

impl Notifier for WindowsNotifier {
    fn notify(&self, notice: &Notice) -> Result<(), AppError> {
        let mut lines = notice.message.splitn(2, '\n');
        let first = lines.next().unwrap_or_default();
        let rest = lines.next().unwrap_or_default().trim_start();

        Toast::new(Toast::POWERSHELL_APP_ID)
            .title(&notice.title)
            .text1(first)
            .text2(rest)
            .show()
            .map_err(|err| AppError::io(err.to_string()))
    }
}
