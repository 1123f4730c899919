//! Background reminder thread.
//!
//! The thread owns its copy of the task list and the time of the last
//! reminder it delivered. The foreground sends [`ReminderCommand`]s and reads
//! [`ReminderEvent`]s back; nothing else is shared between the two.

use crate::agenda;
use crate::config::ReminderSettings;
use crate::error::AppError;
use crate::model::Task;
use crate::notify::{Notice, Notifier};
use crossbeam_channel::{Receiver, Sender, after, select, tick, unbounded};
use std::thread::JoinHandle;
use time::{Duration, OffsetDateTime, UtcOffset};

#[derive(Debug)]
pub enum ReminderCommand {
    /// Swap in a fresh snapshot after the foreground changed the list.
    Replace(Vec<Task>),
    ShowToday,
    /// Run the due-task check now, ignoring the quiet period.
    CheckNow,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderEvent {
    Delivered(Notice),
    Failed { notice: Notice, error: AppError },
}

/// True once strictly more than `quiet_period` has passed since `last`.
pub fn should_remind(last: OffsetDateTime, now: OffsetDateTime, quiet_period: Duration) -> bool {
    now - last > quiet_period
}

pub struct ReminderHandle {
    commands: Sender<ReminderCommand>,
    events: Receiver<ReminderEvent>,
    worker: Option<JoinHandle<()>>,
}

impl ReminderHandle {
    /// Starts the reminder thread. `offset` is resolved by the caller before
    /// any thread exists, since the local offset cannot be queried reliably
    /// from a multi-threaded process.
    pub fn spawn(
        tasks: Vec<Task>,
        settings: ReminderSettings,
        offset: UtcOffset,
        notifier: Box<dyn Notifier>,
    ) -> Result<Self, AppError> {
        let (command_tx, command_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();

        let worker = ReminderWorker {
            tasks,
            settings,
            offset,
            notifier,
            last_notification: OffsetDateTime::now_utc(),
            events: event_tx,
        };

        let handle = std::thread::Builder::new()
            .name("planner-reminder".to_string())
            .spawn(move || worker.run(command_rx))
            .map_err(|err| AppError::io(err.to_string()))?;

        tracing::debug!(
            check_interval_secs = settings.check_interval_secs,
            quiet_period_secs = settings.quiet_period_secs,
            "reminder thread started"
        );

        Ok(Self {
            commands: command_tx,
            events: event_rx,
            worker: Some(handle),
        })
    }

    pub fn send(&self, command: ReminderCommand) -> Result<(), AppError> {
        self.commands
            .send(command)
            .map_err(|_| AppError::io("reminder thread has stopped"))
    }

    pub fn replace_tasks(&self, tasks: Vec<Task>) -> Result<(), AppError> {
        self.send(ReminderCommand::Replace(tasks))
    }

    pub fn events(&self) -> &Receiver<ReminderEvent> {
        &self.events
    }

    /// Drains whatever events are already queued without blocking.
    pub fn try_events(&self) -> Vec<ReminderEvent> {
        self.events.try_iter().collect()
    }

    pub fn shutdown(mut self) -> Result<(), AppError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), AppError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        // A send error means the thread is already gone; join still reaps it.
        let _ = self.commands.send(ReminderCommand::Shutdown);
        worker
            .join()
            .map_err(|_| AppError::io("reminder thread panicked"))?;
        tracing::debug!("reminder thread stopped");
        Ok(())
    }
}

impl Drop for ReminderHandle {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            tracing::warn!(error = %err, "failed to stop reminder thread");
        }
    }
}

struct ReminderWorker {
    tasks: Vec<Task>,
    settings: ReminderSettings,
    offset: UtcOffset,
    notifier: Box<dyn Notifier>,
    last_notification: OffsetDateTime,
    events: Sender<ReminderEvent>,
}

impl ReminderWorker {
    fn run(mut self, commands: Receiver<ReminderCommand>) {
        let ticker = tick(std::time::Duration::from_secs(
            self.settings.check_interval_secs.max(1),
        ));
        let startup = after(std::time::Duration::from_secs(
            self.settings.startup_summary_delay_secs,
        ));

        loop {
            select! {
                recv(commands) -> command => match command {
                    Ok(ReminderCommand::Replace(tasks)) => {
                        tracing::trace!(count = tasks.len(), "reminder snapshot replaced");
                        self.tasks = tasks;
                    }
                    Ok(ReminderCommand::ShowToday) => self.show_today(),
                    Ok(ReminderCommand::CheckNow) => self.check(true),
                    Ok(ReminderCommand::Shutdown) | Err(_) => break,
                },
                recv(ticker) -> _ => self.check(false),
                recv(startup) -> _ => self.show_today(),
            }
        }
    }

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }

    fn show_today(&mut self) {
        let notice = agenda::today_notice(&self.tasks, self.now().date());
        self.deliver(notice);
    }

    fn check(&mut self, force: bool) {
        let now = self.now();
        let quiet_secs = i64::try_from(self.settings.quiet_period_secs).unwrap_or(i64::MAX);
        let quiet = Duration::seconds(quiet_secs);
        if !force && !should_remind(self.last_notification, now, quiet) {
            return;
        }

        let Some(notice) =
            agenda::reminder_notice(&self.tasks, now.date(), self.settings.lookahead_days)
        else {
            return;
        };

        if self.deliver(notice) {
            self.last_notification = now;
        }
    }

    fn deliver(&mut self, notice: Notice) -> bool {
        let event = match self.notifier.notify(&notice) {
            Ok(()) => {
                tracing::info!(title = %notice.title, "notification delivered");
                ReminderEvent::Delivered(notice)
            }
            Err(error) => {
                tracing::warn!(title = %notice.title, error = %error, "notification failed");
                ReminderEvent::Failed { notice, error }
            }
        };
        let delivered = matches!(event, ReminderEvent::Delivered(_));
        // The foreground may have stopped listening; delivery already happened.
        let _ = self.events.send(event);
        delivered
    }
}
