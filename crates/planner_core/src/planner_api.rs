use crate::agenda;
use crate::calendar::{self, MonthView};
use crate::error::AppError;
use crate::legacy;
use crate::model::{ClockTime, Priority, Task, iso_date, new_task_id};
use crate::notify::{Notice, Notifier, notifier_from_env};
use crate::storage::json_store;
use std::path::Path;
use std::sync::OnceLock;
use time::format_description::well_known::Rfc3339;
use time::{Date, Month, OffsetDateTime, UtcOffset};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub date: Option<Date>,
    pub time: Option<ClockTime>,
    pub priority: Option<Priority>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub time: Option<ClockTime>,
    pub date: Option<Date>,
}

impl TaskEdit {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.time.is_none()
            && self.date.is_none()
    }
}

/// Tasks on one date plus the list position of the first of them, which is
/// where a calendar selection lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayTasks {
    pub tasks: Vec<Task>,
    pub first_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub imported: Vec<Task>,
    pub skipped: Vec<String>,
}

static LOCAL_OFFSET: OnceLock<UtcOffset> = OnceLock::new();

/// The local UTC offset, resolved on first use and then cached. Call this
/// before spawning threads: on Unix the lookup fails once a second thread
/// exists, and the fallback is UTC.
pub fn local_offset() -> UtcOffset {
    *LOCAL_OFFSET.get_or_init(|| UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC))
}

pub fn today() -> Date {
    OffsetDateTime::now_utc().to_offset(local_offset()).date()
}

/// Accepts `dd/mm/yy`, `dd/mm/yyyy` or `YYYY-MM-DD`.
pub fn parse_input_date(raw: &str) -> Result<Date, AppError> {
    let trimmed = raw.trim();
    if let Some(date) = iso_date::parse(trimmed) {
        return Ok(date);
    }
    legacy::parse_date(trimmed).map_err(|_| {
        AppError::invalid_input(format!(
            "date must be dd/mm/yy, dd/mm/yyyy or YYYY-MM-DD (got '{trimmed}')"
        ))
    })
}

pub fn add_task(new_task: NewTask) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    add_task_with_path(&path, new_task, today())
}

pub fn edit_task(id: &str, edit: TaskEdit) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    edit_task_with_path(&path, id, edit)
}

pub fn delete_task(id: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    delete_task_with_path(&path, id)
}

pub fn complete_task(id: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    complete_task_with_path(&path, id)
}

pub fn get_task_by_id(id: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    get_task_by_id_with_path(&path, id)
}

pub fn list_tasks() -> Result<Vec<Task>, AppError> {
    let path = json_store::store_path()?;
    json_store::load_tasks(&path)
}

pub fn sort_tasks() -> Result<Vec<Task>, AppError> {
    let path = json_store::store_path()?;
    sort_tasks_with_path(&path)
}

pub fn search_tasks(term: &str) -> Result<Vec<Task>, AppError> {
    let path = json_store::store_path()?;
    search_tasks_with_path(&path, term)
}

pub fn tasks_on_date(date: Date) -> Result<DayTasks, AppError> {
    let path = json_store::store_path()?;
    tasks_on_date_with_path(&path, date)
}

pub fn upcoming_tasks(lookahead_days: u32) -> Result<Vec<Task>, AppError> {
    let path = json_store::store_path()?;
    upcoming_tasks_with_path(&path, today(), lookahead_days)
}

pub fn today_summary() -> Result<Notice, AppError> {
    let path = json_store::store_path()?;
    today_summary_with_path(&path, today())
}

pub fn calendar_month(year: i32, month: Month) -> Result<MonthView, AppError> {
    let path = json_store::store_path()?;
    calendar_month_with_path(&path, year, month, today())
}

pub fn import_legacy(source: &Path) -> Result<ImportOutcome, AppError> {
    let path = json_store::store_path()?;
    import_legacy_with_path(&path, source)
}

/// Sends the due-today/due-tomorrow reminder once, regardless of when the
/// last one went out. Returns the notice when there was something to say.
pub fn send_reminder(lookahead_days: u32) -> Result<Option<Notice>, AppError> {
    let path = json_store::store_path()?;
    let notifier = notifier_from_env()?;
    send_reminder_with_path(&path, notifier.as_ref(), today(), lookahead_days)
}

fn now_rfc3339() -> Result<String, AppError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

fn required_id(id: &str) -> Result<&str, AppError> {
    let trimmed_id = id.trim();
    if trimmed_id.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }
    Ok(trimmed_id)
}

fn required_title(title: &str) -> Result<String, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("title is required"));
    }
    Ok(trimmed.to_string())
}

fn add_task_with_path(path: &Path, new_task: NewTask, today: Date) -> Result<Task, AppError> {
    let title = required_title(&new_task.title)?;
    let mut tasks = json_store::load_tasks(path)?;

    let task = Task {
        id: new_task_id(&tasks),
        date: new_task.date.unwrap_or(today),
        title,
        priority: new_task.priority.unwrap_or_default(),
        description: new_task
            .description
            .map(|text| text.trim().to_string())
            .unwrap_or_default(),
        time: new_task.time.unwrap_or_default(),
        completed: false,
        completed_at: None,
        created_at: now_rfc3339()?,
    };

    tasks.push(task.clone());
    json_store::save_tasks(path, &tasks)?;
    tracing::info!(id = %task.id, date = %task.date, "task added");

    Ok(task)
}

fn edit_task_with_path(path: &Path, id: &str, edit: TaskEdit) -> Result<Task, AppError> {
    let trimmed_id = required_id(id)?;
    if edit.is_empty() {
        return Err(AppError::invalid_input("nothing to change"));
    }
    let new_title = edit.title.as_deref().map(required_title).transpose()?;

    let mut tasks = json_store::load_tasks(path)?;
    let task = tasks
        .iter_mut()
        .find(|task| task.id == trimmed_id)
        .ok_or_else(|| AppError::invalid_input("task not found"))?;

    if let Some(title) = new_title {
        task.title = title;
    }
    if let Some(description) = edit.description {
        task.description = description.trim().to_string();
    }
    if let Some(priority) = edit.priority {
        task.priority = priority;
    }
    if let Some(time) = edit.time {
        task.time = time;
    }
    if let Some(date) = edit.date {
        task.date = date;
    }

    let updated = task.clone();
    json_store::save_tasks(path, &tasks)?;
    tracing::info!(id = %updated.id, "task edited");

    Ok(updated)
}

fn delete_task_with_path(path: &Path, id: &str) -> Result<Task, AppError> {
    let trimmed_id = required_id(id)?;
    let mut tasks = json_store::load_tasks(path)?;
    let index = tasks
        .iter()
        .position(|task| task.id == trimmed_id)
        .ok_or_else(|| AppError::invalid_input("task not found"))?;

    let removed = tasks.remove(index);
    json_store::save_tasks(path, &tasks)?;
    tracing::info!(id = %removed.id, "task deleted");

    Ok(removed)
}

fn complete_task_with_path(path: &Path, id: &str) -> Result<Task, AppError> {
    let trimmed_id = required_id(id)?;
    let mut tasks = json_store::load_tasks(path)?;
    let task = tasks
        .iter_mut()
        .find(|task| task.id == trimmed_id)
        .ok_or_else(|| AppError::invalid_input("task not found"))?;

    if task.completed {
        return Err(AppError::invalid_input("task already completed"));
    }

    task.completed = true;
    task.completed_at = Some(now_rfc3339()?);

    let updated = task.clone();
    json_store::save_tasks(path, &tasks)?;
    tracing::info!(id = %updated.id, "task completed");

    Ok(updated)
}

fn get_task_by_id_with_path(path: &Path, id: &str) -> Result<Task, AppError> {
    let trimmed_id = required_id(id)?;
    json_store::load_tasks(path)?
        .into_iter()
        .find(|task| task.id == trimmed_id)
        .ok_or_else(|| AppError::invalid_input("task not found"))
}

fn sort_tasks_with_path(path: &Path) -> Result<Vec<Task>, AppError> {
    let mut tasks = json_store::load_tasks(path)?;
    agenda::sort_by_date(&mut tasks);
    json_store::save_tasks(path, &tasks)?;
    Ok(tasks)
}

fn search_tasks_with_path(path: &Path, term: &str) -> Result<Vec<Task>, AppError> {
    let tasks = json_store::load_tasks(path)?;
    Ok(agenda::search(&tasks, term).into_iter().cloned().collect())
}

fn tasks_on_date_with_path(path: &Path, date: Date) -> Result<DayTasks, AppError> {
    let tasks = json_store::load_tasks(path)?;
    Ok(DayTasks {
        tasks: agenda::tasks_on(&tasks, date).into_iter().cloned().collect(),
        first_index: agenda::first_index_on(&tasks, date),
    })
}

fn upcoming_tasks_with_path(
    path: &Path,
    today: Date,
    lookahead_days: u32,
) -> Result<Vec<Task>, AppError> {
    let tasks = json_store::load_tasks(path)?;
    Ok(agenda::upcoming(&tasks, today, lookahead_days)
        .into_iter()
        .cloned()
        .collect())
}

fn today_summary_with_path(path: &Path, today: Date) -> Result<Notice, AppError> {
    let tasks = json_store::load_tasks(path)?;
    Ok(agenda::today_notice(&tasks, today))
}

fn calendar_month_with_path(
    path: &Path,
    year: i32,
    month: Month,
    today: Date,
) -> Result<MonthView, AppError> {
    let tasks = json_store::load_tasks(path)?;
    let marks = calendar::highlights(&tasks, today);
    MonthView::new(year, month, &marks)
}

fn import_legacy_with_path(path: &Path, source: &Path) -> Result<ImportOutcome, AppError> {
    let import = json_store::read_legacy_file(source)?;
    let mut tasks = json_store::load_tasks(path)?;

    let mut imported = Vec::with_capacity(import.tasks.len());
    for mut task in import.tasks {
        task.id = new_task_id(&tasks);
        tasks.push(task.clone());
        imported.push(task);
    }

    json_store::save_tasks(path, &tasks)?;
    tracing::info!(
        source = %source.display(),
        imported = imported.len(),
        skipped = import.skipped.len(),
        "imported task lines"
    );

    Ok(ImportOutcome {
        imported,
        skipped: import.skipped,
    })
}

fn send_reminder_with_path(
    path: &Path,
    notifier: &dyn Notifier,
    today: Date,
    lookahead_days: u32,
) -> Result<Option<Notice>, AppError> {
    let tasks = json_store::load_tasks(path)?;
    let Some(notice) = agenda::reminder_notice(&tasks, today, lookahead_days) else {
        return Ok(None);
    };
    notifier.notify(&notice)?;
    Ok(Some(notice))
}
