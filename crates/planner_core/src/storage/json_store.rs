use crate::error::AppError;
use crate::legacy;
use crate::model::{Task, new_task_id};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const SCHEMA_VERSION: u32 = 1;
const STORE_FILE_NAME: &str = "tasks.json";
const STORE_ENV_VAR: &str = "PLANNER_STORE_PATH";

#[derive(Debug, Serialize, Deserialize)]
struct StoredTasks {
    schema_version: u32,
    tasks: Vec<Task>,
}

/// Outcome of reading a file of line-encoded tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyImport {
    pub tasks: Vec<Task>,
    pub skipped: Vec<String>,
}

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(app_dir()?.join(STORE_FILE_NAME))
}

pub(crate) fn app_dir() -> Result<PathBuf, AppError> {
    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("planner"))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join("planner"))
    }
}

pub fn load_tasks(path: &Path) -> Result<Vec<Task>, AppError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))?;

    if value.is_array() {
        let import = parse_legacy_value(value)?;
        tracing::info!(
            path = %path.display(),
            migrated = import.tasks.len(),
            skipped = import.skipped.len(),
            "read line-encoded task store"
        );
        return Ok(import.tasks);
    }

    let stored: StoredTasks =
        serde_json::from_value(value).map_err(|err| AppError::invalid_data(err.to_string()))?;

    if !(1..=SCHEMA_VERSION).contains(&stored.schema_version) {
        return Err(AppError::invalid_data("schema_version mismatch"));
    }

    let mut seen = HashSet::new();
    for task in &stored.tasks {
        if !seen.insert(task.id.as_str()) {
            return Err(AppError::invalid_data(format!("duplicate task id {}", task.id)));
        }
    }

    Ok(stored.tasks)
}

pub fn save_tasks(path: &Path, tasks: &[Task]) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
    }

    let stored = StoredTasks {
        schema_version: SCHEMA_VERSION,
        tasks: tasks.to_vec(),
    };
    let content = serde_json::to_string_pretty(&stored)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    std::fs::write(path, content).map_err(|err| AppError::io(err.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions).map_err(|err| AppError::io(err.to_string()))?;
    }

    tracing::debug!(path = %path.display(), count = tasks.len(), "saved tasks");
    Ok(())
}

/// Reads a JSON array of task lines. Unparseable entries are logged and
/// reported in `skipped` rather than failing the whole file.
pub fn read_legacy_file(path: &Path) -> Result<LegacyImport, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))?;
    parse_legacy_value(value)
}

fn parse_legacy_value(value: serde_json::Value) -> Result<LegacyImport, AppError> {
    let entries = match value {
        serde_json::Value::Array(entries) => entries,
        _ => return Err(AppError::invalid_data("expected a JSON array of task lines")),
    };

    let created_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    let mut tasks: Vec<Task> = Vec::with_capacity(entries.len());
    let mut skipped = Vec::new();

    for entry in entries {
        let line = match entry {
            serde_json::Value::String(line) => line,
            other => {
                tracing::warn!(entry = %other, "skipping non-string task entry");
                skipped.push(other.to_string());
                continue;
            }
        };

        match legacy::parse_line(&line) {
            Ok(parsed) => {
                let id = new_task_id(&tasks);
                tasks.push(parsed.into_task(id, created_at.clone()));
            }
            Err(err) => {
                tracing::warn!(task = %line, error = %err, "skipping task with unreadable line");
                skipped.push(line);
            }
        }
    }

    Ok(LegacyImport { tasks, skipped })
}

#[cfg(test)]
mod tests {
    use super::{SCHEMA_VERSION, load_tasks, read_legacy_file, save_tasks};
    use crate::model::{ClockTime, Priority, Task};
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};
    use time::macros::date;

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("planner-{nanos}-{file_name}"))
    }

    fn task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            date: date!(2025 - 01 - 03),
            title: "demo".to_string(),
            priority: Priority::Low,
            description: "details".to_string(),
            time: ClockTime::new(7, 45).unwrap(),
            completed: false,
            completed_at: None,
            created_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let path = temp_path("missing.json");
        assert!(load_tasks(&path).unwrap().is_empty());
    }

    #[test]
    fn save_and_load_round_trip() {
        let path = temp_path("tasks.json");
        let tasks = vec![task("task-1"), task("task-2")];

        save_tasks(&path, &tasks).unwrap();
        let loaded = load_tasks(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, tasks);
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = temp_path("nested");
        let path = dir.join("deeper").join("tasks.json");

        save_tasks(&path, &[task("task-1")]).unwrap();
        let exists = path.exists();
        fs::remove_dir_all(&dir).ok();

        assert!(exists);
    }

    #[test]
    fn loads_line_encoded_store_and_skips_bad_lines() {
        let path = temp_path("legacy.json");
        let content = serde_json::json!([
            "03/01/25 - Dentist [High]: bring card (09:15)",
            "not a task",
            "04/01/2025 - Taxes [Done]: file (17:00) ✓",
            42
        ]);
        fs::write(&path, content.to_string()).unwrap();

        let loaded = load_tasks(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].title, "Dentist");
        assert_eq!(loaded[0].priority, Priority::High);
        assert_eq!(loaded[1].date, date!(2025 - 01 - 04));
        assert!(loaded[1].completed);
        assert_ne!(loaded[0].id, loaded[1].id);
    }

    #[test]
    fn read_legacy_file_reports_skipped_lines() {
        let path = temp_path("import.json");
        fs::write(&path, r#"["bad line", "05/02/25 - Call [Low]: mom (18:00)"]"#).unwrap();

        let import = read_legacy_file(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(import.tasks.len(), 1);
        assert_eq!(import.skipped, vec!["bad line".to_string()]);
    }

    #[test]
    fn read_legacy_file_rejects_objects() {
        let path = temp_path("import-object.json");
        fs::write(&path, r#"{"schema_version": 1, "tasks": []}"#).unwrap();

        let err = read_legacy_file(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn rejects_duplicate_ids() {
        let path = temp_path("dupes.json");
        save_tasks(&path, &[task("task-1"), task("task-1")]).unwrap();

        let err = load_tasks(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn rejects_bad_time_field() {
        let path = temp_path("bad-time.json");
        let content = "{\n  \"schema_version\": 1,\n  \"tasks\": [\n    {\n      \"id\": \"task-1\",\n      \"date\": \"2025-01-03\",\n      \"title\": \"demo\",\n      \"time\": \"25:00\",\n      \"created_at\": \"2025-01-01T00:00:00Z\"\n    }\n  ]\n}";
        fs::write(&path, content).unwrap();

        let err = load_tasks(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn schema_version_must_match() {
        let path = temp_path("bad-schema.json");
        let bad = format!(
            "{{\n  \"schema_version\": {},\n  \"tasks\": []\n}}",
            SCHEMA_VERSION + 1
        );
        fs::write(&path, bad).unwrap();

        let err = load_tasks(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }
}
