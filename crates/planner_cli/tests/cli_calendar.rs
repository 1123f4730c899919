use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("planner-{nanos}-{file_name}"))
}

fn write_store(path: &PathBuf, tasks: serde_json::Value) {
    let content = serde_json::json!({
        "schema_version": 1,
        "tasks": tasks
    });
    std::fs::write(path, serde_json::to_string_pretty(&content).unwrap()).unwrap();
}

fn planner(store_path: &PathBuf) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_planner"));
    command
        .env("PLANNER_STORE_PATH", store_path)
        .env("PLANNER_CONFIG_PATH", store_path.with_extension("config.json"))
        .env("PLANNER_DISABLE_NOTIFICATIONS", "1");
    command
}

fn february_tasks() -> serde_json::Value {
    serde_json::json!([
        {
            "id": "task-1",
            "date": "2025-02-14",
            "title": "Valentine",
            "priority": "low",
            "time": "19:30",
            "completed": false,
            "created_at": "2025-01-01T00:00:00Z"
        },
        {
            "id": "task-2",
            "date": "2025-02-14",
            "title": "Flowers",
            "priority": "high",
            "time": "10:00",
            "completed": false,
            "created_at": "2025-01-01T00:00:00Z"
        },
        {
            "id": "task-3",
            "date": "2025-02-03",
            "title": "Taxes",
            "priority": "medium",
            "time": "12:00",
            "completed": true,
            "completed_at": "2025-02-02T10:00:00Z",
            "created_at": "2025-01-01T00:00:00Z"
        }
    ])
}

#[test]
fn calendar_command_json_lists_highlighted_days() {
    let store_path = temp_path("cli-calendar.json");
    write_store(&store_path, february_tasks());

    let output = planner(&store_path)
        .args(["--json", "calendar", "--month", "02/2025"])
        .output()
        .expect("failed to run calendar command");

    std::fs::remove_file(&store_path).ok();
    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).expect("json output");

    assert_eq!(parsed["year"], 2025);
    assert_eq!(parsed["month"], 2);
    let days = parsed["days"].as_array().unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0]["date"], "2025-02-03");
    assert_eq!(days[0]["highlight"], "completed");
    assert_eq!(days[1]["date"], "2025-02-14");
    assert_eq!(days[1]["highlight"], "high");
}

#[test]
fn calendar_command_renders_grid() {
    let store_path = temp_path("cli-calendar-text.json");
    write_store(&store_path, february_tasks());

    let output = planner(&store_path)
        .args(["calendar", "--month", "2025-02"])
        .output()
        .expect("failed to run calendar command");

    std::fs::remove_file(&store_path).ok();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("February 2025"));
    assert!(stdout.contains("Mo  Tu  We  Th  Fr  Sa  Su"));
    assert!(stdout.contains("14!"));
    assert!(stdout.contains(" 3x"));
}

#[test]
fn calendar_command_rejects_bad_month() {
    let store_path = temp_path("cli-calendar-bad.json");

    let output = planner(&store_path)
        .args(["calendar", "--month", "13/2025"])
        .output()
        .expect("failed to run calendar command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
}
