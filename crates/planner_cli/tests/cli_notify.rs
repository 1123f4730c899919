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

fn past_task() -> serde_json::Value {
    serde_json::json!([
        {
            "id": "task-1",
            "date": "2020-01-01",
            "title": "Old",
            "priority": "medium",
            "time": "12:00",
            "completed": false,
            "created_at": "2020-01-01T00:00:00Z"
        }
    ])
}

fn add_today(store_path: &PathBuf, title: &str, completed: bool) {
    let output = planner(store_path)
        .args(["--json", "add", title, "--time", "08:00"])
        .output()
        .expect("failed to run add command");
    assert!(output.status.success());

    if completed {
        let parsed: serde_json::Value =
            serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).expect("json output");
        let id = parsed["id"].as_str().unwrap().to_string();
        let done = planner(store_path)
            .args(["done", &id])
            .output()
            .expect("failed to run done command");
        assert!(done.status.success());
    }
}

#[test]
fn notify_command_reports_nothing_due() {
    let store_path = temp_path("cli-notify-empty.json");
    write_store(&store_path, past_task());

    let output = planner(&store_path)
        .arg("notify")
        .output()
        .expect("failed to run notify command");

    std::fs::remove_file(&store_path).ok();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No tasks due today or tomorrow"));
}

#[test]
fn notify_command_sends_reminder_for_task_due_today() {
    let store_path = temp_path("cli-notify.json");
    add_today(&store_path, "Standup", false);

    let output = planner(&store_path)
        .args(["--json", "notify"])
        .output()
        .expect("failed to run notify command");

    std::fs::remove_file(&store_path).ok();
    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).expect("json output");
    assert_eq!(parsed["sent"], true);
    assert_eq!(parsed["title"], "Upcoming Tasks Reminder");
    assert_eq!(parsed["message"], "You have 1 task(s) due today!");
}

#[test]
fn notify_command_ignores_completed_tasks() {
    let store_path = temp_path("cli-notify-done.json");
    add_today(&store_path, "Finished", true);

    let output = planner(&store_path)
        .args(["--json", "notify"])
        .output()
        .expect("failed to run notify command");

    std::fs::remove_file(&store_path).ok();
    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).expect("json output");
    assert_eq!(parsed["sent"], false);
}

#[test]
fn today_command_lists_due_tasks() {
    let store_path = temp_path("cli-today.json");
    add_today(&store_path, "Standup", false);

    let output = planner(&store_path)
        .args(["today", "--notify"])
        .output()
        .expect("failed to run today command");

    std::fs::remove_file(&store_path).ok();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Tasks due today:"));
    assert!(stdout.contains("08:00 - "));
    assert!(stdout.contains("Standup [Medium]:"));
}

#[test]
fn today_command_json_without_notify_is_not_sent() {
    let store_path = temp_path("cli-today-json.json");

    let plain = planner(&store_path)
        .args(["--json", "today"])
        .output()
        .expect("failed to run today command");
    let notified = planner(&store_path)
        .args(["--json", "today", "--notify"])
        .output()
        .expect("failed to run today command");

    assert!(plain.status.success());
    assert!(notified.status.success());
    let plain: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&plain.stdout)).expect("json output");
    let notified: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&notified.stdout)).expect("json output");

    assert_eq!(plain["sent"], false);
    assert_eq!(plain["title"], "Today's Tasks");
    assert_eq!(plain["message"], "No tasks due today");
    assert_eq!(notified["sent"], true);
}

#[test]
fn today_command_without_tasks() {
    let store_path = temp_path("cli-today-empty.json");
    write_store(&store_path, past_task());

    let output = planner(&store_path)
        .arg("today")
        .output()
        .expect("failed to run today command");

    std::fs::remove_file(&store_path).ok();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No tasks due today"));
}

#[test]
fn upcoming_command_caps_entries_unless_all() {
    let store_path = temp_path("cli-upcoming.json");
    for index in 0..3 {
        add_today(&store_path, &format!("Chore {index}"), false);
    }

    let capped = planner(&store_path)
        .args(["--config-override", "reminder.upcoming_limit=2", "upcoming"])
        .output()
        .expect("failed to run upcoming command");
    let all = planner(&store_path)
        .args([
            "--config-override",
            "reminder.upcoming_limit=2",
            "upcoming",
            "--all",
        ])
        .output()
        .expect("failed to run upcoming command");

    std::fs::remove_file(&store_path).ok();
    assert!(capped.status.success());
    assert!(all.status.success());
    let capped_stdout = String::from_utf8_lossy(&capped.stdout);
    let all_stdout = String::from_utf8_lossy(&all.stdout);
    assert_eq!(capped_stdout.lines().count(), 2);
    assert_eq!(all_stdout.lines().count(), 3);
}

#[test]
fn upcoming_command_without_tasks() {
    let store_path = temp_path("cli-upcoming-empty.json");
    write_store(&store_path, past_task());

    let output = planner(&store_path)
        .arg("upcoming")
        .output()
        .expect("failed to run upcoming command");

    std::fs::remove_file(&store_path).ok();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No upcoming tasks"));
}

#[test]
fn invalid_config_override_is_rejected() {
    let store_path = temp_path("cli-override.json");

    let output = planner(&store_path)
        .args(["--config-override", "reminder.snooze=5", "list"])
        .output()
        .expect("failed to run list command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input - --config-override"));
}
