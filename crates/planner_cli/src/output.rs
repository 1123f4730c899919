//! Plain-text and JSON renderings shared by one-shot commands and the shell.

use planner_core::calendar::{Highlight, MonthView};
use planner_core::legacy;
use planner_core::model::Task;
use planner_core::notify::Notice;
use planner_core::planner_api::DayTasks;
use serde_json::{Value, json};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::Date;

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Description")]
    description: String,
}

fn status_label(task: &Task) -> &'static str {
    if task.completed { "done" } else { "open" }
}

pub fn tasks_table(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks".to_string();
    }

    let rows = tasks.iter().map(|task| TaskRow {
        id: task.id.clone(),
        date: legacy::render_date(task.date),
        time: task.time.to_string(),
        title: task.title.clone(),
        priority: task.priority.to_string(),
        status: status_label(task),
        description: task.description.clone(),
    });
    let mut table = Table::new(rows);
    table.with(Style::psql());
    table.to_string()
}

pub fn task_json(task: &Task) -> Value {
    json!({
        "id": task.id,
        "date": task.date.to_string(),
        "time": task.time,
        "title": task.title,
        "priority": task.priority,
        "description": task.description,
        "completed": task.completed,
        "completed_at": task.completed_at,
        "created_at": task.created_at,
        "line": legacy::render_line(task),
    })
}

pub fn tasks_json(tasks: &[Task]) -> Value {
    Value::Array(tasks.iter().map(task_json).collect())
}

pub fn task_details(task: &Task) -> String {
    let mut out = String::new();
    out.push_str(&format!("ID:          {}\n", task.id));
    out.push_str(&format!("Title:       {}\n", task.title));
    out.push_str(&format!("Date:        {}\n", legacy::render_date(task.date)));
    out.push_str(&format!("Time:        {}\n", task.time));
    out.push_str(&format!("Priority:    {}\n", task.priority));
    out.push_str(&format!("Status:      {}\n", status_label(task)));
    if let Some(completed_at) = task.completed_at.as_deref() {
        out.push_str(&format!("Completed:   {completed_at}\n"));
    }
    out.push_str(&format!("Created:     {}\n", task.created_at));
    out.push_str(&format!("Description: {}", task.description));
    out
}

pub fn notice_json(notice: Option<&Notice>) -> Value {
    match notice {
        Some(notice) => json!({
            "sent": true,
            "title": notice.title,
            "message": notice.message,
        }),
        None => json!({ "sent": false }),
    }
}

/// A summary that is printed and only sometimes sent; `sent` says which.
pub fn summary_json(notice: &Notice, sent: bool) -> Value {
    json!({
        "sent": sent,
        "title": notice.title,
        "message": notice.message,
    })
}

pub fn day_json(date: Date, day: &DayTasks) -> Value {
    json!({
        "date": date.to_string(),
        "first_index": day.first_index,
        "tasks": tasks_json(&day.tasks),
    })
}

fn highlight_label(highlight: Highlight) -> &'static str {
    match highlight {
        Highlight::High => "high",
        Highlight::Medium => "medium",
        Highlight::Low => "low",
        Highlight::Completed => "completed",
    }
}

/// Only days carrying a highlight or the today marker are listed.
pub fn month_json(view: &MonthView) -> Value {
    let days: Vec<Value> = view
        .weeks
        .iter()
        .flat_map(|week| week.iter())
        .flatten()
        .filter(|cell| cell.mark.highlight.is_some() || cell.mark.is_today)
        .map(|cell| {
            json!({
                "date": cell.date.to_string(),
                "highlight": cell.mark.highlight.map(highlight_label),
                "today": cell.mark.is_today,
            })
        })
        .collect();

    json!({
        "year": view.year,
        "month": u8::from(view.month),
        "days": days,
    })
}

#[cfg(test)]
mod tests {
    use super::{day_json, month_json, summary_json, task_details, task_json, tasks_table};
    use planner_core::calendar::{MonthView, highlights};
    use planner_core::notify::Notice;
    use planner_core::planner_api::DayTasks;
    use planner_core::model::{ClockTime, Priority, Task};
    use time::Month;
    use time::macros::date;

    fn task() -> Task {
        Task {
            id: "task-1".to_string(),
            date: date!(2025 - 01 - 03),
            title: "Dentist".to_string(),
            priority: Priority::High,
            description: "bring card".to_string(),
            time: ClockTime::new(9, 15).unwrap(),
            completed: false,
            completed_at: None,
            created_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn tasks_table_lists_rows() {
        let table = tasks_table(&[task()]);
        assert!(table.contains("ID"));
        assert!(table.contains("task-1"));
        assert!(table.contains("03/01/25"));
        assert!(table.contains("09:15"));
        assert!(table.contains("open"));
        assert_eq!(tasks_table(&[]), "No tasks");
    }

    #[test]
    fn task_json_includes_line() {
        let value = task_json(&task());
        assert_eq!(value["date"], "2025-01-03");
        assert_eq!(value["priority"], "high");
        assert_eq!(value["time"], "09:15");
        assert_eq!(value["line"], "03/01/25 - Dentist [High]: bring card (09:15)");
    }

    #[test]
    fn task_details_lists_fields() {
        let details = task_details(&task());
        assert!(details.contains("Title:       Dentist"));
        assert!(!details.contains("Completed:"));
    }

    #[test]
    fn month_json_lists_marked_days() {
        let marks = highlights(&[task()], date!(2025 - 01 - 20));
        let view = MonthView::new(2025, Month::January, &marks).unwrap();

        let value = month_json(&view);
        let days = value["days"].as_array().unwrap();

        assert_eq!(value["month"], 1);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0]["date"], "2025-01-03");
        assert_eq!(days[0]["highlight"], "high");
        assert_eq!(days[1]["today"], true);
    }

    #[test]
    fn summary_json_reports_whether_it_was_sent() {
        let notice = Notice::new("Today's Tasks", "No tasks due today");

        let kept = summary_json(&notice, false);
        assert_eq!(kept["sent"], false);
        assert_eq!(kept["message"], "No tasks due today");

        assert_eq!(summary_json(&notice, true)["sent"], true);
    }

    #[test]
    fn day_json_carries_first_index() {
        let day = DayTasks {
            tasks: vec![task()],
            first_index: Some(2),
        };

        let value = day_json(date!(2025 - 01 - 03), &day);
        assert_eq!(value["date"], "2025-01-03");
        assert_eq!(value["first_index"], 2);
        assert_eq!(value["tasks"][0]["id"], "task-1");

        let empty = DayTasks {
            tasks: Vec::new(),
            first_index: None,
        };
        assert!(day_json(date!(2025 - 01 - 04), &empty)["first_index"].is_null());
    }
}
