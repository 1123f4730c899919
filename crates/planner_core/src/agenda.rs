//! Read-only views over the task list: ordering, search, per-day lookup,
//! the upcoming window, and the reminder texts built from it.

use crate::legacy;
use crate::model::Task;
use crate::notify::Notice;
use time::{Date, Duration};

pub const REMINDER_TITLE: &str = "Upcoming Tasks Reminder";
pub const TODAY_TITLE: &str = "Today's Tasks";

/// Stable sort by date, then deadline time.
pub fn sort_by_date(tasks: &mut [Task]) {
    tasks.sort_by_key(|task| (task.date, task.time));
}

pub fn search<'a>(tasks: &'a [Task], term: &str) -> Vec<&'a Task> {
    let needle = term.trim().to_lowercase();
    tasks
        .iter()
        .filter(|task| needle.is_empty() || legacy::render_line(task).to_lowercase().contains(&needle))
        .collect()
}

pub fn tasks_on(tasks: &[Task], date: Date) -> Vec<&Task> {
    tasks.iter().filter(|task| task.date == date).collect()
}

pub fn first_index_on(tasks: &[Task], date: Date) -> Option<usize> {
    tasks.iter().position(|task| task.date == date)
}

/// Open tasks dated from `today` through `today + lookahead_days`, by date.
pub fn upcoming(tasks: &[Task], today: Date, lookahead_days: u32) -> Vec<&Task> {
    let horizon = today
        .checked_add(Duration::days(i64::from(lookahead_days)))
        .unwrap_or(Date::MAX);
    let mut selected: Vec<&Task> = tasks
        .iter()
        .filter(|task| !task.completed && task.date >= today && task.date <= horizon)
        .collect();
    selected.sort_by_key(|task| task.date);
    selected
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DueCounts {
    pub today: usize,
    pub tomorrow: usize,
}

pub fn due_counts(upcoming: &[&Task], today: Date) -> DueCounts {
    let tomorrow = today.next_day();
    let mut counts = DueCounts::default();
    for task in upcoming {
        if task.date == today {
            counts.today += 1;
        } else if Some(task.date) == tomorrow {
            counts.tomorrow += 1;
        }
    }
    counts
}

pub fn reminder_notice(tasks: &[Task], today: Date, lookahead_days: u32) -> Option<Notice> {
    let window = upcoming(tasks, today, lookahead_days);
    let counts = due_counts(&window, today);

    let mut lines = Vec::new();
    if counts.today > 0 {
        lines.push(format!("You have {} task(s) due today!", counts.today));
    }
    if counts.tomorrow > 0 {
        lines.push(format!("You have {} task(s) due tomorrow!", counts.tomorrow));
    }

    if lines.is_empty() {
        None
    } else {
        Some(Notice::new(REMINDER_TITLE, lines.join("\n")))
    }
}

pub fn today_notice(tasks: &[Task], today: Date) -> Notice {
    let due: Vec<&Task> = upcoming(tasks, today, 0);
    if due.is_empty() {
        return Notice::new(TODAY_TITLE, "No tasks due today");
    }

    let lines: Vec<String> = due
        .iter()
        .map(|task| format!("{} - {}", task.time, legacy::render_line_without_time(task)))
        .collect();
    Notice::new(TODAY_TITLE, format!("Tasks due today:\n\n{}", lines.join("\n")))
}
