use clap::{Parser, Subcommand};
use planner_core::config::{ConfigOverrides, ReminderField, canonical_key};
use planner_core::error::AppError;
use planner_core::model::{ClockTime, Priority};
use planner_core::planner_api::parse_input_date;
use std::path::PathBuf;
use time::Date;

#[derive(Parser, Debug)]
#[command(name = "planner", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: planner add "Dentist" --date 03/01/25 --time 09:15 --priority high
    Add {
        title: Option<String>,
        /// Due date (dd/mm/yy, dd/mm/yyyy or YYYY-MM-DD); defaults to today
        #[arg(long, value_parser = date_arg)]
        date: Option<Date>,
        /// Deadline time (HH:MM); defaults to 12:00
        #[arg(long, value_parser = time_arg)]
        time: Option<ClockTime>,
        /// high, medium or low; defaults to medium
        #[arg(short, long, value_parser = priority_arg)]
        priority: Option<Priority>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Edit fields of a task
    ///
    /// Example: planner edit task-1 --title "Dentist (moved)" --time 10:00
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long, value_parser = priority_arg)]
        priority: Option<Priority>,
        #[arg(long, value_parser = time_arg)]
        time: Option<ClockTime>,
        #[arg(long, value_parser = date_arg)]
        date: Option<Date>,
    },
    /// Delete a task
    ///
    /// Example: planner delete task-1
    Delete { id: String },
    /// Mark a task as completed
    ///
    /// Example: planner done task-1
    Done { id: String },
    /// Show details of a task
    ///
    /// Example: planner show task-1
    Show { id: String },
    /// List all tasks in stored order
    List,
    /// Sort tasks by date and save the new order
    Sort,
    /// Find tasks whose line contains TERM (case-insensitive)
    ///
    /// Example: planner search dentist
    Search { term: String },
    /// List tasks on a given date
    ///
    /// Example: planner day 03/01/25
    Day {
        #[arg(value_parser = date_arg)]
        date: Date,
    },
    /// Open tasks due within the reminder lookahead window
    Upcoming {
        /// Do not cap the number of entries
        #[arg(long)]
        all: bool,
    },
    /// Summary of tasks due today
    Today {
        /// Also send the summary as a desktop notification
        #[arg(long)]
        notify: bool,
    },
    /// Month calendar with highlighted task days
    ///
    /// Example: planner calendar --month 02/2025
    Calendar {
        /// MM/YYYY; defaults to the current month
        #[arg(long)]
        month: Option<String>,
    },
    /// Import a JSON array of task lines
    ///
    /// Example: planner import old-tasks.json
    Import { file: PathBuf },
    /// Send a reminder for tasks due today or tomorrow
    Notify,
}

fn date_arg(raw: &str) -> Result<Date, String> {
    parse_input_date(raw).map_err(|err| err.message().to_string())
}

fn time_arg(raw: &str) -> Result<ClockTime, String> {
    raw.parse::<ClockTime>()
        .map_err(|err| err.message().to_string())
}

fn priority_arg(raw: &str) -> Result<Priority, String> {
    raw.parse::<Priority>()
        .map_err(|err| err.message().to_string())
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    Reminder(ReminderField),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let (field, remainder) = key_raw
        .split_once('.')
        .map(|(field, rest)| (field.trim(), Some(rest.trim())))
        .unwrap_or((key_raw.trim(), None));

    let canonical_field = canonical_key(field);
    if canonical_field.is_empty() {
        return Err("override key cannot be empty".to_string());
    }

    match canonical_field.as_str() {
        "theme" => {
            if remainder.is_some() {
                Err("theme override cannot have subfields".to_string())
            } else {
                Ok(ParsedConfigOverride {
                    target: ConfigOverrideTarget::Theme,
                    value,
                })
            }
        }
        "reminder" | "reminders" => {
            let name = remainder
                .filter(|segment| !segment.is_empty())
                .ok_or_else(|| "reminder override requires a field name".to_string())?;
            let field = ReminderField::from_key(name)
                .ok_or_else(|| format!("unknown reminder field '{name}'"))?;
            Ok(ParsedConfigOverride {
                target: ConfigOverrideTarget::Reminder(field),
                value,
            })
        }
        other => Err(format!("unknown config field '{other}'")),
    }
}

/// Folds every `--config-override` value into one set of overrides.
pub fn collect_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry)
            .map_err(|message| AppError::invalid_input(format!("{CONFIG_OVERRIDE_FLAG}: {message}")))?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::Reminder(field) => {
                let value = parsed.value.parse::<u64>().map_err(|_| {
                    AppError::invalid_input(format!(
                        "{CONFIG_OVERRIDE_FLAG}: reminder values must be whole numbers"
                    ))
                })?;
                overrides.reminder.push((field, value));
            }
        }
    }
    Ok(overrides)
}
