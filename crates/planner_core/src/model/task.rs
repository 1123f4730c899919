use crate::error::AppError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use time::{Date, OffsetDateTime};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub title: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub time: ClockTime,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Tag used inside the bracketed part of a task line.
    pub fn tag(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" | "h" => Ok(Self::High),
            "medium" | "med" | "m" => Ok(Self::Medium),
            "low" | "l" => Ok(Self::Low),
            other => Err(AppError::invalid_input(format!(
                "priority must be high, medium or low (got '{other}')"
            ))),
        }
    }
}

/// Deadline time of day, minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    pub const NOON: ClockTime = ClockTime {
        hour: 12,
        minute: 0,
    };

    pub fn new(hour: u8, minute: u8) -> Result<Self, AppError> {
        if hour > 23 {
            return Err(AppError::invalid_input("hour must be between 0 and 23"));
        }
        if minute > 59 {
            return Err(AppError::invalid_input("minute must be between 0 and 59"));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }
}

impl Default for ClockTime {
    fn default() -> Self {
        Self::NOON
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ClockTime {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (hour, minute) = raw
            .trim()
            .split_once(':')
            .ok_or_else(|| AppError::invalid_input("time must be HH:MM"))?;
        let hour = hour
            .trim()
            .parse::<u8>()
            .map_err(|_| AppError::invalid_input("time must be HH:MM"))?;
        let minute = minute
            .trim()
            .parse::<u8>()
            .map_err(|_| AppError::invalid_input("time must be HH:MM"))?;
        ClockTime::new(hour, minute)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(|err: AppError| {
            serde::de::Error::custom(err.message().to_string())
        })
    }
}

/// Allocates a `task-<unix nanos>` id that does not clash with `existing`.
pub fn new_task_id(existing: &[Task]) -> String {
    let mut nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    loop {
        let candidate = format!("task-{nanos}");
        if !existing.iter().any(|task| task.id == candidate) {
            return candidate;
        }
        nanos += 1;
    }
}

pub(crate) mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;
    use time::macros::format_description;

    const FORMAT: &[time::format_description::BorrowedFormatItem<'static>] =
        format_description!("[year]-[month]-[day]");

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let rendered = date.format(FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&rendered)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Date::parse(&raw, FORMAT).map_err(serde::de::Error::custom)
    }

    pub fn format(date: Date) -> String {
        date.format(FORMAT).unwrap_or_else(|_| date.to_string())
    }

    pub fn parse(raw: &str) -> Option<Date> {
        Date::parse(raw, FORMAT).ok()
    }
}
