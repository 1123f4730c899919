use crate::calendar::Highlight;
use crate::error::AppError;
use crate::storage::json_store;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "PLANNER_CONFIG_PATH";

#[derive(Debug, Clone)]
pub struct Palette {
    pub accent: &'static str,
    pub muted: &'static str,
    pub high: &'static str,
    pub medium: &'static str,
    pub low: &'static str,
    pub completed: &'static str,
    pub today: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub fn accentize(&self, text: &str) -> String {
        self.paint(self.accent, text)
    }

    pub fn mutedize(&self, text: &str) -> String {
        self.paint(self.muted, text)
    }

    pub fn highlight(&self, highlight: Highlight, text: &str) -> String {
        let code = match highlight {
            Highlight::High => self.high,
            Highlight::Medium => self.medium,
            Highlight::Low => self.low,
            Highlight::Completed => self.completed,
        };
        self.paint(code, text)
    }

    pub fn todayize(&self, text: &str) -> String {
        self.paint(self.today, text)
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if code.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", code, text, self.reset)
        }
    }
}

pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    match canonical_theme_name_option(theme) {
        Some(ref name) if name == "noir" => Palette {
            accent: "\x1b[38;5;208m",
            muted: "\x1b[38;5;250m",
            high: "\x1b[38;5;203m",
            medium: "\x1b[38;5;222m",
            low: "\x1b[38;5;114m",
            completed: "\x1b[38;5;244m",
            today: "\x1b[1;38;5;41m",
            reset: "\x1b[0m",
        },
        Some(ref name) if name == "solarized" => Palette {
            accent: "\x1b[38;5;108m",
            muted: "\x1b[38;5;250m",
            high: "\x1b[38;5;160m",
            medium: "\x1b[38;5;136m",
            low: "\x1b[38;5;64m",
            completed: "\x1b[38;5;245m",
            today: "\x1b[1;38;5;37m",
            reset: "\x1b[0m",
        },
        _ => Palette {
            accent: "",
            muted: "",
            high: "",
            medium: "",
            low: "",
            completed: "",
            today: "",
            reset: "",
        },
    }
}

fn canonical_theme_name_option(theme: Option<&str>) -> Option<String> {
    theme.and_then(canonical_theme_name)
}

pub fn canonical_theme_name(raw: &str) -> Option<String> {
    let cleaned = canonical_key(raw);
    if cleaned.is_empty() {
        return Some("default".into());
    }

    match cleaned.as_str() {
        "vanilla" | "light" => Some("default".to_string()),
        "dark" | "dark_mode" | "darkmode" => Some("noir".to_string()),
        other => Some(other.to_string()),
    }
}

/// Lowercases and collapses every run of non-alphanumerics into one `_`.
pub fn canonical_key(raw: &str) -> String {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    cleaned.trim_matches('_').to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    /// How often the reminder thread wakes to check for due tasks.
    pub check_interval_secs: u64,
    /// Minimum gap between two reminders.
    pub quiet_period_secs: u64,
    pub lookahead_days: u32,
    pub startup_summary_delay_secs: u64,
    /// Upper bound on entries printed by the upcoming summary.
    pub upcoming_limit: usize,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            check_interval_secs: 60,
            quiet_period_secs: 3600,
            lookahead_days: 7,
            startup_summary_delay_secs: 5,
            upcoming_limit: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderField {
    CheckIntervalSecs,
    QuietPeriodSecs,
    LookaheadDays,
    StartupSummaryDelaySecs,
    UpcomingLimit,
}

impl ReminderField {
    pub fn from_key(key: &str) -> Option<Self> {
        match canonical_key(key).as_str() {
            "check_interval_secs" | "check_interval" => Some(Self::CheckIntervalSecs),
            "quiet_period_secs" | "quiet_period" => Some(Self::QuietPeriodSecs),
            "lookahead_days" | "lookahead" => Some(Self::LookaheadDays),
            "startup_summary_delay_secs" | "startup_summary_delay" => {
                Some(Self::StartupSummaryDelaySecs)
            }
            "upcoming_limit" => Some(Self::UpcomingLimit),
            _ => None,
        }
    }

    fn apply(self, settings: &mut ReminderSettings, value: u64) {
        match self {
            Self::CheckIntervalSecs => settings.check_interval_secs = value.max(1),
            Self::QuietPeriodSecs => settings.quiet_period_secs = value,
            Self::LookaheadDays => {
                settings.lookahead_days = u32::try_from(value).unwrap_or(u32::MAX)
            }
            Self::StartupSummaryDelaySecs => settings.startup_summary_delay_secs = value,
            Self::UpcomingLimit => {
                settings.upcoming_limit = usize::try_from(value).unwrap_or(usize::MAX)
            }
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub reminder: ReminderSettings,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<String>,
    pub reminder: Vec<(ReminderField, u64)>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(json_store::app_dir()?.join(CONFIG_FILE_NAME))
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let mut config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    config.theme = config.theme.and_then(|name| canonical_theme_name(&name));
    config.reminder.check_interval_secs = config.reminder.check_interval_secs.max(1);
    Ok(config)
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(theme) = overrides.theme.as_ref()
        && let Some(normalized) = canonical_theme_name(theme)
    {
        merged.theme = Some(normalized);
    }

    for (field, value) in overrides.reminder.iter() {
        field.apply(&mut merged.reminder, *value);
    }

    merged
}
