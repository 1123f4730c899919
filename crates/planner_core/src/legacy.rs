//! The single-line task rendering used for display, search and summaries,
//! and the reader that turns such lines back into structured tasks when an
//! old store or an exported list is imported.
//!
//! Line shape: `dd/mm/yy - Title [Priority]: description (HH:MM)`, with
//! `[Done]` and a trailing ` ✓` once the task is completed.

use crate::error::AppError;
use crate::model::{ClockTime, Priority, Task};
use time::{Date, Month};

const DONE_TAG: &str = "Done";
const DONE_MARK: char = '✓';

/// Task fields recovered from one line, before it is given an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTask {
    pub date: Date,
    pub title: String,
    pub priority: Priority,
    pub description: String,
    pub time: ClockTime,
    pub completed: bool,
}

impl LegacyTask {
    pub fn into_task(self, id: String, created_at: String) -> Task {
        Task {
            id,
            date: self.date,
            title: self.title,
            priority: self.priority,
            description: self.description,
            time: self.time,
            completed: self.completed,
            completed_at: None,
            created_at,
        }
    }
}

pub fn render_line(task: &Task) -> String {
    let tag = if task.completed {
        DONE_TAG
    } else {
        task.priority.tag()
    };
    let mut line = format!(
        "{} - {} [{}]: {} ({})",
        render_date(task.date),
        task.title,
        tag,
        task.description,
        task.time
    );
    if task.completed {
        line.push(' ');
        line.push(DONE_MARK);
    }
    line
}

/// The line with its trailing `(HH:MM)` removed.
pub fn render_line_without_time(task: &Task) -> String {
    let tag = if task.completed {
        DONE_TAG
    } else {
        task.priority.tag()
    };
    format!(
        "{} - {} [{}]: {}",
        render_date(task.date),
        task.title,
        tag,
        task.description
    )
    .trim_end()
    .to_string()
}

/// `dd/mm/yy` while the year stays inside the two-digit pivot window,
/// `dd/mm/yyyy` otherwise.
pub fn render_date(date: Date) -> String {
    let year = date.year();
    if (1969..=2068).contains(&year) {
        format!(
            "{:02}/{:02}/{:02}",
            date.day(),
            u8::from(date.month()),
            year.rem_euclid(100)
        )
    } else {
        format!("{:02}/{:02}/{:04}", date.day(), u8::from(date.month()), year)
    }
}

/// Parses `dd/mm/yy`, falling back to `dd/mm/yyyy`.
pub fn parse_date(raw: &str) -> Result<Date, AppError> {
    let trimmed = raw.trim();
    parse_date_with_year_digits(trimmed, 2)
        .or_else(|_| parse_date_with_year_digits(trimmed, 4))
        .map_err(|_| AppError::invalid_data(format!("unrecognised date '{trimmed}'")))
}

fn parse_date_with_year_digits(raw: &str, digits: usize) -> Result<Date, AppError> {
    let mut parts = raw.split('/');
    let (Some(day), Some(month), Some(year), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AppError::invalid_data("date must be dd/mm/yy"));
    };

    if year.len() != digits || !year.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(AppError::invalid_data("unexpected year width"));
    }

    let day = day
        .parse::<u8>()
        .map_err(|_| AppError::invalid_data("day is not a number"))?;
    let month = month
        .parse::<u8>()
        .map_err(|_| AppError::invalid_data("month is not a number"))?;
    let year = year
        .parse::<i32>()
        .map_err(|_| AppError::invalid_data("year is not a number"))?;
    let year = if digits == 2 {
        if year >= 69 { 1900 + year } else { 2000 + year }
    } else {
        year
    };

    let month = Month::try_from(month).map_err(|err| AppError::invalid_data(err.to_string()))?;
    Date::from_calendar_date(year, month, day).map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn parse_line(line: &str) -> Result<LegacyTask, AppError> {
    let trimmed = line.trim();
    let completed_mark = trimmed.ends_with(DONE_MARK);
    let body = trimmed.trim_end_matches(DONE_MARK).trim_end();

    let (date_part, rest) = body
        .split_once(" - ")
        .ok_or_else(|| AppError::invalid_data("task line has no ' - ' separator"))?;
    let date = parse_date(date_part)?;

    let (open, close) = tag_bounds(rest)?;
    let title = rest[..open].trim();
    if title.is_empty() {
        return Err(AppError::invalid_data("task line has an empty title"));
    }

    let tag = rest[open + 1..close].trim();
    let tail = &rest[close + 1..];
    let mut description = tail.strip_prefix(':').unwrap_or(tail).trim();

    let mut time = ClockTime::NOON;
    if let Some(lparen) = description.rfind('(') {
        if let Some(rparen) = description.rfind(')')
            && rparen > lparen
        {
            let time_str = &description[lparen + 1..rparen];
            if time_str.contains(':') {
                time = time_str
                    .parse()
                    .map_err(|err: AppError| AppError::invalid_data(err.message().to_string()))?;
            }
        }
        description = description[..lparen].trim();
    }

    let (priority, tagged_done) = if tag == DONE_TAG {
        (Priority::Medium, true)
    } else {
        (tag.parse().unwrap_or_default(), false)
    };

    Ok(LegacyTask {
        date,
        title: title.to_string(),
        priority,
        description: description.to_string(),
        time,
        completed: tagged_done || completed_mark,
    })
}

/// Byte offsets of the `[` and `]` around the priority tag. The tag is the
/// bracket pair closed by the first `]:`, so titles may carry brackets.
fn tag_bounds(rest: &str) -> Result<(usize, usize), AppError> {
    if let Some(close) = rest.find("]:") {
        let open = rest[..close]
            .rfind('[')
            .ok_or_else(|| AppError::invalid_data("task line has no priority tag"))?;
        return Ok((open, close));
    }

    let open = rest
        .find('[')
        .ok_or_else(|| AppError::invalid_data("task line has no priority tag"))?;
    let close = rest[open..]
        .find(']')
        .map(|offset| open + offset)
        .ok_or_else(|| AppError::invalid_data("priority tag is not closed"))?;
    Ok((open, close))
}
