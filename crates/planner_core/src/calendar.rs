//! Month calendar with per-day highlights reconciled from the task list.

use crate::config::Palette;
use crate::error::AppError;
use crate::model::{Priority, Task};
use std::collections::BTreeMap;
use time::{Date, Month};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Highlight {
    High,
    Medium,
    Low,
    Completed,
}

impl Highlight {
    fn from_priority(priority: Priority) -> Self {
        match priority {
            Priority::High => Self::High,
            Priority::Medium => Self::Medium,
            Priority::Low => Self::Low,
        }
    }

    // Lower wins when several tasks share a day.
    fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
            Self::Completed => 3,
        }
    }

    pub fn marker(self) -> char {
        match self {
            Self::High => '!',
            Self::Medium => '*',
            Self::Low => '.',
            Self::Completed => 'x',
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayMark {
    pub highlight: Option<Highlight>,
    pub is_today: bool,
}

/// Rebuilds every day mark from scratch. A day shows its strongest open
/// priority and only falls back to `Completed` when every task on it is done.
pub fn highlights(tasks: &[Task], today: Date) -> BTreeMap<Date, DayMark> {
    let mut marks: BTreeMap<Date, DayMark> = BTreeMap::new();

    for task in tasks {
        let candidate = if task.completed {
            Highlight::Completed
        } else {
            Highlight::from_priority(task.priority)
        };
        let mark = marks.entry(task.date).or_default();
        mark.highlight = match mark.highlight {
            Some(current) if current.rank() <= candidate.rank() => Some(current),
            _ => Some(candidate),
        };
    }

    marks.entry(today).or_default().is_today = true;
    marks
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub date: Date,
    pub mark: DayMark,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthView {
    pub year: i32,
    pub month: Month,
    /// Monday-first rows; `None` pads days outside the month.
    pub weeks: Vec<[Option<DayCell>; 7]>,
}

impl MonthView {
    pub fn new(year: i32, month: Month, marks: &BTreeMap<Date, DayMark>) -> Result<Self, AppError> {
        let first = Date::from_calendar_date(year, month, 1)
            .map_err(|err| AppError::invalid_input(err.to_string()))?;

        let mut weeks = Vec::new();
        let mut week: [Option<DayCell>; 7] = [None; 7];
        let mut column = usize::from(first.weekday().number_days_from_monday());
        let mut current = Some(first);

        while let Some(date) = current.filter(|date| date.month() == month) {
            week[column] = Some(DayCell {
                date,
                mark: marks.get(&date).copied().unwrap_or_default(),
            });
            column += 1;
            if column == 7 {
                weeks.push(week);
                week = [None; 7];
                column = 0;
            }
            current = date.next_day();
        }

        if column > 0 {
            weeks.push(week);
        }

        Ok(Self { year, month, weeks })
    }

    pub fn cell(&self, date: Date) -> Option<&DayCell> {
        self.weeks
            .iter()
            .flat_map(|week| week.iter())
            .flatten()
            .find(|cell| cell.date == date)
    }
}

pub fn render_month(view: &MonthView, palette: &Palette) -> String {
    let mut out = String::new();
    let title = format!("{} {}", view.month, view.year);
    out.push_str(&palette.accentize(&format!("{title:^27}")).trim_end().to_string());
    out.push('\n');
    out.push_str("Mo  Tu  We  Th  Fr  Sa  Su");
    out.push('\n');

    for week in &view.weeks {
        let mut row = String::new();
        for slot in week {
            match slot {
                Some(cell) => row.push_str(&render_cell(cell, palette)),
                None => row.push_str("   "),
            }
            row.push(' ');
        }
        out.push_str(row.trim_end());
        out.push('\n');
    }

    out.push_str(&palette.mutedize("! high  * medium  . low  x done  @ today"));
    out.push('\n');
    out
}

fn render_cell(cell: &DayCell, palette: &Palette) -> String {
    let marker = match (cell.mark.highlight, cell.mark.is_today) {
        (Some(highlight), _) => highlight.marker(),
        (None, true) => '@',
        (None, false) => ' ',
    };
    let text = format!("{:>2}{}", cell.date.day(), marker);

    match cell.mark.highlight {
        Some(highlight) => palette.highlight(highlight, &text),
        None if cell.mark.is_today => palette.todayize(&text),
        None => text,
    }
}

/// Parses `MM/YYYY` (or `YYYY-MM`) into a year and month.
pub fn parse_month(raw: &str) -> Result<(i32, Month), AppError> {
    let trimmed = raw.trim();
    let (year, month) = if let Some((month, year)) = trimmed.split_once('/') {
        (year, month)
    } else if let Some((year, month)) = trimmed.split_once('-') {
        (year, month)
    } else {
        return Err(AppError::invalid_input("month must be MM/YYYY"));
    };

    let year = year
        .trim()
        .parse::<i32>()
        .map_err(|_| AppError::invalid_input("month must be MM/YYYY"))?;
    let month = month
        .trim()
        .parse::<u8>()
        .map_err(|_| AppError::invalid_input("month must be MM/YYYY"))?;
    let month = Month::try_from(month).map_err(|_| AppError::invalid_input("month must be 1-12"))?;
    Ok((year, month))
}
