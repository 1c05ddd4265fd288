//! Month projection for the tracker calendar.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::{CycleEntry, CycleStatistics, Flow, PadPalsError};

/// Display state of one calendar day. `Logged` wins over `Predicted`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DayState {
    Logged { flow: Flow },
    Predicted,
    None,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub state: DayState,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthCalendar {
    pub year: i32,
    pub month: u32,
    /// Empty cells before day 1 in a Sunday-first week grid.
    pub leading_blanks: u32,
    pub days: Vec<CalendarDay>,
}

impl MonthCalendar {
    pub fn day(&self, day: u32) -> Option<&CalendarDay> {
        self.days.get(day.checked_sub(1)? as usize)
    }
}

pub fn classify_day(date: NaiveDate, entries: &[CycleEntry], stats: &CycleStatistics) -> DayState {
    if let Some(entry) = entries.iter().find(|e| e.contains(date)) {
        return DayState::Logged { flow: entry.flow };
    }
    match stats.predicted_window() {
        Some((start, end)) if date >= start && date <= end => DayState::Predicted,
        _ => DayState::None,
    }
}

/// Classify every day of `year`-`month`.
pub fn project_month(
    year: i32,
    month: u32,
    entries: &[CycleEntry],
    stats: &CycleStatistics,
) -> Result<MonthCalendar, PadPalsError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        PadPalsError::InvalidInput(format!("invalid calendar month: {year}-{month}"))
    })?;

    let days = first
        .iter_days()
        .take_while(|d| d.month() == month)
        .map(|date| CalendarDay {
            date,
            state: classify_day(date, entries, stats),
        })
        .collect();

    Ok(MonthCalendar {
        year,
        month,
        leading_blanks: first.weekday().num_days_from_sunday(),
        days,
    })
}
