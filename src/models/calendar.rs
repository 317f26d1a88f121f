//! Month grid for the history page.

use std::collections::HashMap;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarCell {
    pub date: Option<NaiveDate>,
    pub workout_count: usize,
    pub is_today: bool,
}

impl CalendarCell {
    fn blank() -> Self {
        Self {
            date: None,
            workout_count: 0,
            is_today: false,
        }
    }

    pub fn day(&self) -> String {
        self.date.map(|d| d.day().to_string()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthCalendar {
    pub first_day: NaiveDate,
    pub weeks: Vec<Vec<CalendarCell>>,
}

impl MonthCalendar {
    /// Monday-first grid for the month containing `first_day`.
    pub fn build(first_day: NaiveDate, today: NaiveDate, counts: &HashMap<NaiveDate, usize>) -> Self {
        let first_day = first_day.with_day(1).unwrap_or(first_day);
        let days = days_in_month(first_day);
        let lead = first_day.weekday().num_days_from_monday() as usize;

        let mut cells: Vec<CalendarCell> = (0..lead).map(|_| CalendarCell::blank()).collect();
        for date in first_day.iter_days().take(days as usize) {
            cells.push(CalendarCell {
                date: Some(date),
                workout_count: counts.get(&date).copied().unwrap_or(0),
                is_today: date == today,
            });
        }
        while cells.len() % 7 != 0 {
            cells.push(CalendarCell::blank());
        }

        let weeks = cells.chunks(7).map(|week| week.to_vec()).collect();
        Self { first_day, weeks }
    }

    pub fn title(&self) -> String {
        self.first_day.format("%B %Y").to_string()
    }

    pub fn month_param(&self) -> String {
        month_param(self.first_day)
    }

    pub fn prev_month(&self) -> String {
        month_param(month_before(self.first_day))
    }

    pub fn next_month(&self) -> String {
        month_param(month_after(self.first_day))
    }

    pub fn total_workouts(&self) -> usize {
        self.weeks
            .iter()
            .flatten()
            .map(|cell| cell.workout_count)
            .sum()
    }
}

/// First day of the following month, the exclusive upper bound of this one.
///
/// Saturates at the last representable date; `parse_month` never yields a
/// month that would need it.
pub fn month_after(first_day: NaiveDate) -> NaiveDate {
    first_day
        .checked_add_months(Months::new(1))
        .unwrap_or(NaiveDate::MAX)
}

/// First day of the preceding month, saturating like `month_after`.
pub fn month_before(first_day: NaiveDate) -> NaiveDate {
    first_day
        .checked_sub_months(Months::new(1))
        .unwrap_or(NaiveDate::MIN)
}

pub fn days_in_month(first_day: NaiveDate) -> u32 {
    (month_after(first_day) - first_day).num_days() as u32
}

pub fn month_param(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Parse `YYYY-MM` into the first day of that month.
///
/// Months at the edge of the representable range are rejected, so the
/// previous and next month always exist.
pub fn parse_month(raw: &str) -> Option<NaiveDate> {
    let (year, month) = raw.trim().split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let first_day = NaiveDate::from_ymd_opt(year, month, 1)?;
    first_day.checked_add_months(Months::new(1))?;
    first_day.checked_sub_months(Months::new(1))?;
    Some(first_day)
}
