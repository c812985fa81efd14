// src/attendance/calendar.rs
use chrono::{Datelike, NaiveDate, Weekday};

use crate::records::ValidationError;

/// Calendar month addressed by the grid. `month` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRef {
    pub year: i32,
    pub month: u32,
}

impl MonthRef {
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|_| Self { year, month })
            .ok_or(ValidationError::InvalidDate { year, month, day: 1 })
    }

    /// Month containing today's local date.
    pub fn current() -> Self {
        let today = chrono::Local::now().date_naive();
        Self {
            year: today.year(),
            month: today.month(),
        }
    }

    pub fn days(&self) -> u32 {
        days_in_month(self.year, self.month).unwrap_or(0)
    }

    pub fn date_key(&self, day: u32) -> String {
        date_key(self.year, self.month, day)
    }
}

/// `year-month-day` without zero padding, e.g. `2024-3-7`.
pub fn date_key(year: i32, month: u32, day: u32) -> String {
    format!("{}-{}-{}", year, month, day)
}

pub fn validate_day(year: i32, month: u32, day: u32) -> Result<NaiveDate, ValidationError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(ValidationError::InvalidDate { year, month, day })
}

pub fn days_in_month(year: i32, month: u32) -> Result<u32, ValidationError> {
    let first = validate_day(year, month, 1)?;
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let next_first = validate_day(next_year, next_month, 1)?;
    Ok(next_first.signed_duration_since(first).num_days() as u32)
}

/// Saturday or Sunday.
pub fn is_weekend(year: i32, month: u32, day: u32) -> Result<bool, ValidationError> {
    let date = validate_day(year, month, day)?;
    Ok(matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
}
