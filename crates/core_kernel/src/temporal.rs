//! Business calendar handling
//!
//! Ledger events are stored as UTC instants, but bills are reported per
//! calendar day of the business. This module provides:
//! - `Timezone`: the business timezone (UTC unless configured otherwise)
//! - `DateWindow`: a half-open instant window used for store queries
//! - `DateRange`: an inclusive range of calendar days
//! - `BusinessCalendar`: conversions between calendar days and windows

use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use thiserror::Error;

use crate::error::CoreError;

/// Timezone wrapper for the business calendar
///
/// Wraps chrono_tz::Tz with custom serialization support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl FromStr for Timezone {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tz::from_str(s.trim())
            .map(Timezone)
            .map_err(|_| CoreError::UnknownTimezone(s.trim().to_string()))
    }
}

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Converts a UTC instant to the calendar date in this timezone
    pub fn local_date(&self, utc: DateTime<Utc>) -> NaiveDate {
        utc.with_timezone(&self.0).date_naive()
    }

    /// Gets the start of day (00:00:00) in this timezone as UTC
    ///
    /// When midnight is ambiguous the earliest instant is used.
    pub fn start_of_day(&self, date: NaiveDate) -> Result<DateTime<Utc>, TemporalError> {
        date.and_hms_opt(0, 0, 0)
            .and_then(|midnight| midnight.and_local_timezone(self.0).earliest())
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| TemporalError::NonexistentLocalTime(format!("{} in {}", date, self.0.name())))
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(chrono_tz::UTC)
    }
}

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid window: start {start} must be before end {end}")]
    InvalidWindow {
        start: String,
        end: String,
    },

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange {
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Malformed date: {0}")]
    MalformedDate(String),

    #[error("Date out of supported range: {0}")]
    OutOfRange(String),

    #[error("Local time does not exist: {0}")]
    NonexistentLocalTime(String),
}

/// A half-open window of instants: `[start, end)`
///
/// An absent `end` means the window is open-ended and covers every instant
/// from `start` onwards, including future-dated entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// Start of the window (inclusive)
    pub start: DateTime<Utc>,
    /// End of the window (exclusive), None means unbounded
    pub end: Option<DateTime<Utc>>,
}

impl DateWindow {
    /// Creates a new window
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Result<Self, TemporalError> {
        if let Some(end) = end {
            if start >= end {
                return Err(TemporalError::InvalidWindow {
                    start: start.to_string(),
                    end: end.to_string(),
                });
            }
        }
        Ok(Self { start, end })
    }

    /// Creates an unbounded window starting from the given instant
    pub fn from(start: DateTime<Utc>) -> Self {
        Self { start, end: None }
    }

    /// Creates a bounded window
    pub fn bounded(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TemporalError> {
        Self::new(start, Some(end))
    }

    /// Returns true if this window contains the given instant
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && self.end.map_or(true, |e| timestamp < e)
    }

    /// Returns true if this window has no end
    pub fn is_unbounded(&self) -> bool {
        self.end.is_none()
    }
}

/// An inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TemporalError> {
        if start > end {
            return Err(TemporalError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of calendar days covered, both ends included
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Iterates every day of the range in ascending order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// Maps calendar days of the business onto UTC instant windows
///
/// # Example
///
/// ```rust
/// use core_kernel::BusinessCalendar;
/// use chrono::NaiveDate;
///
/// let calendar = BusinessCalendar::default();
/// let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
/// let window = calendar.day(day).unwrap();
/// assert_eq!(window.start.to_rfc3339(), "2024-03-10T00:00:00+00:00");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessCalendar {
    timezone: Timezone,
}

impl BusinessCalendar {
    pub fn new(timezone: Timezone) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> Timezone {
        self.timezone
    }

    /// The calendar date an instant falls on
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.timezone.local_date(instant)
    }

    /// Shifts a date by a signed number of days
    pub fn shift(&self, date: NaiveDate, days: i64) -> Result<NaiveDate, TemporalError> {
        let magnitude = Days::new(days.unsigned_abs());
        let shifted = if days >= 0 {
            date.checked_add_days(magnitude)
        } else {
            date.checked_sub_days(magnitude)
        };
        shifted.ok_or_else(|| TemporalError::OutOfRange(format!("{} shifted by {} days", date, days)))
    }

    /// The window `[start(date), start(date + 1))`
    pub fn day(&self, date: NaiveDate) -> Result<DateWindow, TemporalError> {
        let start = self.timezone.start_of_day(date)?;
        let end = self.timezone.start_of_day(self.shift(date, 1)?)?;
        DateWindow::bounded(start, end)
    }

    /// The window `[start(first), start(last + 1))`
    pub fn days(&self, range: DateRange) -> Result<DateWindow, TemporalError> {
        let start = self.timezone.start_of_day(range.start)?;
        let end = self.timezone.start_of_day(self.shift(range.end, 1)?)?;
        DateWindow::bounded(start, end)
    }

    /// The open-ended window `[start(date), ∞)`
    pub fn from_day(&self, date: NaiveDate) -> Result<DateWindow, TemporalError> {
        Ok(DateWindow::from(self.timezone.start_of_day(date)?))
    }

    /// Parses a request date into a calendar day
    ///
    /// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp; a timestamp is mapped
    /// to the calendar day it falls on in the business timezone.
    pub fn parse_date(&self, input: &str) -> Result<NaiveDate, TemporalError> {
        let trimmed = input.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(date);
        }
        DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| self.date_of(dt.with_timezone(&Utc)))
            .map_err(|_| TemporalError::MalformedDate(input.to_string()))
    }
}
