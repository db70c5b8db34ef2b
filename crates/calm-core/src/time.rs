//! Time types for calendar queries.
//!
//! This module provides [`EventTime`] for representing event start/end times
//! (which may be either a specific instant or an all-day date), and
//! [`QueryWindow`] for the `[start, end)` range a command asks the calendar
//! about. Windows are built from civil dates in a caller-supplied timezone
//! and stored as UTC instants.

use chrono::{DateTime, Datelike, Days, Duration, LocalResult, NaiveDate, TimeZone, Utc};
use std::cmp::Ordering;
use thiserror::Error;

/// Errors from window construction and date parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    /// The date string matched neither accepted format.
    #[error("invalid date '{0}' (expected YYYY-MM-DD or YYYY/MM/DD)")]
    InvalidDate(String),
    /// Midnight was skipped by a daylight-saving jump in the given timezone.
    #[error("midnight does not exist on {0} in this timezone")]
    NonexistentMidnight(NaiveDate),
    /// The date has no neighbor inside chrono's supported range.
    #[error("date out of range: {0}")]
    DateOutOfRange(NaiveDate),
}

/// Represents the time of a calendar event.
///
/// Calendar events carry one of two kinds of boundary:
/// - **DateTime**: a specific instant (stored as UTC)
/// - **AllDay**: a civil date without a time-of-day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTime {
    /// A specific instant, stored in UTC.
    DateTime(DateTime<Utc>),
    /// An all-day event date (no specific time).
    AllDay(NaiveDate),
}

impl EventTime {
    /// Creates an `EventTime::DateTime` from a UTC instant.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }

    /// Creates an `EventTime::DateTime` from an instant in any timezone.
    pub fn from_zoned<Tz: TimeZone>(dt: DateTime<Tz>) -> Self {
        Self::DateTime(dt.with_timezone(&Utc))
    }

    /// Creates an `EventTime::AllDay` from a civil date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self::AllDay(date)
    }

    /// Returns `true` if this is an all-day boundary.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// Converts to a UTC instant for comparison purposes.
    ///
    /// All-day boundaries compare at midnight UTC on their date.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            Self::DateTime(dt) => *dt,
            Self::AllDay(date) => date.and_hms_opt(0, 0, 0).expect("valid time").and_utc(),
        }
    }

    /// Returns the civil date of this boundary (UTC date for instants).
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::DateTime(dt) => dt.date_naive(),
            Self::AllDay(date) => *date,
        }
    }
}

impl PartialOrd for EventTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_utc().cmp(&other.to_utc())
    }
}

/// The time range a calendar query covers.
///
/// A half-open interval `[start, end)` in UTC. Windows are derived from civil
/// dates in a timezone supplied by the caller, so commands can use the system
/// local timezone while tests pin fixed offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl QueryWindow {
    /// Creates a window from explicit UTC boundaries.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "QueryWindow start must be <= end");
        Self { start, end }
    }

    /// Creates the window covering one civil day in the given timezone:
    /// `[midnight of `date`, midnight of the next day)`.
    pub fn day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<Self, WindowError> {
        let next = date.succ_opt().ok_or(WindowError::DateOutOfRange(date))?;
        Ok(Self {
            start: local_midnight(date, tz)?,
            end: local_midnight(next, tz)?,
        })
    }

    /// Creates the window covering the week containing `date` in the given
    /// timezone.
    ///
    /// Weeks start on Monday; the window is `[Monday midnight, next Monday
    /// midnight)`, seven civil days.
    pub fn week_of<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<Self, WindowError> {
        let back = u64::from(date.weekday().num_days_from_monday());
        let monday = date
            .checked_sub_days(Days::new(back))
            .ok_or(WindowError::DateOutOfRange(date))?;
        let next_monday = monday
            .checked_add_days(Days::new(7))
            .ok_or(WindowError::DateOutOfRange(date))?;
        Ok(Self {
            start: local_midnight(monday, tz)?,
            end: local_midnight(next_monday, tz)?,
        })
    }

    /// Returns the duration of this window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if an instant falls within this window.
    ///
    /// Uses half-open interval semantics: `[start, end)`.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }
}

/// Resolves local midnight of `date` to a UTC instant.
///
/// An ambiguous midnight (clocks rolled back across it) resolves to the
/// earlier instant; a nonexistent one (skipped by a DST jump) is an error.
fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<DateTime<Utc>, WindowError> {
    let naive = date.and_hms_opt(0, 0, 0).expect("valid time");
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earlier, _) => Ok(earlier.with_timezone(&Utc)),
        LocalResult::None => Err(WindowError::NonexistentMidnight(date)),
    }
}

/// Parses a civil date in `YYYY-MM-DD` or `YYYY/MM/DD` form.
pub fn parse_date(input: &str) -> Result<NaiveDate, WindowError> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y/%m/%d"))
        .map_err(|_| WindowError::InvalidDate(input.to_string()))
}
