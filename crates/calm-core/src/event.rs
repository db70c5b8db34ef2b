//! Calendar event records.
//!
//! [`Event`] is the read-only record a query returns: a title and two time
//! boundaries. Events live for one command invocation and are never persisted
//! locally. [`EventPhase`] classifies an event against a reference instant,
//! which is what drives status coloring in the formatter.

use chrono::{DateTime, Utc};

use crate::time::EventTime;

/// A calendar event for one query window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Event title as returned by the API (may be empty).
    pub title: String,
    /// Start boundary.
    pub start: EventTime,
    /// End boundary. For all-day events the API's end date is exclusive.
    pub end: EventTime,
}

/// Where an event sits relative to a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    /// Already over.
    Past,
    /// In progress right now.
    Ongoing,
    /// Not started yet.
    Upcoming,
}

impl Event {
    /// Creates a new event.
    pub fn new(title: impl Into<String>, start: EventTime, end: EventTime) -> Self {
        Self {
            title: title.into(),
            start,
            end,
        }
    }

    /// Returns `true` if either boundary is an all-day date.
    pub fn is_all_day(&self) -> bool {
        self.start.is_all_day() || self.end.is_all_day()
    }

    /// Classifies this event against `now`.
    ///
    /// An event is ongoing for `start <= now < end`; the end boundary is
    /// exclusive, so an event that ends exactly at `now` is already past.
    /// All-day boundaries compare at midnight UTC.
    pub fn phase_at(&self, now: DateTime<Utc>) -> EventPhase {
        let start = self.start.to_utc();
        let end = self.end.to_utc();
        if end <= now {
            EventPhase::Past
        } else if start <= now {
            EventPhase::Ongoing
        } else {
            EventPhase::Upcoming
        }
    }
}
