//! Terminal and JSON rendering of event lists.
//!
//! [`EventFormatter`] turns a list of [`Event`]s into display lines. It is a
//! pure function of its inputs: the display timezone, the color switch, and
//! the reference instant all come from the caller, so the same event list
//! always renders to the same lines. Color output classifies each event
//! against the reference instant (past, in progress, upcoming) and opens
//! with a legend; an empty list renders as exactly one line.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::event::{Event, EventPhase};
use crate::time::EventTime;

/// The single line printed when a query returns no events.
pub const NO_EVENTS_LINE: &str = "No events found.";

/// Title substitute for events the API returned without one.
const UNTITLED: &str = "(no subject)";

const GRAY: &str = "\x1b[90m";
const GREEN: &str = "\x1b[1;32m";
const WHITE: &str = "\x1b[97m";
const RESET: &str = "\x1b[0m";

/// Renders event lists for the terminal.
#[derive(Debug, Clone)]
pub struct EventFormatter<Tz: TimeZone> {
    tz: Tz,
    color: bool,
}

impl<Tz: TimeZone> EventFormatter<Tz>
where
    Tz::Offset: std::fmt::Display,
{
    /// Creates a formatter that renders timed boundaries in `tz`.
    pub fn new(tz: Tz, color: bool) -> Self {
        Self { tz, color }
    }

    /// Formats `events` into display lines, classifying each against `now`.
    ///
    /// Input order is preserved; events are never re-sorted here. An empty
    /// list produces exactly one "no events" line.
    pub fn format(&self, events: &[Event], now: DateTime<Utc>) -> Vec<String> {
        if events.is_empty() {
            return vec![NO_EVENTS_LINE.to_string()];
        }

        let mut lines = Vec::with_capacity(events.len() + 1);
        if self.color {
            lines.push(legend());
        }
        for event in events {
            let title = if event.title.is_empty() {
                UNTITLED
            } else {
                event.title.as_str()
            };
            let line = format!("{} - {}", self.span(event), title);
            lines.push(self.paint(&line, event.phase_at(now)));
        }
        lines
    }

    /// Renders the `start ~ end` span of one event.
    fn span(&self, event: &Event) -> String {
        match (&event.start, &event.end) {
            (EventTime::DateTime(start), EventTime::DateTime(end)) => {
                format!(
                    "{} ~ {}",
                    start.with_timezone(&self.tz).format("%Y/%m/%d %H:%M"),
                    end.with_timezone(&self.tz).format("%Y/%m/%d %H:%M")
                )
            }
            _ => self.all_day_span(event),
        }
    }

    fn all_day_span(&self, event: &Event) -> String {
        let first = event.start.date();
        // Google's all-day end date is exclusive; show the last included day.
        let last = match &event.end {
            EventTime::AllDay(date) => date.pred_opt().unwrap_or(*date),
            EventTime::DateTime(dt) => dt.with_timezone(&self.tz).date_naive(),
        };
        if last <= first {
            format!("{} (all day)", first.format("%Y/%m/%d"))
        } else {
            format!(
                "{} ~ {} (all day)",
                first.format("%Y/%m/%d"),
                last.format("%Y/%m/%d")
            )
        }
    }

    /// Wraps every line of `text` in the phase color.
    fn paint(&self, text: &str, phase: EventPhase) -> String {
        if !self.color {
            return text.to_string();
        }
        let code = match phase {
            EventPhase::Past => GRAY,
            EventPhase::Ongoing => GREEN,
            EventPhase::Upcoming => WHITE,
        };
        text.lines()
            .map(|line| format!("{code}{line}{RESET}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn legend() -> String {
    format!("{GRAY}■ Past{RESET} {GREEN}■ In Progress{RESET} {WHITE}■ Upcoming{RESET}")
}

/// Machine-readable view of one event for `--json` output.
#[derive(Debug, Clone, Serialize)]
pub struct JsonEvent {
    pub title: String,
    /// RFC3339 instant, or `YYYY-MM-DD` for all-day boundaries.
    pub start: String,
    pub end: String,
    pub all_day: bool,
}

impl JsonEvent {
    /// Builds the JSON view of an event.
    pub fn from_event(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            start: boundary_string(&event.start),
            end: boundary_string(&event.end),
            all_day: event.is_all_day(),
        }
    }
}

fn boundary_string(et: &EventTime) -> String {
    match et {
        EventTime::DateTime(dt) => dt.to_rfc3339(),
        EventTime::AllDay(date) => date.format("%Y-%m-%d").to_string(),
    }
}
