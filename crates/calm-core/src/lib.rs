//! Core types: events, query windows, terminal formatting

pub mod event;
pub mod format;
pub mod time;

pub use event::{Event, EventPhase};
pub use format::{EventFormatter, JsonEvent, NO_EVENTS_LINE};
pub use time::{parse_date, EventTime, QueryWindow, WindowError};
