//! Event listing commands.
//!
//! Each command computes a UTC query window from civil dates in the local
//! timezone, authenticates, fetches, and prints. The API's event order is
//! kept as-is.

use std::io::IsTerminal;
use std::time::Duration;

use chrono::{Local, Utc};
use tracing::debug;

use calm_core::{parse_date, EventFormatter, JsonEvent, QueryWindow, WindowError};
use calm_google::{Authenticator, CalendarClient, CredentialStore, InteractiveConsent};

use crate::error::{CliError, CliResult};

/// Timeout for calendar API and token endpoint requests.
const API_TIMEOUT: Duration = Duration::from_secs(30);

/// The calendar every listing command reads.
const CALENDAR_ID: &str = "primary";

/// Lists today's events.
pub fn today(json: bool) -> CliResult<()> {
    let window = QueryWindow::day(Local::now().date_naive(), &Local)?;
    run_query(window, json)
}

/// Lists tomorrow's events.
pub fn tomorrow(json: bool) -> CliResult<()> {
    let today = Local::now().date_naive();
    let date = today
        .succ_opt()
        .ok_or(WindowError::DateOutOfRange(today))?;
    run_query(QueryWindow::day(date, &Local)?, json)
}

/// Lists the events of the current Monday-through-Sunday week.
pub fn week(json: bool) -> CliResult<()> {
    let window = QueryWindow::week_of(Local::now().date_naive(), &Local)?;
    run_query(window, json)
}

/// Lists the events of one day given as `YYYY-MM-DD`.
pub fn date(date: &str, json: bool) -> CliResult<()> {
    let date = parse_date(date)?;
    run_query(QueryWindow::day(date, &Local)?, json)
}

/// Authenticates, fetches the window, and prints every event.
fn run_query(window: QueryWindow, json: bool) -> CliResult<()> {
    debug!("querying events in {} .. {}", window.start, window.end);

    let auth =
        Authenticator::new(CredentialStore::open_default()).with_timeout(API_TIMEOUT);
    let token = auth.ensure_authenticated(&InteractiveConsent::new())?;

    let client = CalendarClient::new(&token.access_token, API_TIMEOUT);
    let events = client.list_events(CALENDAR_ID, &window)?;

    if json {
        let payload: Vec<JsonEvent> = events.iter().map(JsonEvent::from_event).collect();
        let rendered = serde_json::to_string_pretty(&payload)
            .map_err(|e| CliError::Api(format!("failed to encode events as JSON: {}", e)))?;
        println!("{}", rendered);
    } else {
        let formatter = EventFormatter::new(Local, use_color());
        for line in formatter.format(&events, Utc::now()) {
            println!("{}", line);
        }
    }

    Ok(())
}

/// Colors only when writing to a terminal and NO_COLOR is unset.
fn use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}
