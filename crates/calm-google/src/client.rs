//! Google Calendar API client.
//!
//! A thin blocking client for the Calendar API v3 `events.list` endpoint:
//! request building, pagination, and conversion of API payloads into
//! [`Event`] values. Ordering is whatever the API returned.

use std::time::Duration;

use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, warn};

use calm_core::{Event, EventTime, QueryWindow};

use crate::error::{GoogleError, GoogleResult};

/// Base URL for Google Calendar API v3.
const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Calendar API client bound to one access token.
#[derive(Debug)]
pub struct CalendarClient {
    http_client: reqwest::blocking::Client,
    access_token: String,
    base_url: String,
}

impl CalendarClient {
    /// Creates a client with the given access token.
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to create HTTP client");

        Self {
            http_client,
            access_token: access_token.into(),
            base_url: CALENDAR_API_BASE.to_string(),
        }
    }

    /// Points the client at a different API base URL. For fixtures.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Lists the events of `calendar_id` that fall in `window`.
    ///
    /// Recurring events arrive already expanded (`singleEvents=true`) and
    /// sorted by start time (`orderBy=startTime`); that order is preserved.
    /// Cancelled and malformed entries are skipped.
    pub fn list_events(
        &self,
        calendar_id: &str,
        window: &QueryWindow,
    ) -> GoogleResult<Vec<Event>> {
        let mut all_events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list_events_page(calendar_id, window, page_token.as_deref())?;

            for item in page.items {
                if let Some(event) = convert_event(item) {
                    all_events.push(event);
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(
            "fetched {} events from calendar {}",
            all_events.len(),
            calendar_id
        );
        Ok(all_events)
    }

    /// Fetches a single page of events.
    fn list_events_page(
        &self,
        calendar_id: &str,
        window: &QueryWindow,
        page_token: Option<&str>,
    ) -> GoogleResult<EventListResponse> {
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        );

        let mut request = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("timeMin", window.start.to_rfc3339()),
                ("timeMax", window.end.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token.to_string())]);
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                GoogleError::network("request timeout")
            } else if e.is_connect() {
                GoogleError::network(format!("connection failed: {}", e))
            } else {
                GoogleError::network(format!("request failed: {}", e))
            }
        })?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(GoogleError::authentication(
                "access token expired or invalid",
            ));
        }

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GoogleError::server(format!(
                "API error ({}): {}",
                status, body
            )));
        }

        let body = response
            .text()
            .map_err(|e| GoogleError::network(format!("failed to read response: {}", e)))?;

        serde_json::from_str(&body)
            .map_err(|e| GoogleError::invalid_response(format!("failed to parse response: {}", e)))
    }
}

/// Converts an API event into an [`Event`], or skips it.
fn convert_event(event: ApiEvent) -> Option<Event> {
    if event.status.as_deref() == Some("cancelled") {
        return None;
    }

    let id = event.id.unwrap_or_default();
    let start = parse_event_time(event.start, "start", &id)?;
    let end = parse_event_time(event.end, "end", &id)?;

    Some(Event::new(event.summary.unwrap_or_default(), start, end))
}

/// Parses one boundary of an API event, warning on anything unusable.
fn parse_event_time(time: Option<ApiEventTime>, which: &str, id: &str) -> Option<EventTime> {
    let Some(time) = time else {
        warn!("event {} has no {} time", id, which);
        return None;
    };

    match (time.date_time, time.date) {
        (Some(dt), _) => {
            let parsed = DateTime::parse_from_rfc3339(&dt)
                .map_err(|e| warn!("event {}: failed to parse {} time: {}", id, which, e))
                .ok()?;
            Some(EventTime::from_zoned(parsed))
        }
        (None, Some(date)) => {
            let parsed = chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|e| warn!("event {}: failed to parse {} date: {}", id, which, e))
                .ok()?;
            Some(EventTime::from_date(parsed))
        }
        (None, None) => {
            warn!("event {} has an empty {} time", id, which);
            None
        }
    }
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

/// A single event from the Calendar API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    status: Option<String>,
    start: Option<ApiEventTime>,
    end: Option<ApiEventTime>,
}

/// Event boundary from the API: either a timestamp or a civil date.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
}
