//! Calendar providers
//!
//! Google Calendar is the system of record for booked time when credentials
//! are configured. Without them the bookings table stands in, which is also
//! what the tests run against.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, Url};
use sailor_common::config::GoogleCalendarConfig;
use sailor_common::scheduling::BusyPeriod;
use sailor_common::{Error, Result};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const CALENDAR_API_URL: &str = "https://www.googleapis.com/calendar/v3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Refresh the access token this long before Google says it expires
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Reminder overrides: email a day ahead, popup an hour ahead
const REMINDERS: [(&str, u32); 2] = [("email", 24 * 60), ("popup", 60)];

/// Event to place on the calendar
#[derive(Debug, Clone)]
pub struct CalendarEvent {
    pub summary: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub attendees: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedEvent {
    pub id: String,
    pub html_link: Option<String>,
}

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Provider name reported by the calendar health endpoint
    fn name(&self) -> &'static str;

    /// Busy periods intersecting [start, end]
    async fn busy_times(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<BusyPeriod>>;

    async fn create_event(&self, event: &CalendarEvent) -> Result<CreatedEvent>;

    async fn delete_event(&self, event_id: &str) -> Result<()>;
}

/// Google Calendar over its REST API, authorized with a refresh token
pub struct GoogleCalendarClient {
    http_client: Client,
    config: GoogleCalendarConfig,
    access_token: Mutex<Option<(String, Instant)>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct FreeBusyResponse {
    #[serde(default)]
    calendars: HashMap<String, FreeBusyCalendar>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyCalendar {
    #[serde(default)]
    busy: Vec<BusyPeriod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventResponse {
    id: String,
    html_link: Option<String>,
}

impl GoogleCalendarClient {
    pub fn new(config: GoogleCalendarConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Integration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
            access_token: Mutex::new(None),
        })
    }

    /// `/calendars/{id}/events[/{event_id}]` with each segment escaped
    fn events_url(&self, event_id: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(CALENDAR_API_URL)
            .map_err(|e| Error::Internal(format!("Bad calendar base URL: {}", e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::Internal("Calendar base URL cannot hold a path".into()))?;
            segments.push("calendars").push(&self.config.calendar_id).push("events");
            if let Some(id) = event_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    async fn token(&self) -> Result<String> {
        let mut cached = self.access_token.lock().await;
        if let Some((token, expires_at)) = cached.as_ref() {
            if Instant::now() < *expires_at {
                return Ok(token.clone());
            }
        }

        debug!("Refreshing Google access token");
        let response = self
            .http_client
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", self.config.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| Error::Integration(format!("Google token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Integration(format!("Google token refresh returned {}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Integration(format!("Invalid Google token response: {}", e)))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *cached = Some((token.access_token.clone(), Instant::now() + lifetime));
        Ok(token.access_token)
    }
}

async fn check_status(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(%status, action, "Google Calendar request failed");
    Err(Error::Integration(format!("Google Calendar {} returned {}: {}", action, status, body)))
}

#[async_trait]
impl CalendarProvider for GoogleCalendarClient {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn busy_times(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<BusyPeriod>> {
        let token = self.token().await?;
        let response = self
            .http_client
            .post(format!("{}/freeBusy", CALENDAR_API_URL))
            .bearer_auth(token)
            .json(&json!({
                "timeMin": start.to_rfc3339(),
                "timeMax": end.to_rfc3339(),
                "items": [{ "id": self.config.calendar_id }],
            }))
            .send()
            .await
            .map_err(|e| Error::Integration(format!("freeBusy request failed: {}", e)))?;

        let body: FreeBusyResponse = check_status(response, "freeBusy")
            .await?
            .json()
            .await
            .map_err(|e| Error::Integration(format!("Invalid freeBusy response: {}", e)))?;

        Ok(body
            .calendars
            .get(&self.config.calendar_id)
            .map(|c| c.busy.clone())
            .unwrap_or_default())
    }

    async fn create_event(&self, event: &CalendarEvent) -> Result<CreatedEvent> {
        let token = self.token().await?;
        let overrides: Vec<_> = REMINDERS
            .iter()
            .map(|(method, minutes)| json!({ "method": method, "minutes": minutes }))
            .collect();
        let attendees: Vec<_> = event.attendees.iter().map(|email| json!({ "email": email })).collect();

        let response = self
            .http_client
            .post(self.events_url(None)?)
            .bearer_auth(token)
            .json(&json!({
                "summary": event.summary,
                "description": event.description,
                "start": { "dateTime": event.start.to_rfc3339(), "timeZone": self.config.time_zone },
                "end": { "dateTime": event.end.to_rfc3339(), "timeZone": self.config.time_zone },
                "attendees": attendees,
                "reminders": { "useDefault": false, "overrides": overrides },
            }))
            .send()
            .await
            .map_err(|e| Error::Integration(format!("Event insert failed: {}", e)))?;

        let created: EventResponse = check_status(response, "events.insert")
            .await?
            .json()
            .await
            .map_err(|e| Error::Integration(format!("Invalid event response: {}", e)))?;

        info!(event_id = %created.id, "Calendar event created");
        Ok(CreatedEvent {
            id: created.id,
            html_link: created.html_link,
        })
    }

    async fn delete_event(&self, event_id: &str) -> Result<()> {
        let token = self.token().await?;
        let response = self
            .http_client
            .delete(self.events_url(Some(event_id))?)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Error::Integration(format!("Event delete failed: {}", e)))?;

        // Already deleted counts as done
        if response.status() == StatusCode::GONE {
            return Ok(());
        }
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("Calendar event {} not found", event_id)));
        }
        check_status(response, "events.delete").await?;
        info!(event_id, "Calendar event deleted");
        Ok(())
    }
}

/// Bookings table as the calendar
pub struct LocalCalendar {
    db: SqlitePool,
}

impl LocalCalendar {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CalendarProvider for LocalCalendar {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn busy_times(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<BusyPeriod>> {
        sailor_common::db::bookings::busy_periods(&self.db, start, end).await
    }

    async fn create_event(&self, _event: &CalendarEvent) -> Result<CreatedEvent> {
        Ok(CreatedEvent {
            id: format!("local-{}", Uuid::new_v4()),
            html_link: None,
        })
    }

    async fn delete_event(&self, _event_id: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sailor_common::db::bookings::{insert_booking, NewBooking};
    use sailor_common::db::init_memory_database;
    use sailor_common::time::parse_timestamp;

    fn google_config(calendar_id: &str) -> GoogleCalendarConfig {
        GoogleCalendarConfig {
            client_id: "id".into(),
            client_secret: "secret".into(),
            refresh_token: "refresh".into(),
            calendar_id: calendar_id.into(),
            time_zone: "America/Los_Angeles".into(),
        }
    }

    #[test]
    fn test_events_url_escapes_calendar_id() {
        let client = GoogleCalendarClient::new(google_config("team@sailorskills.com")).unwrap();
        let url = client.events_url(Some("abc123")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/team@sailorskills.com/events/abc123"
        );

        let client = GoogleCalendarClient::new(google_config("a b")).unwrap();
        assert!(client.events_url(None).unwrap().as_str().ends_with("/calendars/a%20b/events"));
    }

    #[test]
    fn test_freebusy_response_parses() {
        let body: FreeBusyResponse = serde_json::from_value(json!({
            "calendars": {
                "primary": {
                    "busy": [{ "start": "2025-06-02T17:00:00Z", "end": "2025-06-02T18:00:00Z" }]
                }
            }
        }))
        .unwrap();
        assert_eq!(body.calendars["primary"].busy.len(), 1);
    }

    #[tokio::test]
    async fn test_local_calendar_reads_bookings() {
        let db = init_memory_database().await.unwrap();
        let start = parse_timestamp("2025-06-02T17:00:00Z").unwrap();
        insert_booking(
            &db,
            &NewBooking {
                service_type_id: None,
                service_type: "Diving Service Quote".into(),
                start,
                end: start + chrono::Duration::minutes(30),
                customer_name: "Pat".into(),
                customer_email: "pat@example.com".into(),
                customer_phone: None,
                customer_notes: None,
                calendar_event_id: None,
            },
        )
        .await
        .unwrap();

        let calendar = LocalCalendar::new(db);
        let busy = calendar
            .busy_times(parse_timestamp("2025-06-02").unwrap(), parse_timestamp("2025-06-03").unwrap())
            .await
            .unwrap();
        assert_eq!(busy, vec![BusyPeriod { start, end: start + chrono::Duration::minutes(30) }]);

        let created = calendar
            .create_event(&CalendarEvent {
                summary: "x".into(),
                description: String::new(),
                start,
                end: start,
                attendees: vec![],
            })
            .await
            .unwrap();
        assert!(created.id.starts_with("local-"));
    }
}
