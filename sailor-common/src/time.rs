//! Timestamp utilities
//!
//! Timestamps are stored as RFC 3339 text in UTC with millisecond precision,
//! which keeps them lexically sortable in SQLite.

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time in storage format
pub fn now_string() -> String {
    to_storage(now())
}

/// Format an instant for storage
pub fn to_storage(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an ISO timestamp or a bare date (midnight UTC)
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc());
        }
    }
    Err(Error::InvalidInput(format!("Invalid date format: {}", value)))
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| Error::InvalidInput(format!("Invalid date: {}", value)))
}

/// Milliseconds since the Unix epoch
pub fn epoch_millis() -> i64 {
    now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_returns_recent_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01
        assert!(timestamp.timestamp() < 4_102_444_800); // 2100-01-01
    }

    #[test]
    fn test_storage_format_is_sortable() {
        let a = parse_timestamp("2025-03-01T09:00:00-08:00").unwrap();
        let b = parse_timestamp("2025-03-01T18:00:00Z").unwrap();
        assert_eq!(to_storage(a), "2025-03-01T17:00:00.000Z");
        assert!(to_storage(a) < to_storage(b));
    }

    #[test]
    fn test_parse_bare_date() {
        let ts = parse_timestamp("2025-03-01").unwrap();
        assert_eq!(to_storage(ts), "2025-03-01T00:00:00.000Z");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("next tuesday").is_err());
        assert!(parse_date("2025-13-01").is_err());
    }
}
