//! Booking records and their audit trail

use super::models::{Booking, BookingHistory};
use crate::scheduling::BusyPeriod;
use crate::time::{now_string, parse_timestamp, to_storage};
use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

pub const BOOKING_STATUSES: [&str; 5] = ["pending", "confirmed", "completed", "cancelled", "no_show"];

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub service_type_id: Option<String>,
    pub service_type: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub customer_notes: Option<String>,
    pub calendar_event_id: Option<String>,
}

/// Admin list query
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingFilter {
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl BookingFilter {
    /// Page size actually used, 1..=500 (default 50)
    pub fn page_limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 500)
    }

    pub fn page_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Fields an admin may change; anything else in the request is ignored
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
}

impl BookingUpdate {
    fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.booking_start.is_none()
            && self.booking_end.is_none()
            && self.customer_name.is_none()
            && self.customer_email.is_none()
            && self.customer_phone.is_none()
            && self.customer_notes.is_none()
            && self.internal_notes.is_none()
            && self.cancellation_reason.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BookingStats {
    pub total: i64,
    pub today: i64,
    pub upcoming: i64,
    pub completed: i64,
}

pub async fn insert_booking(pool: &SqlitePool, booking: &NewBooking) -> Result<Booking> {
    if booking.end <= booking.start {
        return Err(Error::InvalidInput("End time must be after start time".into()));
    }

    let id = Uuid::new_v4().to_string();
    let now = now_string();
    sqlx::query(
        r#"
        INSERT INTO bookings (
            id, service_type_id, service_type, booking_start, booking_end, status,
            customer_name, customer_email, customer_phone, customer_notes,
            calendar_event_id, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, 'confirmed', ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&booking.service_type_id)
    .bind(&booking.service_type)
    .bind(to_storage(booking.start))
    .bind(to_storage(booking.end))
    .bind(&booking.customer_name)
    .bind(&booking.customer_email)
    .bind(&booking.customer_phone)
    .bind(&booking.customer_notes)
    .bind(&booking.calendar_event_id)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    info!(booking_id = %id, service = %booking.service_type, "Booking created");
    get_booking(pool, &id).await
}

pub async fn get_booking(pool: &SqlitePool, id: &str) -> Result<Booking> {
    sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Booking {} not found", id)))
}

/// Newest start first, with the unpaged total
pub async fn list_bookings(pool: &SqlitePool, filter: &BookingFilter) -> Result<(Vec<Booking>, i64)> {
    let start = filter.start_date.as_deref().map(parse_timestamp).transpose()?.map(to_storage);
    let end = filter.end_date.as_deref().map(parse_timestamp).transpose()?.map(to_storage);
    let limit = filter.page_limit();
    let offset = filter.page_offset();

    let where_clause = r#"
        WHERE (? IS NULL OR status = ?)
          AND (? IS NULL OR booking_start >= ?)
          AND (? IS NULL OR booking_start <= ?)
    "#;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM bookings {}", where_clause))
        .bind(&filter.status)
        .bind(&filter.status)
        .bind(&start)
        .bind(&start)
        .bind(&end)
        .bind(&end)
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query_as::<_, Booking>(&format!(
        "SELECT * FROM bookings {} ORDER BY booking_start DESC LIMIT ? OFFSET ?",
        where_clause
    ))
    .bind(&filter.status)
    .bind(&filter.status)
    .bind(&start)
    .bind(&start)
    .bind(&end)
    .bind(&end)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}

/// Apply an admin edit and record it in `booking_history`
pub async fn update_booking(pool: &SqlitePool, id: &str, update: &BookingUpdate) -> Result<Booking> {
    if update.is_empty() {
        return Err(Error::InvalidInput("No valid update fields provided".into()));
    }
    if let Some(status) = &update.status {
        if !BOOKING_STATUSES.contains(&status.as_str()) {
            return Err(Error::InvalidInput(format!("Invalid booking status: {}", status)));
        }
    }
    let start = update.booking_start.as_deref().map(parse_timestamp).transpose()?.map(to_storage);
    let end = update.booking_end.as_deref().map(parse_timestamp).transpose()?.map(to_storage);

    let now = now_string();
    let cancelled_at = (update.status.as_deref() == Some("cancelled")).then(|| now.clone());

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE bookings SET
            status = COALESCE(?, status),
            booking_start = COALESCE(?, booking_start),
            booking_end = COALESCE(?, booking_end),
            customer_name = COALESCE(?, customer_name),
            customer_email = COALESCE(?, customer_email),
            customer_phone = COALESCE(?, customer_phone),
            customer_notes = COALESCE(?, customer_notes),
            internal_notes = COALESCE(?, internal_notes),
            cancellation_reason = COALESCE(?, cancellation_reason),
            cancelled_at = COALESCE(?, cancelled_at),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&update.status)
    .bind(&start)
    .bind(&end)
    .bind(&update.customer_name)
    .bind(&update.customer_email)
    .bind(&update.customer_phone)
    .bind(&update.customer_notes)
    .bind(&update.internal_notes)
    .bind(&update.cancellation_reason)
    .bind(&cancelled_at)
    .bind(&now)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Booking {} not found", id)));
    }

    let new_values = serde_json::to_string(update)
        .map_err(|e| Error::Internal(format!("Failed to encode booking change: {}", e)))?;
    sqlx::query(
        r#"
        INSERT INTO booking_history (id, booking_id, changed_by, change_type, new_values, created_at)
        VALUES (?, ?, 'admin', 'updated', ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(id)
    .bind(&new_values)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(booking_id = %id, changes = %new_values, "Booking updated");
    get_booking(pool, id).await
}

pub async fn booking_history(pool: &SqlitePool, booking_id: &str) -> Result<Vec<BookingHistory>> {
    let rows = sqlx::query_as::<_, BookingHistory>(
        "SELECT * FROM booking_history WHERE booking_id = ? ORDER BY created_at",
    )
    .bind(booking_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Dashboard counters relative to `now`
///
/// `today` covers the start of the current UTC day through the next 24 hours.
pub async fn booking_stats(pool: &SqlitePool, now: DateTime<Utc>) -> Result<BookingStats> {
    let day_start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|d| d.and_utc())
        .unwrap_or(now);
    let tomorrow = now + Duration::hours(24);

    let (total, today, upcoming, completed): (i64, i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*),
            COALESCE(SUM(CASE WHEN booking_start >= ? AND booking_start < ? THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN booking_start >= ? AND status IN ('pending', 'confirmed') THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0)
        FROM bookings
        "#,
    )
    .bind(to_storage(day_start))
    .bind(to_storage(tomorrow))
    .bind(to_storage(now))
    .fetch_one(pool)
    .await?;

    Ok(BookingStats {
        total,
        today,
        upcoming,
        completed,
    })
}

/// Non-cancelled bookings intersecting [from, to]
pub async fn busy_periods(
    pool: &SqlitePool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<BusyPeriod>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT booking_start, booking_end FROM bookings
        WHERE status NOT IN ('cancelled', 'no_show')
          AND booking_start < ? AND booking_end > ?
        ORDER BY booking_start
        "#,
    )
    .bind(to_storage(to))
    .bind(to_storage(from))
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|(start, end)| {
            Ok(BusyPeriod {
                start: parse_timestamp(start)?,
                end: parse_timestamp(end)?,
            })
        })
        .collect()
}

/// Cancel the booking attached to a calendar event
///
/// Returns `None` when no booking carries that event id, e.g. events made
/// directly on the calendar.
pub async fn cancel_by_event(pool: &SqlitePool, event_id: &str) -> Result<Option<Booking>> {
    let id: Option<String> = sqlx::query_scalar("SELECT id FROM bookings WHERE calendar_event_id = ?")
        .bind(event_id)
        .fetch_optional(pool)
        .await?;
    let Some(id) = id else {
        return Ok(None);
    };

    let now = now_string();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE bookings SET
            status = 'cancelled',
            cancelled_at = COALESCE(cancelled_at, ?),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&now)
    .bind(&now)
    .bind(&id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO booking_history (id, booking_id, changed_by, change_type, new_values, created_at)
        VALUES (?, ?, 'customer', 'cancelled', '{"status":"cancelled"}', ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&id)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(booking_id = %id, event_id, "Booking cancelled");
    get_booking(pool, &id).await.map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_memory_database;

    fn booking_at(start: &str, minutes: i64) -> NewBooking {
        let start = parse_timestamp(start).unwrap();
        NewBooking {
            service_type_id: None,
            service_type: "Diving Service Quote".into(),
            start,
            end: start + Duration::minutes(minutes),
            customer_name: "Pat Mariner".into(),
            customer_email: "pat@example.com".into(),
            customer_phone: None,
            customer_notes: None,
            calendar_event_id: Some("evt-1".into()),
        }
    }

    #[tokio::test]
    async fn test_insert_and_busy_periods() {
        let pool = init_memory_database().await.unwrap();
        let booking = insert_booking(&pool, &booking_at("2025-06-02T17:00:00Z", 60)).await.unwrap();
        assert_eq!(booking.status, "confirmed");
        assert_eq!(booking.booking_start, "2025-06-02T17:00:00.000Z");

        let busy = busy_periods(
            &pool,
            parse_timestamp("2025-06-02").unwrap(),
            parse_timestamp("2025-06-03").unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(busy.len(), 1);

        update_booking(
            &pool,
            &booking.id,
            &BookingUpdate {
                status: Some("cancelled".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let busy = busy_periods(
            &pool,
            parse_timestamp("2025-06-02").unwrap(),
            parse_timestamp("2025-06-03").unwrap(),
        )
        .await
        .unwrap();
        assert!(busy.is_empty());
    }

    #[tokio::test]
    async fn test_update_records_history_and_cancellation() {
        let pool = init_memory_database().await.unwrap();
        let booking = insert_booking(&pool, &booking_at("2025-06-02T17:00:00Z", 60)).await.unwrap();

        let updated = update_booking(
            &pool,
            &booking.id,
            &BookingUpdate {
                status: Some("cancelled".into()),
                cancellation_reason: Some("Weather".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.status, "cancelled");
        assert!(updated.cancelled_at.is_some());
        assert_eq!(updated.cancellation_reason.as_deref(), Some("Weather"));

        let history = booking_history(&pool, &booking.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].changed_by, "admin");
        let values: serde_json::Value = serde_json::from_str(&history[0].new_values).unwrap();
        assert_eq!(values["status"], "cancelled");
        assert!(values.get("customer_name").is_none());
    }

    #[tokio::test]
    async fn test_update_rejects_empty_and_unknown() {
        let pool = init_memory_database().await.unwrap();
        let booking = insert_booking(&pool, &booking_at("2025-06-02T17:00:00Z", 60)).await.unwrap();

        let empty = update_booking(&pool, &booking.id, &BookingUpdate::default()).await;
        assert!(matches!(empty, Err(Error::InvalidInput(m)) if m == "No valid update fields provided"));

        let bad_status = BookingUpdate {
            status: Some("teleported".into()),
            ..Default::default()
        };
        assert!(update_booking(&pool, &booking.id, &bad_status).await.is_err());

        let note = BookingUpdate {
            internal_notes: Some("gate code 1234".into()),
            ..Default::default()
        };
        assert!(matches!(
            update_booking(&pool, "missing", &note).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_pages_newest_first() {
        let pool = init_memory_database().await.unwrap();
        for day in ["2025-06-02", "2025-06-03", "2025-06-04"] {
            insert_booking(&pool, &booking_at(&format!("{}T17:00:00Z", day), 60))
                .await
                .unwrap();
        }

        let (rows, total) = list_bookings(
            &pool,
            &BookingFilter {
                limit: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(total, 3);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].booking_start.starts_with("2025-06-04"));

        let (rows, total) = list_bookings(
            &pool,
            &BookingFilter {
                start_date: Some("2025-06-03".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(total, 2);
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_stats() {
        let pool = init_memory_database().await.unwrap();
        let now = parse_timestamp("2025-06-02T12:00:00Z").unwrap();

        insert_booking(&pool, &booking_at("2025-06-02T09:00:00Z", 60)).await.unwrap();
        insert_booking(&pool, &booking_at("2025-06-02T17:00:00Z", 60)).await.unwrap();
        let done = insert_booking(&pool, &booking_at("2025-05-01T17:00:00Z", 60)).await.unwrap();
        update_booking(
            &pool,
            &done.id,
            &BookingUpdate {
                status: Some("completed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let stats = booking_stats(&pool, now).await.unwrap();
        assert_eq!(
            stats,
            BookingStats {
                total: 3,
                today: 2,
                upcoming: 1,
                completed: 1
            }
        );
    }

    #[tokio::test]
    async fn test_cancel_by_event() {
        let pool = init_memory_database().await.unwrap();
        let booking = insert_booking(&pool, &booking_at("2025-06-02T17:00:00Z", 60)).await.unwrap();

        let cancelled = cancel_by_event(&pool, "evt-1").await.unwrap().unwrap();
        assert_eq!(cancelled.id, booking.id);
        assert_eq!(cancelled.status, "cancelled");
        assert!(cancelled.cancelled_at.is_some());

        let history = booking_history(&pool, &booking.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].changed_by, "customer");

        assert!(cancel_by_event(&pool, "unknown").await.unwrap().is_none());
    }
}
