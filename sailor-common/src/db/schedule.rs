//! Booking configuration: service types, business hours and blackout dates

use super::models::{BlackoutDate, BusinessHoursRow, ServiceType};
use crate::scheduling::{BusinessHours, DayHours};
use crate::time::now_string;
use crate::{Error, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

/// Editable service type fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceTypeUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: Option<i64>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub is_active: Option<bool>,
    pub display_order: Option<i64>,
}

impl ServiceTypeUpdate {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.duration_minutes.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.is_active.is_none()
            && self.display_order.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BusinessHoursUpdate {
    pub open_time: Option<String>,
    pub close_time: Option<String>,
    pub is_open: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBlackout {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub reason: Option<String>,
    pub all_day: Option<bool>,
}

/// All service types; `active_only` hides retired ones from the public list
pub async fn list_service_types(pool: &SqlitePool, active_only: bool) -> Result<Vec<ServiceType>> {
    let rows = sqlx::query_as::<_, ServiceType>(
        "SELECT * FROM service_types WHERE (? = 0 OR is_active = 1) ORDER BY display_order",
    )
    .bind(active_only)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_service_type(pool: &SqlitePool, id: &str) -> Result<ServiceType> {
    sqlx::query_as::<_, ServiceType>("SELECT * FROM service_types WHERE id = ? OR slug = ?")
        .bind(id)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Service type {} not found", id)))
}

pub async fn update_service_type(
    pool: &SqlitePool,
    id: &str,
    update: &ServiceTypeUpdate,
) -> Result<ServiceType> {
    if update.is_empty() {
        return Err(Error::InvalidInput("No valid update fields provided".into()));
    }
    if matches!(update.duration_minutes, Some(m) if m <= 0) {
        return Err(Error::InvalidInput("duration_minutes must be positive".into()));
    }

    let result = sqlx::query(
        r#"
        UPDATE service_types SET
            name = COALESCE(?, name),
            description = COALESCE(?, description),
            duration_minutes = COALESCE(?, duration_minutes),
            category = COALESCE(?, category),
            price = COALESCE(?, price),
            is_active = COALESCE(?, is_active),
            display_order = COALESCE(?, display_order)
        WHERE id = ?
        "#,
    )
    .bind(&update.name)
    .bind(&update.description)
    .bind(update.duration_minutes)
    .bind(&update.category)
    .bind(update.price)
    .bind(update.is_active)
    .bind(update.display_order)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Service type {} not found", id)));
    }
    get_service_type(pool, id).await
}

pub async fn list_business_hours(pool: &SqlitePool) -> Result<Vec<BusinessHoursRow>> {
    let rows = sqlx::query_as::<_, BusinessHoursRow>("SELECT * FROM business_hours ORDER BY day_of_week")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

fn parse_clock(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| Error::InvalidInput(format!("Invalid time '{}', expected HH:MM", value)))
}

pub async fn update_business_hours(
    pool: &SqlitePool,
    id: &str,
    update: &BusinessHoursUpdate,
) -> Result<BusinessHoursRow> {
    if update.open_time.is_none() && update.close_time.is_none() && update.is_open.is_none() {
        return Err(Error::InvalidInput("No valid update fields provided".into()));
    }

    let current = sqlx::query_as::<_, BusinessHoursRow>("SELECT * FROM business_hours WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Business hours {} not found", id)))?;

    let open = update.open_time.clone().unwrap_or(current.open_time);
    let close = update.close_time.clone().unwrap_or(current.close_time);
    if parse_clock(&open)? >= parse_clock(&close)? {
        return Err(Error::InvalidInput("close_time must be after open_time".into()));
    }

    sqlx::query("UPDATE business_hours SET open_time = ?, close_time = ?, is_open = ? WHERE id = ?")
        .bind(&open)
        .bind(&close)
        .bind(update.is_open.unwrap_or(current.is_open))
        .bind(id)
        .execute(pool)
        .await?;

    let row = sqlx::query_as::<_, BusinessHoursRow>("SELECT * FROM business_hours WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

/// Opening hours from the table, in the given UTC offset
///
/// Falls back to `fallback` when no day is open, so a misconfigured table
/// does not silently close the business.
pub async fn load_business_hours(pool: &SqlitePool, fallback: &BusinessHours) -> Result<BusinessHours> {
    let rows = list_business_hours(pool).await?;

    let mut per_day = Vec::new();
    for row in rows.iter().filter(|r| r.is_open) {
        per_day.push(DayHours {
            day_of_week: row.day_of_week as u32,
            open: parse_clock(&row.open_time)?,
            close: parse_clock(&row.close_time)?,
        });
    }

    if per_day.is_empty() {
        return Ok(fallback.clone());
    }

    Ok(BusinessHours {
        days_of_week: per_day.iter().map(|d| d.day_of_week).collect(),
        per_day,
        ..fallback.clone()
    })
}

pub async fn list_blackout_dates(pool: &SqlitePool) -> Result<Vec<BlackoutDate>> {
    let rows = sqlx::query_as::<_, BlackoutDate>("SELECT * FROM blackout_dates ORDER BY start_date DESC")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn insert_blackout(pool: &SqlitePool, blackout: &NewBlackout) -> Result<BlackoutDate> {
    let (Some(start), Some(end)) = (&blackout.start_date, &blackout.end_date) else {
        return Err(Error::InvalidInput("start_date and end_date are required".into()));
    };
    let start_date = crate::time::parse_date(start)?;
    let end_date = crate::time::parse_date(end)?;
    if end_date < start_date {
        return Err(Error::InvalidInput("end_date must not be before start_date".into()));
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO blackout_dates (id, start_date, end_date, reason, all_day, active, created_at)
        VALUES (?, ?, ?, ?, ?, 1, ?)
        "#,
    )
    .bind(&id)
    .bind(start_date.to_string())
    .bind(end_date.to_string())
    .bind(&blackout.reason)
    .bind(blackout.all_day.unwrap_or(true))
    .bind(now_string())
    .execute(pool)
    .await?;

    info!(%start_date, %end_date, "Blackout added");

    let row = sqlx::query_as::<_, BlackoutDate>("SELECT * FROM blackout_dates WHERE id = ?")
        .bind(&id)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

pub async fn delete_blackout(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM blackout_dates WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Blackout date {} not found", id)));
    }
    Ok(())
}

/// Active blackout ranges touching [from, to]
pub async fn active_blackouts(
    pool: &SqlitePool,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<(NaiveDate, NaiveDate)>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT start_date, end_date FROM blackout_dates
        WHERE active = 1 AND start_date <= ? AND end_date >= ?
        "#,
    )
    .bind(to.to_string())
    .bind(from.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|(start, end)| Ok((crate::time::parse_date(start)?, crate::time::parse_date(end)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_memory_database;

    #[tokio::test]
    async fn test_service_types_ordered_and_patchable() {
        let pool = init_memory_database().await.unwrap();
        let types = list_service_types(&pool, false).await.unwrap();
        assert_eq!(types[0].slug, "free-consultation");

        let updated = update_service_type(
            &pool,
            &types[0].id,
            &ServiceTypeUpdate {
                is_active: Some(false),
                price: Some(0.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.name, "Free Consultation");

        assert_eq!(list_service_types(&pool, true).await.unwrap().len(), 6);

        let err = update_service_type(&pool, &types[0].id, &ServiceTypeUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_business_hours_feed_scheduling() {
        let pool = init_memory_database().await.unwrap();
        let rows = list_business_hours(&pool).await.unwrap();
        let saturday = rows.iter().find(|r| r.day_of_week == 6).unwrap();

        update_business_hours(
            &pool,
            &saturday.id,
            &BusinessHoursUpdate {
                close_time: Some("12:00".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let hours = load_business_hours(&pool, &BusinessHours::default()).await.unwrap();
        let sat = NaiveDate::from_ymd_opt(2025, 6, 7).unwrap();
        let sun = NaiveDate::from_ymd_opt(2025, 6, 8).unwrap();
        assert_eq!(
            hours.window(sat),
            Some((
                NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(12, 0, 0).unwrap()
            ))
        );
        assert!(hours.window(sun).is_none());

        let bad = update_business_hours(
            &pool,
            &saturday.id,
            &BusinessHoursUpdate {
                open_time: Some("13:00".into()),
                ..Default::default()
            },
        )
        .await;
        assert!(bad.is_err());
    }

    #[tokio::test]
    async fn test_blackout_lifecycle() {
        let pool = init_memory_database().await.unwrap();

        let missing = insert_blackout(
            &pool,
            &NewBlackout {
                start_date: Some("2025-07-04".into()),
                end_date: None,
                reason: None,
                all_day: None,
            },
        )
        .await;
        assert!(matches!(missing, Err(Error::InvalidInput(_))));

        let created = insert_blackout(
            &pool,
            &NewBlackout {
                start_date: Some("2025-07-03".into()),
                end_date: Some("2025-07-05".into()),
                reason: Some("Holiday".into()),
                all_day: None,
            },
        )
        .await
        .unwrap();
        assert!(created.all_day);
        assert!(created.active);

        let july = |d| NaiveDate::from_ymd_opt(2025, 7, d).unwrap();
        let ranges = active_blackouts(&pool, july(1), july(4)).await.unwrap();
        assert_eq!(ranges, vec![(july(3), july(5))]);
        assert!(active_blackouts(&pool, july(6), july(9)).await.unwrap().is_empty());

        delete_blackout(&pool, &created.id).await.unwrap();
        assert!(list_blackout_dates(&pool).await.unwrap().is_empty());
        assert!(matches!(
            delete_blackout(&pool, &created.id).await,
            Err(Error::NotFound(_))
        ));
    }
}
