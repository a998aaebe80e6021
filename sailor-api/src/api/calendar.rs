//! Customer booking flow against the calendar

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use sailor_common::db::{bookings, schedule};
use sailor_common::scheduling::{self, BusinessHours, BusyPeriod, MAX_RANGE_DAYS, MAX_SLOT_MINUTES};
use sailor_common::time::{now, parse_timestamp, to_storage};
use sailor_common::{Error, SailorEvent};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::integrations::CalendarEvent;
use crate::AppState;

/// Gap kept free around a new booking
const BOOKING_BUFFER_MINUTES: i64 = 30;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub service_duration: Option<i64>,
    pub buffer_minutes: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotCheck {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub buffer_minutes: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub service_type: Option<String>,
    pub service_type_id: Option<String>,
    pub notes: Option<String>,
}

fn parse_instant(value: &str, message: &str) -> ApiResult<DateTime<Utc>> {
    parse_timestamp(value).map_err(|_| ApiError::BadRequest(message.to_string()))
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn service_duration(minutes: i64) -> ApiResult<i64> {
    if (1..=MAX_SLOT_MINUTES).contains(&minutes) {
        Ok(minutes)
    } else {
        Err(ApiError::BadRequest(format!(
            "serviceDuration must be between 1 and {} minutes",
            MAX_SLOT_MINUTES
        )))
    }
}

/// Missing buffer means none
fn buffer_minutes(minutes: Option<i64>) -> ApiResult<i64> {
    let minutes = minutes.unwrap_or(0);
    if (0..=MAX_SLOT_MINUTES).contains(&minutes) {
        Ok(minutes)
    } else {
        Err(ApiError::BadRequest(format!(
            "bufferMinutes must be between 0 and {} minutes",
            MAX_SLOT_MINUTES
        )))
    }
}

/// Busy time from the calendar plus active blackout days
async fn busy_with_blackouts(
    state: &AppState,
    hours: &BusinessHours,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> ApiResult<Vec<BusyPeriod>> {
    let mut busy = state.calendar.busy_times(start, end).await?;

    let offset = hours.offset();
    let blackouts = schedule::active_blackouts(
        &state.db,
        start.with_timezone(&offset).date_naive(),
        end.with_timezone(&offset).date_naive(),
    )
    .await?;
    busy.extend(scheduling::blackout_periods(&blackouts, hours));

    Ok(busy)
}

/// GET /api/calendar/availability
pub async fn availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> ApiResult<Json<Value>> {
    let (Some(start), Some(end), Some(duration)) = (
        present(&query.start_date),
        present(&query.end_date),
        query.service_duration,
    ) else {
        return Err(ApiError::MissingParameters(vec!["startDate", "endDate", "serviceDuration"]));
    };

    let start = parse_instant(start, "Invalid date format")?;
    let end = parse_instant(end, "Invalid date format")?;
    if start >= end {
        return Err(ApiError::BadRequest("End date must be after start date".into()));
    }
    if end - start > Duration::days(MAX_RANGE_DAYS) {
        return Err(ApiError::BadRequest(format!(
            "Date range cannot exceed {} days",
            MAX_RANGE_DAYS
        )));
    }
    let duration = service_duration(duration)?;
    let buffer = buffer_minutes(query.buffer_minutes)?;

    let hours = schedule::load_business_hours(&state.db, &state.hours).await?;
    let busy = busy_with_blackouts(&state, &hours, start, end).await?;
    let slots = scheduling::available_slots(start, end, &hours, duration, buffer, &busy);

    Ok(Json(json!({
        "success": true,
        "totalSlots": slots.len(),
        "slots": slots,
    })))
}

/// POST /api/calendar/check-slot
pub async fn check_slot(State(state): State<AppState>, Json(check): Json<SlotCheck>) -> ApiResult<Json<Value>> {
    let (Some(start), Some(end)) = (present(&check.start_time), present(&check.end_time)) else {
        return Err(ApiError::MissingParameters(vec!["startTime", "endTime"]));
    };
    let start = parse_instant(start, "Invalid datetime format")?;
    let end = parse_instant(end, "Invalid datetime format")?;
    let buffer = buffer_minutes(check.buffer_minutes)?;

    let margin = Duration::minutes(buffer);
    let hours = schedule::load_business_hours(&state.db, &state.hours).await?;
    let busy = busy_with_blackouts(&state, &hours, start - margin, end + margin).await?;
    let available = scheduling::is_slot_available(&busy, start, end, buffer);

    Ok(Json(json!({
        "success": true,
        "available": available,
        "slot": { "start": to_storage(start), "end": to_storage(end) },
    })))
}

/// GET /api/calendar/busy
pub async fn busy_times(State(state): State<AppState>, Query(query): Query<RangeQuery>) -> ApiResult<Json<Value>> {
    let (Some(start), Some(end)) = (present(&query.start_date), present(&query.end_date)) else {
        return Err(ApiError::MissingParameters(vec!["startDate", "endDate"]));
    };
    let start = parse_instant(start, "Invalid date format")?;
    let end = parse_instant(end, "Invalid date format")?;

    let busy: Vec<Value> = state
        .calendar
        .busy_times(start, end)
        .await?
        .iter()
        .map(|b| json!({ "start": to_storage(b.start), "end": to_storage(b.end) }))
        .collect();

    Ok(Json(json!({ "success": true, "busyTimes": busy })))
}

fn event_description(service: &str, name: &str, email: &str, phone: Option<&str>, notes: Option<&str>) -> String {
    let mut description = format!(
        "Service: {}\nCustomer: {}\nEmail: {}\nPhone: {}",
        service,
        name,
        email,
        phone.unwrap_or("Not provided")
    );
    if let Some(notes) = notes {
        description.push_str(&format!("\n\nNotes: {}", notes));
    }
    description
}

/// POST /api/calendar/create-booking
///
/// Rechecks the slot with a 30 minute buffer, creates the calendar event and
/// stores the booking.
pub async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<BookingRequest>,
) -> ApiResult<Json<Value>> {
    let (Some(start), Some(end), Some(name), Some(email), Some(service)) = (
        present(&request.start_time),
        present(&request.end_time),
        present(&request.customer_name),
        present(&request.customer_email),
        present(&request.service_type),
    ) else {
        return Err(ApiError::MissingParameters(vec![
            "startTime",
            "endTime",
            "customerName",
            "customerEmail",
            "serviceType",
        ]));
    };
    let start = parse_instant(start, "Invalid datetime format")?;
    let end = parse_instant(end, "Invalid datetime format")?;
    if end <= start {
        return Err(ApiError::BadRequest("End time must be after start time".into()));
    }

    let margin = Duration::minutes(BOOKING_BUFFER_MINUTES);
    let hours = schedule::load_business_hours(&state.db, &state.hours).await?;
    let busy = busy_with_blackouts(&state, &hours, start - margin, end + margin).await?;
    if !scheduling::is_slot_available(&busy, start, end, BOOKING_BUFFER_MINUTES) {
        info!(start = %to_storage(start), "Requested slot already taken");
        return Err(ApiError::SlotTaken);
    }

    let phone = present(&request.customer_phone);
    let notes = present(&request.notes);
    let event = state
        .calendar
        .create_event(&CalendarEvent {
            summary: format!("{} - {}", service, name),
            description: event_description(service, name, email, phone, notes),
            start,
            end,
            attendees: vec![email.to_string()],
        })
        .await?;

    let booking = bookings::insert_booking(
        &state.db,
        &bookings::NewBooking {
            service_type_id: request.service_type_id.clone(),
            service_type: service.to_string(),
            start,
            end,
            customer_name: name.to_string(),
            customer_email: email.to_string(),
            customer_phone: phone.map(str::to_string),
            customer_notes: notes.map(str::to_string),
            calendar_event_id: Some(event.id.clone()),
        },
    )
    .await?;

    state.events.emit_lossy(SailorEvent::BookingCreated {
        booking_id: booking.id.clone(),
        service_type: booking.service_type.clone(),
        scheduled_date: start,
        timestamp: now(),
    });

    Ok(Json(json!({
        "success": true,
        "booking": {
            "id": booking.id,
            "startTime": booking.booking_start,
            "endTime": booking.booking_end,
            "calendarEventId": event.id,
            "calendarLink": event.html_link,
        },
        "message": "Booking created successfully",
    })))
}

/// DELETE /api/calendar/cancel-booking/:event_id
pub async fn cancel_booking(State(state): State<AppState>, Path(event_id): Path<String>) -> ApiResult<Json<Value>> {
    if event_id.trim().is_empty() {
        return Err(ApiError::BadRequest("Event ID required".into()));
    }

    match state.calendar.delete_event(&event_id).await {
        Ok(()) => {}
        // Gone from the calendar already; the stored booking still needs cancelling
        Err(Error::NotFound(message)) => info!(event_id = %event_id, "{}", message),
        Err(e) => return Err(e.into()),
    }

    match bookings::cancel_by_event(&state.db, &event_id).await? {
        Some(booking) => state.events.emit_lossy(SailorEvent::BookingUpdated {
            booking_id: booking.id,
            status: booking.status,
            timestamp: now(),
        }),
        None => warn!(event_id = %event_id, "Cancelled event had no stored booking"),
    }

    Ok(Json(json!({ "success": true, "message": "Booking cancelled successfully" })))
}

/// GET /api/calendar/health
///
/// Probes the provider with a busy-time query for the next day.
pub async fn calendar_health(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let start = now();
    state
        .calendar
        .busy_times(start, start + Duration::hours(24))
        .await
        .map_err(|e| ApiError::Upstream(format!("Calendar API health check failed: {}", e)))?;

    Ok(Json(json!({
        "success": true,
        "provider": state.calendar.name(),
        "message": "Calendar API is configured and working",
    })))
}
