//! Admin booking management and booking configuration

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sailor_common::db::bookings::{self, BookingFilter, BookingUpdate};
use sailor_common::db::schedule::{self, BusinessHoursUpdate, NewBlackout, ServiceTypeUpdate};
use sailor_common::time::now;
use sailor_common::SailorEvent;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::AppState;

/// GET /api/admin/bookings
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(filter): Query<BookingFilter>,
) -> ApiResult<Json<Value>> {
    let (rows, total) = bookings::list_bookings(&state.db, &filter).await?;
    Ok(Json(json!({
        "success": true,
        "bookings": rows,
        "total": total,
        "limit": filter.page_limit(),
        "offset": filter.page_offset(),
    })))
}

/// GET /api/admin/bookings/:id
///
/// Includes the change history.
pub async fn get_booking(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let booking = bookings::get_booking(&state.db, &id).await?;
    let history = bookings::booking_history(&state.db, &id).await?;
    Ok(Json(json!({ "success": true, "booking": booking, "history": history })))
}

/// PATCH /api/admin/bookings/:id
pub async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<BookingUpdate>,
) -> ApiResult<Json<Value>> {
    let booking = bookings::update_booking(&state.db, &id, &update).await?;

    state.events.emit_lossy(SailorEvent::BookingUpdated {
        booking_id: booking.id.clone(),
        status: booking.status.clone(),
        timestamp: now(),
    });

    Ok(Json(json!({ "success": true, "booking": booking })))
}

/// GET /api/admin/bookings/stats/summary
pub async fn booking_stats(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let stats = bookings::booking_stats(&state.db, now()).await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

/// GET /api/admin/service-types
pub async fn list_service_types(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let types = schedule::list_service_types(&state.db, false).await?;
    Ok(Json(json!({ "success": true, "serviceTypes": types })))
}

/// PATCH /api/admin/service-types/:id
pub async fn update_service_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ServiceTypeUpdate>,
) -> ApiResult<Json<Value>> {
    let service_type = schedule::update_service_type(&state.db, &id, &update).await?;
    Ok(Json(json!({ "success": true, "serviceType": service_type })))
}

/// GET /api/admin/business-hours
pub async fn list_business_hours(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let hours = schedule::list_business_hours(&state.db).await?;
    Ok(Json(json!({ "success": true, "businessHours": hours })))
}

/// PATCH /api/admin/business-hours/:id
pub async fn update_business_hours(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<BusinessHoursUpdate>,
) -> ApiResult<Json<Value>> {
    let row = schedule::update_business_hours(&state.db, &id, &update).await?;
    Ok(Json(json!({ "success": true, "businessHour": row })))
}

/// GET /api/admin/blackout-dates
pub async fn list_blackout_dates(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let dates = schedule::list_blackout_dates(&state.db).await?;
    Ok(Json(json!({ "success": true, "blackoutDates": dates })))
}

/// POST /api/admin/blackout-dates
pub async fn create_blackout_date(
    State(state): State<AppState>,
    Json(blackout): Json<NewBlackout>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let created = schedule::insert_blackout(&state.db, &blackout).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "blackoutDate": created }))))
}

/// DELETE /api/admin/blackout-dates/:id
pub async fn delete_blackout_date(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    schedule::delete_blackout(&state.db, &id).await?;
    Ok(Json(json!({ "success": true })))
}
