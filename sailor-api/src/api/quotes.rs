//! Saved customer quotes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sailor_common::db::quotes::{self, NewQuote, QuoteFilter};
use sailor_common::time::now;
use sailor_common::SailorEvent;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: String,
}

/// POST /api/quotes
pub async fn save_quote(
    State(state): State<AppState>,
    Json(quote): Json<NewQuote>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let saved = quotes::insert_quote(&state.db, &quote).await?;
    info!(quote_number = %saved.quote_number, "Quote saved");

    state.events.emit_lossy(SailorEvent::QuoteSaved {
        quote_number: saved.quote_number.clone(),
        total: saved.total_cost.unwrap_or(0.0),
        timestamp: now(),
    });

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "quote": saved }))))
}

/// GET /api/quotes/:quote_number
///
/// The first view stamps `viewed_at`.
pub async fn get_quote(State(state): State<AppState>, Path(quote_number): Path<String>) -> ApiResult<Json<Value>> {
    let quote = quotes::get_quote(&state.db, &quote_number).await?;
    Ok(Json(json!({ "success": true, "quote": quote })))
}

/// PATCH /api/quotes/:quote_number/status
pub async fn update_quote_status(
    State(state): State<AppState>,
    Path(quote_number): Path<String>,
    Json(change): Json<StatusChange>,
) -> ApiResult<Json<Value>> {
    let quote = quotes::update_quote_status(&state.db, &quote_number, &change.status).await?;
    info!(quote_number = %quote_number, status = %quote.status, "Quote status changed");
    Ok(Json(json!({ "success": true, "quote": quote })))
}

/// GET /api/quotes (admin)
pub async fn list_quotes(State(state): State<AppState>, Query(filter): Query<QuoteFilter>) -> ApiResult<Json<Value>> {
    let quotes = quotes::list_quotes(&state.db, &filter).await?;
    Ok(Json(json!({ "success": true, "count": quotes.len(), "quotes": quotes })))
}
