//! Service catalog and cost estimates

use axum::Json;
use sailor_common::pricing::catalog::DISPLAY_ORDER;
use sailor_common::pricing::{
    admin_charge, calculate_service_cost, format_breakdown, AdminChargeInput, EstimateRequest,
};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};

/// GET /api/services
///
/// Services in the order customers see them; `null` marks a separator.
pub async fn list_services() -> Json<Value> {
    let services: Vec<Value> = DISPLAY_ORDER
        .iter()
        .map(|slot| match slot {
            Some(key) => json!(key.definition()),
            None => Value::Null,
        })
        .collect();

    Json(json!({ "success": true, "services": services }))
}

/// POST /api/estimate
pub async fn estimate(Json(request): Json<EstimateRequest>) -> ApiResult<Json<Value>> {
    let estimate = calculate_service_cost(&request).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    // Observed conditions make it a charge rather than an estimate
    let is_estimate = request.actual_paint_condition.is_none() || request.actual_growth_level.is_none();
    let summary = format_breakdown(&estimate.breakdown, is_estimate);

    Ok(Json(json!({
        "success": true,
        "estimate": estimate,
        "summary": summary,
    })))
}

/// POST /api/admin/charge/calculate
///
/// Post-dive price from observed conditions. Nothing is charged.
pub async fn calculate_admin_charge(Json(input): Json<AdminChargeInput>) -> ApiResult<Json<Value>> {
    let charge = admin_charge(&input).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(Json(json!({ "success": true, "charge": charge })))
}
