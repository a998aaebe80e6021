//! Charge a customer's saved card for completed service

use axum::{extract::State, http::HeaderMap, Json};
use sailor_common::api::admin_email_allowed;
use sailor_common::db::orders::{self, OrderCompletion};
use sailor_common::time::now;
use sailor_common::SailorEvent;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::auth::admin_email;
use crate::error::{ApiError, ApiResult};
use crate::integrations::OffSessionCharge;
use crate::AppState;

const MAX_NOTES_CHARS: usize = 2000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeForService {
    pub order_id: Option<String>,
    pub final_amount: Option<f64>,
    pub notes: Option<String>,
}

/// Strip angle brackets, trim and cap the length
pub fn sanitize_notes(notes: &str) -> String {
    let stripped: String = notes.chars().filter(|c| *c != '<' && *c != '>').collect();
    stripped.trim().chars().take(MAX_NOTES_CHARS).collect()
}

/// Dollars to whole cents
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// POST /api/admin/charge
///
/// Charges the order's customer off-session for the final (or estimated)
/// amount, then completes the order and advances their service schedule.
pub async fn charge_for_service(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChargeForService>,
) -> ApiResult<Json<Value>> {
    admin_email_allowed(&state.admin_emails, admin_email(&headers))?;

    let order_id = request
        .order_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(ApiError::MissingParameters(vec!["orderId"]))?;

    let notes = request
        .notes
        .as_deref()
        .map(sanitize_notes)
        .filter(|n| !n.is_empty());

    let order = orders::get_order(&state.db, order_id).await?;

    let customer_id = order
        .stripe_customer_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Customer has no payment method on file".into()))?;

    let payment_method = state
        .payments
        .default_payment_method(customer_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Customer has no default payment method".into()))?;

    let amount = request
        .final_amount
        .or(order.estimated_amount)
        .filter(|a| *a > 0.0)
        .ok_or_else(|| ApiError::BadRequest("No amount to charge".into()))?;
    let amount_cents = to_cents(amount);

    let intent = state
        .payments
        .charge_off_session(&OffSessionCharge {
            customer_id: customer_id.to_string(),
            payment_method,
            amount_cents,
            currency: "usd".to_string(),
            description: format!("{} - Order {}", order.service_type, order.order_number),
            metadata: vec![
                ("order_id".to_string(), order.id.clone()),
                ("order_number".to_string(), order.order_number.clone()),
                ("service_type".to_string(), order.service_type.clone()),
            ],
        })
        .await?;

    orders::complete_order(
        &state.db,
        &order,
        &OrderCompletion {
            amount,
            notes,
            payment_intent_id: intent.id.clone(),
        },
    )
    .await?;

    info!(
        order_id = %order.id,
        payment_intent = %intent.id,
        amount_cents,
        "Service charged"
    );

    state.events.emit_lossy(SailorEvent::PaymentCaptured {
        order_id: order.id.clone(),
        payment_intent_id: intent.id.clone(),
        amount_cents,
        timestamp: now(),
    });

    Ok(Json(json!({
        "success": true,
        "paymentIntentId": intent.id,
        "amountCharged": amount,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_notes() {
        assert_eq!(sanitize_notes("  <b>Heavy</b> growth  "), "bHeavy/b growth");
        assert_eq!(sanitize_notes(&"x".repeat(2500)).len(), 2000);
        assert_eq!(sanitize_notes("   "), "");
    }

    #[test]
    fn test_to_cents_rounds() {
        assert_eq!(to_cents(199.5), 19950);
        assert_eq!(to_cents(19.99), 1999);
        assert_eq!(to_cents(180.0), 18000);
        assert_eq!(to_cents(0.1 + 0.2), 30);
    }
}
