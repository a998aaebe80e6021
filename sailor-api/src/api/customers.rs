//! Billing customers: search, create, save a card and charge it
//!
//! Backs the admin billing page. Charges here are ad hoc, keyed by the
//! payment customer rather than a service order.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use chrono::NaiveDate;
use sailor_common::api::admin_email_allowed;
use sailor_common::time::now;
use sailor_common::SailorEvent;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::auth::admin_email;
use crate::error::{ApiError, ApiResult};
use crate::integrations::{NewPaymentCustomer, OffSessionCharge, PaymentCustomer, SavedCard};
use crate::AppState;

const DEFAULT_SEARCH_LIMIT: usize = 10;
const MAX_SEARCH_LIMIT: usize = 100;

/// Customer metadata a service charge copies onto the customer record
const PROFILE_KEYS: [&str; 7] = [
    "boat_name",
    "boat_length",
    "boat_type",
    "hull_type",
    "paint_condition",
    "growth_level",
    "engine_type",
];

#[derive(Debug, Deserialize)]
pub struct CustomerSearch {
    pub search: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCustomer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupIntentRequest {
    pub customer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachPaymentMethod {
    pub customer_id: Option<String>,
    pub payment_method_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeCustomer {
    pub customer_id: Option<String>,
    /// Cents
    pub amount: Option<i64>,
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Metadata values as the strings the payment provider stores
///
/// Strings pass through, numbers and booleans are formatted, and nulls or
/// blanks are dropped.
pub fn metadata_pairs(metadata: &BTreeMap<String, Value>) -> Vec<(String, String)> {
    metadata
        .iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            (!text.is_empty()).then(|| (key.clone(), text))
        })
        .collect()
}

/// Customer profile updates carried by a service charge
///
/// Boat and condition fields are copied as given. A `service_name` becomes
/// `last_service`, dated by `service_date` or `today`.
pub fn profile_updates(metadata: &[(String, String)], today: NaiveDate) -> Vec<(String, String)> {
    let lookup = |key: &str| metadata.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone());

    let mut updates: Vec<(String, String)> = PROFILE_KEYS
        .iter()
        .filter_map(|key| lookup(key).map(|v| (key.to_string(), v)))
        .collect();

    if let Some(service) = lookup("service_name") {
        updates.push(("last_service".to_string(), service));
        let date = lookup("service_date").unwrap_or_else(|| today.format("%Y-%m-%d").to_string());
        updates.push(("last_service_date".to_string(), date));
    }
    updates
}

/// Name shown in the customer picker
///
/// The card's billing name wins when it has more words than the customer
/// name (it usually carries the surname) or when the customer has no name.
pub fn display_name(customer_name: &str, billing_name: &str) -> String {
    let words = |s: &str| s.split_whitespace().count();
    let chosen = if !billing_name.is_empty() && words(billing_name) > words(customer_name) {
        billing_name
    } else if customer_name.is_empty() {
        billing_name
    } else {
        customer_name
    };
    if chosen.is_empty() {
        "Unknown".to_string()
    } else {
        chosen.to_string()
    }
}

/// Whether a customer matches the picker's search text
///
/// Every term must appear in one field group (name or email, billing name,
/// boat name), or the whole phrase must appear in any single field.
pub fn matches_search(search: &str, customer: &PaymentCustomer, card: Option<&SavedCard>) -> bool {
    let phrase = search.trim().to_lowercase();
    if phrase.is_empty() {
        return true;
    }
    let terms: Vec<&str> = phrase.split_whitespace().collect();

    let name = customer.name.as_deref().unwrap_or_default().to_lowercase();
    let email = customer.email.as_deref().unwrap_or_default().to_lowercase();
    let billing = card
        .and_then(|c| c.billing_name.as_deref())
        .unwrap_or_default()
        .to_lowercase();
    let boat = customer
        .metadata
        .get("boat_name")
        .map(String::as_str)
        .unwrap_or_default()
        .to_lowercase();

    let customer_match = terms.iter().all(|t| name.contains(t) || email.contains(t));
    let billing_match = terms.iter().all(|t| billing.contains(t));
    let boat_match = terms.iter().all(|t| boat.contains(t));

    customer_match
        || billing_match
        || boat_match
        || [&name, &email, &billing, &boat].iter().any(|f| f.contains(&phrase))
}

/// GET /api/stripe-customers
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<CustomerSearch>,
) -> ApiResult<Json<Value>> {
    let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).clamp(1, MAX_SEARCH_LIMIT);
    let search = non_empty(query.search.as_deref());

    let candidates = state.payments.find_customers(search, limit).await?;

    let mut customers = Vec::new();
    for customer in candidates {
        let card = state.payments.card_on_file(&customer.id).await?;

        if let Some(term) = search {
            if !matches_search(term, &customer, card.as_ref()) {
                continue;
            }
        }

        let billing_name = card.as_ref().and_then(|c| c.billing_name.as_deref()).unwrap_or_default();
        customers.push(json!({
            "id": customer.id,
            "name": display_name(customer.name.as_deref().unwrap_or_default(), billing_name),
            "email": customer.email,
            "boat_name": customer.metadata.get("boat_name").filter(|b| !b.is_empty()),
            "payment_method": card,
            "created": customer.created,
        }));

        if customers.len() >= limit {
            break;
        }
    }

    Ok(Json(json!({ "customers": customers })))
}

/// POST /api/create-customer
pub async fn create_customer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateCustomer>,
) -> ApiResult<Json<Value>> {
    admin_email_allowed(&state.admin_emails, admin_email(&headers))?;

    let (Some(name), Some(email)) = (non_empty(request.name.as_deref()), non_empty(request.email.as_deref())) else {
        return Err(ApiError::MissingParameters(vec!["name", "email"]));
    };

    let customer = state
        .payments
        .create_customer(&NewPaymentCustomer {
            name: name.to_string(),
            email: email.to_string(),
            phone: non_empty(request.phone.as_deref()).map(str::to_string),
            description: non_empty(request.description.as_deref()).map(str::to_string),
            metadata: metadata_pairs(&request.metadata),
        })
        .await?;

    Ok(Json(json!({
        "success": true,
        "customer": {
            "id": customer.id,
            "name": customer.name,
            "email": customer.email,
            "metadata": customer.metadata,
        },
    })))
}

/// POST /api/create-setup-intent
pub async fn create_setup_intent(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SetupIntentRequest>,
) -> ApiResult<Json<Value>> {
    admin_email_allowed(&state.admin_emails, admin_email(&headers))?;

    let customer_id = non_empty(request.customer_id.as_deref()).ok_or(ApiError::MissingParameters(vec!["customerId"]))?;
    let intent = state.payments.create_setup_intent(customer_id).await?;

    Ok(Json(json!({
        "clientSecret": intent.client_secret,
        "setupIntentId": intent.id,
    })))
}

/// POST /api/attach-payment-method
pub async fn attach_payment_method(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AttachPaymentMethod>,
) -> ApiResult<Json<Value>> {
    admin_email_allowed(&state.admin_emails, admin_email(&headers))?;

    let (Some(customer_id), Some(payment_method_id)) = (
        non_empty(request.customer_id.as_deref()),
        non_empty(request.payment_method_id.as_deref()),
    ) else {
        return Err(ApiError::MissingParameters(vec!["customerId", "paymentMethodId"]));
    };

    state.payments.attach_payment_method(customer_id, payment_method_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Payment method added successfully",
    })))
}

#[derive(Debug, Clone, Copy)]
enum ChargePurpose {
    Service,
    AnodeReplacement,
}

impl ChargePurpose {
    fn as_str(&self) -> &'static str {
        match self {
            ChargePurpose::Service => "service",
            ChargePurpose::AnodeReplacement => "anode_replacement",
        }
    }

    fn default_description(&self) -> &'static str {
        match self {
            ChargePurpose::Service => "Diving service",
            ChargePurpose::AnodeReplacement => "Anode Replacement",
        }
    }

    fn missing_card_message(&self) -> &'static str {
        match self {
            ChargePurpose::Service => "Customer has no payment method on file",
            ChargePurpose::AnodeReplacement => "No payment method found for customer",
        }
    }
}

async fn charge(state: &AppState, headers: &HeaderMap, request: ChargeCustomer, purpose: ChargePurpose) -> ApiResult<Json<Value>> {
    admin_email_allowed(&state.admin_emails, admin_email(headers))?;

    let (Some(customer_id), Some(amount_cents)) = (non_empty(request.customer_id.as_deref()), request.amount) else {
        return Err(ApiError::MissingParameters(vec!["customerId", "amount"]));
    };
    if amount_cents <= 0 {
        return Err(ApiError::BadRequest("amount must be a positive number of cents".into()));
    }

    let card = state
        .payments
        .card_on_file(customer_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest(purpose.missing_card_message().into()))?;

    let mut metadata = metadata_pairs(&request.metadata);
    match purpose {
        ChargePurpose::Service => {
            let updates = profile_updates(&metadata, now().date_naive());
            if !updates.is_empty() {
                // The charge goes ahead even when the profile cannot be saved
                if let Err(e) = state.payments.update_customer_metadata(customer_id, &updates).await {
                    warn!(customer_id, error = %e, "Failed to update customer metadata");
                }
            }
        }
        ChargePurpose::AnodeReplacement => {
            if !metadata.iter().any(|(k, _)| k == "type") {
                metadata.insert(0, ("type".to_string(), purpose.as_str().to_string()));
            }
        }
    }

    let description = non_empty(request.description.as_deref())
        .unwrap_or(purpose.default_description())
        .to_string();

    let intent = state
        .payments
        .charge_off_session(&OffSessionCharge {
            customer_id: customer_id.to_string(),
            payment_method: card.id,
            amount_cents,
            currency: "usd".to_string(),
            description,
            metadata,
        })
        .await?;

    if intent.status != "succeeded" {
        warn!(customer_id, payment_intent = %intent.id, status = %intent.status, "Charge did not succeed");
        return Ok(Json(json!({
            "success": false,
            "error": format!("Payment status: {}", intent.status),
        })));
    }

    info!(
        customer_id,
        payment_intent = %intent.id,
        amount_cents = intent.amount,
        purpose = purpose.as_str(),
        "Customer charged"
    );

    state.events.emit_lossy(SailorEvent::CustomerCharged {
        customer_id: customer_id.to_string(),
        payment_intent_id: intent.id.clone(),
        amount_cents: intent.amount,
        purpose: purpose.as_str().to_string(),
        timestamp: now(),
    });

    Ok(Json(json!({
        "success": true,
        "paymentIntent": {
            "id": intent.id,
            "amount": intent.amount,
            "status": intent.status,
        },
    })))
}

/// POST /api/charge-customer
pub async fn charge_customer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChargeCustomer>,
) -> ApiResult<Json<Value>> {
    charge(&state, &headers, request, ChargePurpose::Service).await
}

/// POST /api/charge-anode
pub async fn charge_anode(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChargeCustomer>,
) -> ApiResult<Json<Value>> {
    charge(&state, &headers, request, ChargePurpose::AnodeReplacement).await
}
