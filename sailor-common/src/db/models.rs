//! Database models
//!
//! Rows serialize with their column names, which is what the admin screens
//! consume. Timestamps are RFC 3339 text (see [`crate::time`]).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ServiceType {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub duration_minutes: i64,
    pub category: String,
    pub price: Option<f64>,
    pub is_active: bool,
    pub display_order: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BusinessHoursRow {
    pub id: String,
    /// 0 = Sunday
    pub day_of_week: i64,
    pub open_time: String,
    pub close_time: String,
    pub is_open: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BlackoutDate {
    pub id: String,
    pub start_date: String,
    pub end_date: String,
    pub reason: Option<String>,
    pub all_day: bool,
    pub active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Booking {
    pub id: String,
    pub service_type_id: Option<String>,
    pub service_type: String,
    pub booking_start: String,
    pub booking_end: String,
    pub status: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub customer_notes: Option<String>,
    pub internal_notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<String>,
    pub calendar_event_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BookingHistory {
    pub id: String,
    pub booking_id: String,
    pub changed_by: String,
    pub change_type: String,
    /// JSON object of the changed fields
    pub new_values: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Quote {
    pub id: String,
    pub quote_number: String,
    pub quote_date: Option<String>,
    pub expiry_date: Option<String>,
    pub valid_days: Option<i64>,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub boat_name: Option<String>,
    pub boat_make: Option<String>,
    pub marina: Option<String>,
    pub slip: Option<String>,
    pub service_type: Option<String>,
    pub service_name: Option<String>,
    pub boat_length: Option<f64>,
    pub paint_condition: Option<String>,
    pub growth_level: Option<String>,
    pub has_twin_engines: Option<bool>,
    pub additional_hulls: Option<i64>,
    pub base_price: Option<f64>,
    pub rate_per_foot: Option<f64>,
    pub anode_cost: Option<f64>,
    pub anode_labor_cost: Option<f64>,
    pub total_cost: Option<f64>,
    pub currency: String,
    #[sqlx(json)]
    pub anodes: serde_json::Value,
    pub status: String,
    pub created_by: String,
    pub viewed_at: Option<String>,
    pub accepted_at: Option<String>,
    pub rejected_at: Option<String>,
    pub created_at: String,
}

/// Replenishment row joined with its item's name and sku
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReplenishmentRow {
    pub id: String,
    pub anode_id: Option<String>,
    pub item_id: Option<String>,
    pub item_name: Option<String>,
    pub item_sku: Option<String>,
    pub unit_cost: Option<f64>,
    pub quantity_needed: i64,
    pub quantity_to_order: Option<i64>,
    pub priority: String,
    pub status: String,
    pub source: String,
    pub requested_by: Option<String>,
    pub notes: Option<String>,
    pub po_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InventoryTransaction {
    pub id: String,
    pub transaction_type: String,
    pub anode_id: Option<String>,
    pub item_id: Option<String>,
    pub quantity: i64,
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
    pub notes: Option<String>,
    pub performed_by: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PurchaseOrder {
    pub id: String,
    pub po_number: String,
    pub supplier_id: Option<String>,
    pub status: String,
    pub total_amount: f64,
    pub internal_notes: Option<String>,
    pub created_by: String,
    pub created_at: String,
}

/// Service order joined with the customer's billing identity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ServiceOrder {
    pub id: String,
    pub order_number: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub boat_id: Option<String>,
    pub service_type: String,
    pub service_interval: Option<String>,
    pub estimated_amount: Option<f64>,
    pub final_amount: Option<f64>,
    pub status: String,
    pub notes: Option<String>,
    pub stripe_payment_intent_id: Option<String>,
    pub completed_at: Option<String>,
    pub created_at: String,
}
