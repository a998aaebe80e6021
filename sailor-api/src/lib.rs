//! sailor-api library - Sailor Skills HTTP service
//!
//! Pricing, quotes, booking, inventory and admin charging over one SQLite
//! database, with Google Calendar and Stripe behind integration traits.

use axum::http::HeaderValue;
use axum::Router;
use sailor_common::scheduling::BusinessHours;
use sailor_common::EventBus;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub mod api;
pub mod error;
pub mod integrations;

use integrations::{CalendarProvider, DisabledPayments, LocalCalendar, PaymentGateway};

/// Events buffered per SSE client
const EVENT_CAPACITY: usize = 256;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub events: Arc<EventBus>,
    pub calendar: Arc<dyn CalendarProvider>,
    pub payments: Arc<dyn PaymentGateway>,
    /// Fallback opening hours and the UTC offset used for slot math
    pub hours: BusinessHours,
    /// Emails allowed to charge customers; empty allows any admin
    pub admin_emails: Arc<Vec<String>>,
    /// SHA-256 of the admin token, or "0" when auth is disabled
    pub token_hash: Arc<String>,
    pub allowed_origins: Arc<Vec<String>>,
}

impl AppState {
    /// State with the local calendar and payments disabled
    pub fn new(db: SqlitePool, token_hash: impl Into<String>) -> Self {
        Self {
            calendar: Arc::new(LocalCalendar::new(db.clone())),
            db,
            events: Arc::new(EventBus::new(EVENT_CAPACITY)),
            payments: Arc::new(DisabledPayments),
            hours: BusinessHours::default(),
            admin_emails: Arc::new(Vec::new()),
            token_hash: Arc::new(token_hash.into()),
            allowed_origins: Arc::new(Vec::new()),
        }
    }

    pub fn with_calendar(mut self, calendar: Arc<dyn CalendarProvider>) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn with_payments(mut self, payments: Arc<dyn PaymentGateway>) -> Self {
        self.payments = payments;
        self
    }

    pub fn with_hours(mut self, hours: BusinessHours) -> Self {
        self.hours = hours;
        self
    }

    pub fn with_admin_emails(mut self, emails: Vec<String>) -> Self {
        self.admin_emails = Arc::new(emails);
        self
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = Arc::new(origins);
        self
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build application router
///
/// Admin routes sit behind the bearer-token middleware; health, the public
/// calculator, quote viewing, calendar booking and SSE do not.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, patch, post, put};

    let protected = Router::new()
        .route("/api/quotes", get(api::quotes::list_quotes))
        // Bookings
        .route("/api/admin/bookings", get(api::bookings::list_bookings))
        .route("/api/admin/bookings/stats/summary", get(api::bookings::booking_stats))
        .route(
            "/api/admin/bookings/:id",
            get(api::bookings::get_booking).patch(api::bookings::update_booking),
        )
        .route("/api/admin/service-types", get(api::bookings::list_service_types))
        .route("/api/admin/service-types/:id", patch(api::bookings::update_service_type))
        .route("/api/admin/business-hours", get(api::bookings::list_business_hours))
        .route("/api/admin/business-hours/:id", patch(api::bookings::update_business_hours))
        .route(
            "/api/admin/blackout-dates",
            get(api::bookings::list_blackout_dates).post(api::bookings::create_blackout_date),
        )
        .route("/api/admin/blackout-dates/:id", delete(api::bookings::delete_blackout_date))
        // Inventory
        .route("/api/inventory", get(api::inventory::list_inventory))
        .route("/api/inventory/stats", get(api::inventory::inventory_stats))
        .route("/api/inventory/items", post(api::inventory::add_item))
        .route("/api/inventory/transactions", post(api::inventory::record_transaction))
        .route("/api/inventory/charge", post(api::inventory::charge_customer))
        .route(
            "/api/replenishment",
            get(api::inventory::list_replenishment).post(api::inventory::add_replenishment),
        )
        .route("/api/replenishment/generate", post(api::inventory::generate_replenishment))
        .route(
            "/api/replenishment/:id",
            put(api::inventory::update_replenishment).delete(api::inventory::cancel_replenishment),
        )
        .route("/api/purchase-orders", post(api::inventory::create_purchase_order))
        .route("/api/suppliers", get(api::inventory::list_suppliers))
        // Billing
        .route("/api/admin/charge", post(api::charge::charge_for_service))
        .route("/api/admin/charge/calculate", post(api::pricing::calculate_admin_charge))
        .route("/api/stripe-customers", get(api::customers::list_customers))
        .route("/api/create-customer", post(api::customers::create_customer))
        .route("/api/create-setup-intent", post(api::customers::create_setup_intent))
        .route("/api/attach-payment-method", post(api::customers::attach_payment_method))
        .route("/api/charge-customer", post(api::customers::charge_customer))
        .route("/api/charge-anode", post(api::customers::charge_anode))
        .layer(middleware::from_fn_with_state(state.clone(), api::auth_middleware));

    let public = Router::new()
        .route("/api/services", get(api::pricing::list_services))
        .route("/api/estimate", post(api::pricing::estimate))
        .route("/api/quotes", post(api::quotes::save_quote))
        .route("/api/quotes/:quote_number", get(api::quotes::get_quote))
        .route("/api/quotes/:quote_number/status", patch(api::quotes::update_quote_status))
        .route("/api/calendar/availability", get(api::calendar::availability))
        .route("/api/calendar/check-slot", post(api::calendar::check_slot))
        .route("/api/calendar/busy", get(api::calendar::busy_times))
        .route("/api/calendar/create-booking", post(api::calendar::create_booking))
        .route("/api/calendar/cancel-booking/:event_id", delete(api::calendar::cancel_booking))
        .route("/api/calendar/health", get(api::calendar::calendar_health))
        .route("/events", get(api::event_stream))
        .merge(api::health_routes());

    let cors = cors_layer(&state.allowed_origins);

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
