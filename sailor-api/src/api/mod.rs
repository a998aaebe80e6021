//! HTTP API handlers for sailor-api

pub mod auth;
pub mod bookings;
pub mod calendar;
pub mod charge;
pub mod customers;
pub mod health;
pub mod inventory;
pub mod pricing;
pub mod quotes;
pub mod sse;

pub use auth::auth_middleware;
pub use health::health_routes;
pub use sse::event_stream;
