//! # Sailor Skills Common Library
//!
//! Shared code for the Sailor Skills services including:
//! - Pricing calculator and admin charge math
//! - Order wizard state
//! - Inventory and booking availability rules
//! - Database schema, models and queries
//! - Event types and SSE streaming
//! - Configuration loading and admin authentication

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod inventory;
pub mod pricing;
pub mod scheduling;
pub mod sse;
pub mod time;
pub mod wizard;

pub use error::{Error, Result};
pub use events::{EventBus, SailorEvent};
