//! Service pricing
//!
//! - `catalog`: services, rates, surcharge constants
//! - `conditions`: paint/growth estimation from hull history
//! - `calculator`: customer estimator (additive surcharges, minimum charge)
//! - `admin`: post-dive charge calculator (compounding surcharges)

pub mod admin;
pub mod calculator;
pub mod catalog;
pub mod conditions;

pub use admin::{admin_charge, anodes_only_charge, growth_from_slider, AdminCharge, AdminChargeInput};
pub use calculator::{
    calculate_service_cost, format_breakdown, BoatType, CostBreakdown, CostEstimate,
    EstimateRequest, HullType, LineItem, LineItemKind, PricingError,
};
pub use catalog::{RateType, ServiceDefinition, ServiceKey, ANODE_INSTALLATION_RATE, MINIMUM_CHARGE};
pub use conditions::{GrowthLevel, LastCleaned, LastPainted, PaintCondition};
