//! Diving service catalog, rates, and surcharge constants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minimum charge for any priced service
pub const MINIMUM_CHARGE: f64 = 150.0;

/// Labor charged per anode installed
pub const ANODE_INSTALLATION_RATE: f64 = 15.0;

/// Surcharge rates (fraction of base price)
pub mod surcharges {
    pub const POWERBOAT: f64 = 0.25;
    pub const CATAMARAN: f64 = 0.25;
    pub const TRIMARAN: f64 = 0.50;
    pub const TWIN_ENGINES: f64 = 0.10;
    pub const PAINT_POOR: f64 = 0.10;
    pub const PAINT_MISSING: f64 = 0.15;
    /// Average heavy-growth surcharge
    pub const GROWTH_HEAVY: f64 = 0.35;
    pub const GROWTH_SEVERE: f64 = 2.00;
}

/// How a service is priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateType {
    /// Rate multiplied by boat length in feet
    PerFoot,
    /// Fixed price regardless of boat
    Flat,
}

/// Diving services offered by the estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKey {
    RecurringCleaning,
    OnetimeCleaning,
    ItemRecovery,
    UnderwaterInspection,
    PropellerService,
    AnodesOnly,
}

impl ServiceKey {
    pub const ALL: [ServiceKey; 6] = [
        ServiceKey::RecurringCleaning,
        ServiceKey::OnetimeCleaning,
        ServiceKey::ItemRecovery,
        ServiceKey::UnderwaterInspection,
        ServiceKey::PropellerService,
        ServiceKey::AnodesOnly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKey::RecurringCleaning => "recurring_cleaning",
            ServiceKey::OnetimeCleaning => "onetime_cleaning",
            ServiceKey::ItemRecovery => "item_recovery",
            ServiceKey::UnderwaterInspection => "underwater_inspection",
            ServiceKey::PropellerService => "propeller_service",
            ServiceKey::AnodesOnly => "anodes_only",
        }
    }

    /// Hull cleaning services carry paint and growth surcharges
    pub fn is_cleaning(&self) -> bool {
        matches!(self, ServiceKey::RecurringCleaning | ServiceKey::OnetimeCleaning)
    }

    /// Catalog entry for this service
    pub fn definition(&self) -> &'static ServiceDefinition {
        // SERVICES is ordered like ServiceKey::ALL
        let idx = Self::ALL
            .iter()
            .position(|k| k == self)
            .unwrap_or_default();
        &SERVICES[idx]
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("Unknown service: {}", s))
    }
}

/// Catalog entry describing one service
#[derive(Debug, Clone, Serialize)]
pub struct ServiceDefinition {
    pub key: ServiceKey,
    pub name: &'static str,
    pub rate_type: RateType,
    pub rate: f64,
    pub description: &'static str,
}

pub static SERVICES: [ServiceDefinition; 6] = [
    ServiceDefinition {
        key: ServiceKey::RecurringCleaning,
        name: "Recurring Cleaning & Anodes",
        rate_type: RateType::PerFoot,
        rate: 4.50,
        description: "Regular hull cleaning keeps your boat performing at its best. Service includes cleaning and zinc anode inspection. Available at 1, 2, 3, or 6-month intervals.",
    },
    ServiceDefinition {
        key: ServiceKey::OnetimeCleaning,
        name: "One-time Cleaning & Anodes",
        rate_type: RateType::PerFoot,
        rate: 6.00,
        description: "Complete hull cleaning and zinc anode inspection. Perfect for pre-haul out, pre-survey, or when your regular diver is unavailable.",
    },
    ServiceDefinition {
        key: ServiceKey::ItemRecovery,
        name: "Item Recovery",
        rate_type: RateType::Flat,
        rate: 199.0,
        description: "Professional recovery of lost items like phones, keys, tools, or dinghies. Service includes up to 45 minutes of searching time. Recovery is not guaranteed.",
    },
    ServiceDefinition {
        key: ServiceKey::UnderwaterInspection,
        name: "Underwater Inspection",
        rate_type: RateType::PerFoot,
        rate: 4.0,
        description: "Thorough underwater inspection with detailed photo/video documentation. $4 per foot with $150 minimum.",
    },
    ServiceDefinition {
        key: ServiceKey::PropellerService,
        name: "Propeller Removal/Installation",
        rate_type: RateType::Flat,
        rate: 349.0,
        description: "Professional propeller removal or installation service. $349 per propeller for either service.",
    },
    ServiceDefinition {
        key: ServiceKey::AnodesOnly,
        name: "Anodes Only",
        rate_type: RateType::Flat,
        rate: 150.0,
        description: "Zinc anode inspection and replacement service. $150 minimum service charge plus cost of anodes.",
    },
];

/// Entry in the service picker; `None` renders as a separator
pub type DisplaySlot = Option<ServiceKey>;

/// Order in which services are offered to customers
pub const DISPLAY_ORDER: [DisplaySlot; 7] = [
    Some(ServiceKey::RecurringCleaning),
    Some(ServiceKey::OnetimeCleaning),
    None,
    Some(ServiceKey::AnodesOnly),
    Some(ServiceKey::UnderwaterInspection),
    Some(ServiceKey::ItemRecovery),
    Some(ServiceKey::PropellerService),
];

/// Look up a service by its wire key
pub fn find(key: &str) -> Option<&'static ServiceDefinition> {
    key.parse::<ServiceKey>().ok().map(|k| k.definition())
}
