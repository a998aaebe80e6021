//! Admin charge calculator
//!
//! Used after the dive, when the diver knows the real hull configuration and
//! growth. Unlike the customer estimator, surcharges here compound: each one
//! multiplies the running cost in the order hull, growth, powerboat, engines.
//! Paint condition is recorded for the service log but never priced.
//! Anodes added to the visit are billed on top at parts cost plus labor.

use super::catalog::{self, RateType, ServiceKey, ANODE_INSTALLATION_RATE, MINIMUM_CHARGE};
use super::conditions::{GrowthLevel, PaintCondition};
use super::calculator::PricingError;
use serde::{Deserialize, Serialize};

/// Observed conditions entered on the admin charge screen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminChargeInput {
    pub service_key: String,
    #[serde(default = "default_boat_length")]
    pub boat_length: f64,
    /// 0 = monohull, 1 = catamaran, 2 = trimaran
    #[serde(default)]
    pub additional_hulls: u8,
    /// Visual growth slider, 0-100
    #[serde(default)]
    pub growth_slider: u8,
    #[serde(default)]
    pub paint_condition: Option<PaintCondition>,
    #[serde(default)]
    pub powerboat: bool,
    #[serde(default)]
    pub twin_engines: bool,
    /// Anodes installed during the visit
    #[serde(default)]
    pub anode_count: u32,
    /// Catalog price of those anodes
    #[serde(default)]
    pub anode_parts_cost: f64,
}

fn default_boat_length() -> f64 {
    30.0
}

/// Applied surcharges, as whole percentages, plus the resulting cost
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCharge {
    pub base: f64,
    pub hull_percent: f64,
    pub growth_percent: f64,
    pub growth_label: Option<GrowthLevel>,
    pub paint_condition: Option<PaintCondition>,
    pub powerboat_percent: f64,
    pub engines_percent: f64,
    pub anode_count: u32,
    pub anode_parts: f64,
    pub anode_labor: f64,
    pub total: f64,
}

/// Map the 0-100 growth slider to a level and a surcharge fraction
///
/// Bands: up to 20 minimal (0%), up to 35 moderate (0-25%), up to 60 heavy
/// (25-50%), above that severe (50-200%), linear within each band.
pub fn growth_from_slider(value: u8) -> (GrowthLevel, f64) {
    let v = f64::from(value.min(100));
    match value {
        0..=20 => (GrowthLevel::Minimal, 0.0),
        21..=35 => (GrowthLevel::Moderate, ((v - 20.0) * 25.0 / 15.0) / 100.0),
        36..=60 => (GrowthLevel::Heavy, (25.0 + (v - 35.0) * 25.0 / 25.0) / 100.0),
        _ => (GrowthLevel::Severe, (50.0 + (v - 60.0) * 150.0 / 40.0) / 100.0),
    }
}

/// Compute the charge for a service from observed conditions and anodes used
pub fn admin_charge(input: &AdminChargeInput) -> Result<AdminCharge, PricingError> {
    let service = catalog::find(&input.service_key).ok_or(PricingError::InvalidService)?;
    if !input.anode_parts_cost.is_finite() || input.anode_parts_cost < 0.0 {
        return Err(PricingError::InvalidAnodeCost);
    }
    let anode_parts = input.anode_parts_cost;
    let anode_labor = f64::from(input.anode_count) * ANODE_INSTALLATION_RATE;

    if service.rate_type != RateType::PerFoot {
        let total = if service.key == ServiceKey::AnodesOnly {
            anodes_only_charge(anode_parts, input.anode_count)
        } else {
            service.rate + anode_parts + anode_labor
        };
        return Ok(AdminCharge {
            base: service.rate,
            hull_percent: 0.0,
            growth_percent: 0.0,
            growth_label: None,
            paint_condition: input.paint_condition,
            powerboat_percent: 0.0,
            engines_percent: 0.0,
            anode_count: input.anode_count,
            anode_parts,
            anode_labor,
            total,
        });
    }

    let length = if input.boat_length > 0.0 {
        input.boat_length
    } else {
        default_boat_length()
    };

    let base = length * service.rate;
    let mut cost = base;

    let hull_percent = match input.additional_hulls {
        0 => 0.0,
        1 => 25.0,
        _ => 50.0,
    };
    cost *= 1.0 + hull_percent / 100.0;

    let mut growth_percent = 0.0;
    let mut growth_label = None;
    if service.key.is_cleaning() {
        let (level, fraction) = growth_from_slider(input.growth_slider);
        growth_percent = fraction * 100.0;
        growth_label = Some(level);
        cost *= 1.0 + fraction;
    }

    let powerboat_percent = if input.powerboat { 25.0 } else { 0.0 };
    cost *= 1.0 + powerboat_percent / 100.0;

    let engines_percent = if input.twin_engines { 10.0 } else { 0.0 };
    cost *= 1.0 + engines_percent / 100.0;

    Ok(AdminCharge {
        base,
        hull_percent,
        growth_percent,
        growth_label,
        paint_condition: input.paint_condition,
        powerboat_percent,
        engines_percent,
        anode_count: input.anode_count,
        anode_parts,
        anode_labor,
        total: cost + anode_parts + anode_labor,
    })
}

/// Anodes-only charge: parts plus labor, never below the minimum
pub fn anodes_only_charge(parts_cost: f64, anode_count: u32) -> f64 {
    let labor = f64::from(anode_count) * ANODE_INSTALLATION_RATE;
    (parts_cost + labor).max(MINIMUM_CHARGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(service_key: &str) -> AdminChargeInput {
        AdminChargeInput {
            service_key: service_key.to_string(),
            boat_length: 40.0,
            additional_hulls: 0,
            growth_slider: 0,
            paint_condition: None,
            powerboat: false,
            twin_engines: false,
            anode_count: 0,
            anode_parts_cost: 0.0,
        }
    }

    #[test]
    fn test_growth_slider_bands() {
        assert_eq!(growth_from_slider(20), (GrowthLevel::Minimal, 0.0));
        assert_eq!(growth_from_slider(35), (GrowthLevel::Moderate, 0.25));
        assert_eq!(growth_from_slider(60), (GrowthLevel::Heavy, 0.50));
        assert_eq!(growth_from_slider(100), (GrowthLevel::Severe, 2.0));
    }

    #[test]
    fn test_surcharges_compound() {
        let mut i = input("recurring_cleaning");
        i.additional_hulls = 1;
        i.powerboat = true;
        i.twin_engines = true;

        let charge = admin_charge(&i).unwrap();
        assert_eq!(charge.base, 180.0);
        let expected = 180.0 * 1.25 * 1.25 * 1.10;
        assert!((charge.total - expected).abs() < 1e-9);
        assert_eq!(charge.growth_label, Some(GrowthLevel::Minimal));
    }

    #[test]
    fn test_growth_only_for_cleaning() {
        let mut i = input("underwater_inspection");
        i.growth_slider = 100;
        let charge = admin_charge(&i).unwrap();
        assert_eq!(charge.growth_percent, 0.0);
        assert_eq!(charge.growth_label, None);
        assert_eq!(charge.total, 160.0);
    }

    #[test]
    fn test_paint_recorded_not_priced() {
        let mut i = input("onetime_cleaning");
        i.paint_condition = Some(PaintCondition::Missing);
        let charge = admin_charge(&i).unwrap();
        assert_eq!(charge.paint_condition, Some(PaintCondition::Missing));
        assert_eq!(charge.total, 240.0);
    }

    #[test]
    fn test_flat_service_uses_rate() {
        let charge = admin_charge(&input("propeller_service")).unwrap();
        assert_eq!(charge.total, 349.0);
    }

    #[test]
    fn test_anodes_added_after_surcharges() {
        let mut i = input("recurring_cleaning");
        i.powerboat = true;
        i.anode_count = 2;
        i.anode_parts_cost = 64.5;
        let charge = admin_charge(&i).unwrap();
        assert_eq!(charge.anode_labor, 30.0);
        assert!((charge.total - (180.0 * 1.25 + 64.5 + 30.0)).abs() < 1e-9);
    }

    #[test]
    fn test_anodes_only_service() {
        let mut i = input("anodes_only");
        i.anode_count = 1;
        i.anode_parts_cost = 40.0;
        assert_eq!(admin_charge(&i).unwrap().total, 150.0);

        i.anode_count = 4;
        i.anode_parts_cost = 180.0;
        assert_eq!(admin_charge(&i).unwrap().total, 240.0);

        i.anode_parts_cost = -1.0;
        assert!(matches!(admin_charge(&i), Err(PricingError::InvalidAnodeCost)));
    }

    #[test]
    fn test_anodes_only_minimum() {
        assert_eq!(anodes_only_charge(40.0, 2), 150.0);
        assert_eq!(anodes_only_charge(180.0, 4), 240.0);
    }
}
