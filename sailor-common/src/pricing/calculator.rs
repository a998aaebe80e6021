//! Customer-facing cost estimator
//!
//! Each surcharge is a percentage of the base service cost; surcharges are
//! summed, not compounded. Anode installation is added on top and the
//! minimum charge applies to any positive subtotal below it.

use super::catalog::{self, surcharges, RateType, ANODE_INSTALLATION_RATE, MINIMUM_CHARGE};
use super::conditions::{
    growth_level_from_history, growth_surcharge_estimated, growth_surcharge_observed,
    paint_condition_from_age, paint_surcharge_estimated, paint_surcharge_observed, GrowthLevel,
    LastCleaned, LastPainted, PaintCondition,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boat propulsion type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoatType {
    #[default]
    Sailboat,
    Powerboat,
}

/// Hull configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HullType {
    #[default]
    Monohull,
    Catamaran,
    Trimaran,
}

/// Inputs to [`calculate_service_cost`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    pub service_key: String,
    #[serde(default)]
    pub boat_length: f64,
    #[serde(default)]
    pub boat_type: BoatType,
    #[serde(default)]
    pub hull_type: HullType,
    #[serde(default)]
    pub has_twin_engines: bool,
    #[serde(default)]
    pub last_painted_time: Option<LastPainted>,
    #[serde(default)]
    pub last_cleaned_time: Option<LastCleaned>,
    #[serde(default)]
    pub anodes_to_install: u32,
    /// Observed paint condition; used together with `actual_growth_level`
    #[serde(default)]
    pub actual_paint_condition: Option<PaintCondition>,
    #[serde(default)]
    pub actual_growth_level: Option<GrowthLevel>,
}

/// Reasons an estimate cannot be produced
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("Invalid service selected")]
    InvalidService,

    #[error("Invalid boat length for per-foot service")]
    InvalidBoatLength,

    #[error("Anode parts cost must be a non-negative amount")]
    InvalidAnodeCost,
}

/// Line item category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineItemKind {
    Base,
    Surcharge,
    Additional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "type")]
    pub kind: LineItemKind,
    pub description: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub items: Vec<LineItem>,
    pub subtotal: f64,
    pub total: f64,
    pub minimum_applied: bool,
}

impl CostBreakdown {
    fn push(&mut self, kind: LineItemKind, description: String, amount: f64) {
        self.items.push(LineItem {
            kind,
            description,
            amount,
        });
    }

    /// Sum of all surcharge line items
    pub fn surcharge_total(&self) -> f64 {
        self.items
            .iter()
            .filter(|i| i.kind == LineItemKind::Surcharge)
            .map(|i| i.amount)
            .sum()
    }
}

/// Successful estimate
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    pub service: &'static str,
    pub service_type: RateType,
    pub base_rate: f64,
    pub breakdown: CostBreakdown,
    pub total: f64,
}

/// Price a service request
pub fn calculate_service_cost(request: &EstimateRequest) -> Result<CostEstimate, PricingError> {
    let service = catalog::find(&request.service_key).ok_or(PricingError::InvalidService)?;

    let mut breakdown = CostBreakdown::default();
    let base_cost;
    let mut surcharge_total = 0.0;

    match service.rate_type {
        RateType::PerFoot => {
            let length = request.boat_length;
            if !(length > 0.0) {
                return Err(PricingError::InvalidBoatLength);
            }

            base_cost = service.rate * length;
            breakdown.push(
                LineItemKind::Base,
                format!("Base ({:.2}/ft × {}ft)", service.rate, length),
                base_cost,
            );

            let mut add = |breakdown: &mut CostBreakdown, rate: f64, description: String| {
                let amount = base_cost * rate;
                surcharge_total += amount;
                breakdown.push(LineItemKind::Surcharge, description, amount);
            };

            if request.boat_type == BoatType::Powerboat {
                add(&mut breakdown, surcharges::POWERBOAT, "Powerboat Surcharge (+25%)".into());
            }

            match request.hull_type {
                HullType::Catamaran => {
                    add(&mut breakdown, surcharges::CATAMARAN, "Catamaran Surcharge (+25%)".into())
                }
                HullType::Trimaran => {
                    add(&mut breakdown, surcharges::TRIMARAN, "Trimaran Surcharge (+50%)".into())
                }
                HullType::Monohull => {}
            }

            if request.has_twin_engines {
                add(&mut breakdown, surcharges::TWIN_ENGINES, "Twin Engine Surcharge (+10%)".into());
            }

            if service.key.is_cleaning() {
                let condition = assess_condition(request);
                let prefix = |observed: bool| if observed { "" } else { "Est. " };

                if condition.paint_surcharge > 0.0 {
                    add(
                        &mut breakdown,
                        condition.paint_surcharge,
                        format!(
                            "{}Paint ({}): +{:.0}%",
                            prefix(condition.paint_observed),
                            condition.paint,
                            condition.paint_surcharge * 100.0
                        ),
                    );
                }

                if condition.growth_surcharge > 0.0 {
                    add(
                        &mut breakdown,
                        condition.growth_surcharge,
                        format!(
                            "{}Growth ({}): +{:.0}%",
                            prefix(condition.growth_observed),
                            condition.growth,
                            condition.growth_surcharge * 100.0
                        ),
                    );
                }
            }
        }
        RateType::Flat => {
            base_cost = service.rate;
            breakdown.push(LineItemKind::Base, "Flat Rate".to_string(), base_cost);
        }
    }

    let mut anode_cost = 0.0;
    if request.anodes_to_install > 0 {
        anode_cost = f64::from(request.anodes_to_install) * ANODE_INSTALLATION_RATE;
        breakdown.push(
            LineItemKind::Additional,
            format!(
                "Anode Installation ({} @ ${} each)",
                request.anodes_to_install, ANODE_INSTALLATION_RATE
            ),
            anode_cost,
        );
    }

    let subtotal = base_cost + surcharge_total + anode_cost;
    breakdown.subtotal = subtotal;

    if subtotal > 0.0 && subtotal < MINIMUM_CHARGE {
        breakdown.total = MINIMUM_CHARGE;
        breakdown.minimum_applied = true;
    } else {
        breakdown.total = subtotal;
    }

    Ok(CostEstimate {
        service: service.name,
        service_type: service.rate_type,
        base_rate: service.rate,
        total: breakdown.total,
        breakdown,
    })
}

/// Paint/growth assessment used for cleaning surcharges
#[derive(Debug, Clone, Copy)]
struct HullAssessment {
    paint: PaintCondition,
    growth: GrowthLevel,
    paint_surcharge: f64,
    growth_surcharge: f64,
    /// Per-line "Est." labelling follows whichever field the diver filled in,
    /// even when pricing falls back to the estimate
    paint_observed: bool,
    growth_observed: bool,
}

fn assess_condition(request: &EstimateRequest) -> HullAssessment {
    if let (Some(paint), Some(growth)) = (request.actual_paint_condition, request.actual_growth_level) {
        return HullAssessment {
            paint,
            growth,
            paint_surcharge: paint_surcharge_observed(paint),
            growth_surcharge: growth_surcharge_observed(growth),
            paint_observed: true,
            growth_observed: true,
        };
    }

    let paint = paint_condition_from_age(request.last_painted_time);
    let growth = growth_level_from_history(paint, request.last_cleaned_time);
    HullAssessment {
        paint,
        growth,
        paint_surcharge: paint_surcharge_estimated(paint, request.last_painted_time),
        growth_surcharge: growth_surcharge_estimated(paint, request.last_cleaned_time),
        paint_observed: request.actual_paint_condition.is_some(),
        growth_observed: request.actual_growth_level.is_some(),
    }
}

/// Render a breakdown as display lines
pub fn format_breakdown(breakdown: &CostBreakdown, is_estimate: bool) -> String {
    let mut lines: Vec<String> = breakdown
        .items
        .iter()
        .map(|item| match item.kind {
            LineItemKind::Surcharge => format!("  • {}: ${:.2}", item.description, item.amount),
            _ => format!("• {}: ${:.2}", item.description, item.amount),
        })
        .collect();

    lines.push(format!("Subtotal: ${:.2}", breakdown.subtotal));

    if breakdown.minimum_applied {
        lines.push(format!("Applied Minimum Charge: ${:.2}", MINIMUM_CHARGE));
    }

    let label = if is_estimate { "Total Estimate" } else { "Total" };
    lines.push(format!("{}: ${:.2}", label, breakdown.total));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(service_key: &str, boat_length: f64) -> EstimateRequest {
        EstimateRequest {
            service_key: service_key.to_string(),
            boat_length,
            last_painted_time: Some(LastPainted::UpTo6Months),
            last_cleaned_time: Some(LastCleaned::UpTo2Months),
            ..Default::default()
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_unknown_service_rejected() {
        let err = calculate_service_cost(&request("bottom_paint", 30.0)).unwrap_err();
        assert_eq!(err, PricingError::InvalidService);
        assert_eq!(err.to_string(), "Invalid service selected");
    }

    #[test]
    fn test_per_foot_requires_length() {
        let err = calculate_service_cost(&request("recurring_cleaning", 0.0)).unwrap_err();
        assert_eq!(err, PricingError::InvalidBoatLength);
    }

    #[test]
    fn test_clean_hull_has_no_surcharges() {
        let estimate = calculate_service_cost(&request("recurring_cleaning", 40.0)).unwrap();
        assert_eq!(estimate.breakdown.items.len(), 1);
        assert!(approx(estimate.total, 180.0));
        assert!(!estimate.breakdown.minimum_applied);
        assert_eq!(estimate.breakdown.items[0].description, "Base (4.50/ft × 40ft)");
    }

    #[test]
    fn test_surcharges_are_additive_on_base() {
        let mut req = request("onetime_cleaning", 40.0);
        req.boat_type = BoatType::Powerboat;
        req.hull_type = HullType::Trimaran;
        req.has_twin_engines = true;

        let estimate = calculate_service_cost(&req).unwrap();
        let base = 240.0;
        assert!(approx(estimate.breakdown.surcharge_total(), base * (0.25 + 0.50 + 0.10)));
        assert!(approx(estimate.total, base * 1.85));
    }

    #[test]
    fn test_estimated_paint_and_growth() {
        let mut req = request("onetime_cleaning", 30.0);
        req.last_painted_time = Some(LastPainted::Over24Months);
        req.last_cleaned_time = Some(LastCleaned::UpTo4Months);

        let estimate = calculate_service_cost(&req).unwrap();
        let descriptions: Vec<_> = estimate
            .breakdown
            .items
            .iter()
            .map(|i| i.description.as_str())
            .collect();
        assert_eq!(
            descriptions,
            vec![
                "Base (6.00/ft × 30ft)",
                "Est. Paint (Poor): +15%",
                "Est. Growth (Heavy): +50%",
            ]
        );
        assert!(approx(estimate.total, 180.0 * 1.65));
    }

    #[test]
    fn test_observed_conditions_take_precedence() {
        let mut req = request("recurring_cleaning", 30.0);
        req.actual_paint_condition = Some(PaintCondition::Missing);
        req.actual_growth_level = Some(GrowthLevel::Severe);

        let estimate = calculate_service_cost(&req).unwrap();
        assert_eq!(estimate.breakdown.items[1].description, "Paint (Missing): +15%");
        assert_eq!(estimate.breakdown.items[2].description, "Growth (Severe): +200%");
        assert!(approx(estimate.total, 135.0 * 3.15));
    }

    #[test]
    fn test_partial_observation_labels_each_line() {
        let mut req = request("onetime_cleaning", 30.0);
        req.last_painted_time = Some(LastPainted::Over24Months);
        req.last_cleaned_time = Some(LastCleaned::UpTo4Months);
        req.actual_paint_condition = Some(PaintCondition::Poor);

        let estimate = calculate_service_cost(&req).unwrap();
        // Priced from history, but only the growth line is marked estimated
        assert_eq!(estimate.breakdown.items[1].description, "Paint (Poor): +15%");
        assert_eq!(estimate.breakdown.items[2].description, "Est. Growth (Heavy): +50%");
        assert!(approx(estimate.total, 180.0 * 1.65));
    }

    #[test]
    fn test_inspection_ignores_hull_condition() {
        let mut req = request("underwater_inspection", 50.0);
        req.last_painted_time = Some(LastPainted::Unsure);
        let estimate = calculate_service_cost(&req).unwrap();
        assert_eq!(estimate.breakdown.items.len(), 1);
        assert!(approx(estimate.total, 200.0));
    }

    #[test]
    fn test_minimum_charge_applied() {
        let estimate = calculate_service_cost(&request("underwater_inspection", 20.0)).unwrap();
        assert!(approx(estimate.breakdown.subtotal, 80.0));
        assert!(approx(estimate.total, MINIMUM_CHARGE));
        assert!(estimate.breakdown.minimum_applied);
    }

    #[test]
    fn test_flat_rate_with_anodes() {
        let mut req = request("anodes_only", 0.0);
        req.anodes_to_install = 3;
        let estimate = calculate_service_cost(&req).unwrap();
        assert_eq!(estimate.breakdown.items[0].description, "Flat Rate");
        assert_eq!(
            estimate.breakdown.items[1].description,
            "Anode Installation (3 @ $15 each)"
        );
        assert!(approx(estimate.total, 195.0));
    }

    #[test]
    fn test_format_breakdown_lines() {
        let estimate = calculate_service_cost(&request("underwater_inspection", 20.0)).unwrap();
        let text = format_breakdown(&estimate.breakdown, true);
        assert_eq!(
            text,
            "• Base (4.00/ft × 20ft): $80.00\n\
             Subtotal: $80.00\n\
             Applied Minimum Charge: $150.00\n\
             Total Estimate: $150.00"
        );
    }

    #[test]
    fn test_request_wire_format() {
        let req: EstimateRequest = serde_json::from_str(
            r#"{"serviceKey":"recurring_cleaning","boatLength":35,"hullType":"catamaran",
                "lastPaintedTime":"7-12_months","lastCleanedTime":"5-6_months"}"#,
        )
        .unwrap();
        assert_eq!(req.hull_type, HullType::Catamaran);
        assert_eq!(req.boat_type, BoatType::Sailboat);
        assert_eq!(req.last_cleaned_time, Some(LastCleaned::UpTo6Months));
    }
}
