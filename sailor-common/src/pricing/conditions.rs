//! Hull condition estimation
//!
//! Customers rarely know their paint or growth condition, so the estimator
//! infers both from how long ago the hull was painted and cleaned. Divers on
//! the admin side record the observed condition directly instead.

use super::catalog::surcharges;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Antifouling paint condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaintCondition {
    #[serde(alias = "excellent")]
    Excellent,
    #[serde(alias = "good")]
    Good,
    #[serde(alias = "fair")]
    Fair,
    #[serde(alias = "poor")]
    Poor,
    #[serde(alias = "missing")]
    Missing,
}

impl fmt::Display for PaintCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaintCondition::Excellent => "Excellent",
            PaintCondition::Good => "Good",
            PaintCondition::Fair => "Fair",
            PaintCondition::Poor => "Poor",
            PaintCondition::Missing => "Missing",
        };
        f.write_str(label)
    }
}

/// Marine growth on the hull
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthLevel {
    #[serde(alias = "minimal")]
    Minimal,
    #[serde(alias = "moderate")]
    Moderate,
    #[serde(alias = "heavy")]
    Heavy,
    #[serde(alias = "severe")]
    Severe,
}

impl fmt::Display for GrowthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GrowthLevel::Minimal => "Minimal",
            GrowthLevel::Moderate => "Moderate",
            GrowthLevel::Heavy => "Heavy",
            GrowthLevel::Severe => "Severe",
        };
        f.write_str(label)
    }
}

/// Time since the hull was last painted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LastPainted {
    #[serde(rename = "0-6_months")]
    UpTo6Months,
    #[serde(rename = "7-12_months")]
    UpTo12Months,
    #[serde(rename = "13-21_months")]
    UpTo21Months,
    #[serde(rename = "22-24_months")]
    UpTo24Months,
    #[serde(rename = "over_24_months")]
    Over24Months,
    #[serde(rename = "unsure_paint")]
    Unsure,
}

/// Time since the hull was last cleaned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LastCleaned {
    #[serde(rename = "0-2_months")]
    UpTo2Months,
    #[serde(rename = "3-4_months")]
    UpTo4Months,
    #[serde(rename = "5-6_months")]
    UpTo6Months,
    #[serde(rename = "7-8_months")]
    UpTo8Months,
    #[serde(rename = "9-12_months")]
    UpTo12Months,
    #[serde(rename = "13-24_months")]
    UpTo24Months,
    #[serde(rename = "over_24_months_unsure")]
    Over24MonthsOrUnsure,
}

/// Infer paint condition from paint age; unknown age is treated as poor
pub fn paint_condition_from_age(last_painted: Option<LastPainted>) -> PaintCondition {
    match last_painted {
        Some(LastPainted::UpTo6Months) => PaintCondition::Excellent,
        Some(LastPainted::UpTo12Months) => PaintCondition::Good,
        Some(LastPainted::UpTo21Months) => PaintCondition::Fair,
        _ => PaintCondition::Poor,
    }
}

/// Infer growth level from paint condition and time since cleaning
pub fn growth_level_from_history(
    paint: PaintCondition,
    last_cleaned: Option<LastCleaned>,
) -> GrowthLevel {
    use LastCleaned::*;

    match (paint, last_cleaned) {
        (PaintCondition::Excellent | PaintCondition::Good, Some(UpTo2Months)) => GrowthLevel::Minimal,
        (PaintCondition::Excellent | PaintCondition::Good, Some(UpTo4Months)) => GrowthLevel::Moderate,
        (PaintCondition::Excellent | PaintCondition::Good, Some(UpTo6Months | UpTo8Months)) => {
            GrowthLevel::Heavy
        }
        (PaintCondition::Fair, Some(UpTo2Months)) => GrowthLevel::Moderate,
        (PaintCondition::Fair, Some(UpTo4Months | UpTo6Months)) => GrowthLevel::Heavy,
        (PaintCondition::Poor, Some(UpTo2Months | UpTo4Months)) => GrowthLevel::Heavy,
        _ => GrowthLevel::Severe,
    }
}

/// Surcharge for an observed paint condition (admin mode)
pub fn paint_surcharge_observed(paint: PaintCondition) -> f64 {
    match paint {
        PaintCondition::Poor => surcharges::PAINT_POOR,
        PaintCondition::Missing => surcharges::PAINT_MISSING,
        _ => 0.0,
    }
}

/// Surcharge for an estimated paint condition
///
/// Without a paint age the observed-condition table applies.
pub fn paint_surcharge_estimated(paint: PaintCondition, last_painted: Option<LastPainted>) -> f64 {
    let Some(age) = last_painted else {
        return paint_surcharge_observed(paint);
    };

    if paint != PaintCondition::Poor {
        return 0.0;
    }

    match age {
        LastPainted::UpTo24Months => 0.05,
        LastPainted::Over24Months | LastPainted::Unsure => 0.15,
        _ => 0.0,
    }
}

/// Surcharge for an observed growth level (admin mode)
pub fn growth_surcharge_observed(growth: GrowthLevel) -> f64 {
    match growth {
        GrowthLevel::Heavy => surcharges::GROWTH_HEAVY,
        GrowthLevel::Severe => surcharges::GROWTH_SEVERE,
        GrowthLevel::Minimal | GrowthLevel::Moderate => 0.0,
    }
}

/// Detailed growth surcharge from paint condition and cleaning history
///
/// Missing cleaning history yields no growth surcharge.
pub fn growth_surcharge_estimated(paint: PaintCondition, last_cleaned: Option<LastCleaned>) -> f64 {
    use LastCleaned::*;

    let Some(cleaned) = last_cleaned else {
        return 0.0;
    };

    match paint {
        PaintCondition::Excellent => match cleaned {
            UpTo2Months | UpTo4Months => 0.0,
            UpTo6Months => 0.25,
            UpTo8Months => 0.40,
            UpTo12Months => 0.70,
            UpTo24Months => 0.85,
            Over24MonthsOrUnsure => 1.00,
        },
        PaintCondition::Good => match cleaned {
            UpTo2Months | UpTo4Months => 0.0,
            UpTo6Months => 0.25,
            UpTo8Months => 0.40,
            UpTo12Months => 0.75,
            UpTo24Months => 0.90,
            Over24MonthsOrUnsure => 1.00,
        },
        PaintCondition::Fair => match cleaned {
            UpTo2Months => 0.0,
            UpTo4Months => 0.25,
            UpTo6Months => 0.40,
            UpTo8Months => 0.70,
            UpTo12Months => 0.85,
            UpTo24Months => 0.95,
            Over24MonthsOrUnsure => 1.00,
        },
        PaintCondition::Poor => match cleaned {
            UpTo2Months => 0.30,
            UpTo4Months => 0.50,
            UpTo6Months => 0.80,
            UpTo8Months => 0.90,
            UpTo12Months => 0.95,
            UpTo24Months | Over24MonthsOrUnsure => 1.00,
        },
        PaintCondition::Missing => 1.00,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_condition_buckets() {
        assert_eq!(paint_condition_from_age(Some(LastPainted::UpTo6Months)), PaintCondition::Excellent);
        assert_eq!(paint_condition_from_age(Some(LastPainted::UpTo12Months)), PaintCondition::Good);
        assert_eq!(paint_condition_from_age(Some(LastPainted::UpTo21Months)), PaintCondition::Fair);
        assert_eq!(paint_condition_from_age(Some(LastPainted::UpTo24Months)), PaintCondition::Poor);
        assert_eq!(paint_condition_from_age(Some(LastPainted::Unsure)), PaintCondition::Poor);
        assert_eq!(paint_condition_from_age(None), PaintCondition::Poor);
    }

    #[test]
    fn test_growth_level_depends_on_paint() {
        let cleaned = Some(LastCleaned::UpTo2Months);
        assert_eq!(growth_level_from_history(PaintCondition::Excellent, cleaned), GrowthLevel::Minimal);
        assert_eq!(growth_level_from_history(PaintCondition::Fair, cleaned), GrowthLevel::Moderate);
        assert_eq!(growth_level_from_history(PaintCondition::Poor, cleaned), GrowthLevel::Heavy);

        let stale = Some(LastCleaned::UpTo12Months);
        assert_eq!(growth_level_from_history(PaintCondition::Good, stale), GrowthLevel::Severe);
        assert_eq!(growth_level_from_history(PaintCondition::Good, None), GrowthLevel::Severe);
    }

    #[test]
    fn test_estimated_paint_surcharge_only_for_poor() {
        assert_eq!(
            paint_surcharge_estimated(PaintCondition::Good, Some(LastPainted::UpTo12Months)),
            0.0
        );
        assert_eq!(
            paint_surcharge_estimated(PaintCondition::Poor, Some(LastPainted::UpTo24Months)),
            0.05
        );
        assert_eq!(
            paint_surcharge_estimated(PaintCondition::Poor, Some(LastPainted::Unsure)),
            0.15
        );
        // No paint age falls back to the observed table
        assert_eq!(paint_surcharge_estimated(PaintCondition::Poor, None), 0.10);
    }

    #[test]
    fn test_observed_surcharges() {
        assert_eq!(paint_surcharge_observed(PaintCondition::Missing), 0.15);
        assert_eq!(paint_surcharge_observed(PaintCondition::Fair), 0.0);
        assert_eq!(growth_surcharge_observed(GrowthLevel::Heavy), 0.35);
        assert_eq!(growth_surcharge_observed(GrowthLevel::Severe), 2.0);
        assert_eq!(growth_surcharge_observed(GrowthLevel::Moderate), 0.0);
    }

    #[test]
    fn test_estimated_growth_surcharge_table() {
        assert_eq!(
            growth_surcharge_estimated(PaintCondition::Good, Some(LastCleaned::UpTo12Months)),
            0.75
        );
        assert_eq!(
            growth_surcharge_estimated(PaintCondition::Poor, Some(LastCleaned::UpTo2Months)),
            0.30
        );
        assert_eq!(growth_surcharge_estimated(PaintCondition::Fair, None), 0.0);
    }

    #[test]
    fn test_wire_buckets_deserialize() {
        let painted: LastPainted = serde_json::from_str("\"13-21_months\"").unwrap();
        assert_eq!(painted, LastPainted::UpTo21Months);
        let cleaned: LastCleaned = serde_json::from_str("\"over_24_months_unsure\"").unwrap();
        assert_eq!(cleaned, LastCleaned::Over24MonthsOrUnsure);
        let paint: PaintCondition = serde_json::from_str("\"poor\"").unwrap();
        assert_eq!(paint, PaintCondition::Poor);
    }
}
