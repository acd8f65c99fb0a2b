//! Rule-based adjustments applied on top of the model's base prediction.
//!
//! Each rule looks only at raw (unscaled) daily inputs. Rules are independent
//! and additive, so the order in which they are evaluated never matters.

use crate::input::{Adherence, DailyEntry, Hydration, StressLevel};
use serde::{Deserialize, Serialize};

/// Lowest possible risk score.
pub const MIN_SCORE: f64 = 0.0;

/// Highest possible risk score.
pub const MAX_SCORE: f64 = 100.0;

/// A fixed point adjustment triggered by a threshold on a raw input.
#[derive(Clone, Copy)]
pub struct RiskModifier {
    pub name: &'static str,
    pub points: f64,
    pub description: &'static str,
    applies: fn(&DailyEntry) -> bool,
}

impl std::fmt::Debug for RiskModifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskModifier")
            .field("name", &self.name)
            .field("points", &self.points)
            .finish()
    }
}

impl RiskModifier {
    pub fn applies_to(&self, entry: &DailyEntry) -> bool {
        (self.applies)(entry)
    }
}

/// All adjustment rules.
pub const RISK_MODIFIERS: [RiskModifier; 6] = [
    RiskModifier {
        name: "high_blood_glucose",
        points: 15.0,
        description: "Blood glucose above 180 mg/dL",
        applies: |e: &DailyEntry| e.glucose_mg_dl > 180,
    },
    RiskModifier {
        name: "low_activity",
        points: 10.0,
        description: "Less than 30 minutes of activity",
        applies: |e: &DailyEntry| e.activity_minutes < 30,
    },
    RiskModifier {
        name: "poor_medication",
        points: 10.0,
        description: "Poor medication adherence",
        applies: |e: &DailyEntry| e.adherence == Adherence::Poor,
    },
    RiskModifier {
        name: "poor_sleep",
        points: 8.0,
        description: "Less than 6 hours of sleep",
        applies: |e: &DailyEntry| e.sleep_hours < 6.0,
    },
    RiskModifier {
        name: "high_stress",
        points: 7.0,
        description: "High stress level",
        applies: |e: &DailyEntry| e.stress == StressLevel::High,
    },
    RiskModifier {
        name: "poor_hydration",
        points: 5.0,
        description: "Not adequately hydrated",
        applies: |e: &DailyEntry| e.hydration == Hydration::No,
    },
];

/// A rule that fired for an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedModifier {
    pub name: String,
    pub points: f64,
    /// Human readable trigger, e.g. "Blood glucose above 180 mg/dL"
    pub description: String,
}

/// Base prediction after rule adjustments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifiedScore {
    /// Clamped final score
    pub score: f64,
    /// Sum of applied points before clamping
    pub total_points: f64,
    pub applied: Vec<AppliedModifier>,
}

/// Rules that fire for an entry.
pub fn applicable_modifiers(entry: &DailyEntry) -> Vec<AppliedModifier> {
    RISK_MODIFIERS
        .iter()
        .filter(|m| m.applies_to(entry))
        .map(|m| AppliedModifier {
            name: m.name.to_string(),
            points: m.points,
            description: m.description.to_string(),
        })
        .collect()
}

/// Add every applicable adjustment to `base` and clamp into the score range.
pub fn apply_modifiers(base: f64, entry: &DailyEntry) -> ModifiedScore {
    let applied = applicable_modifiers(entry);
    let total_points: f64 = applied.iter().map(|m| m.points).sum();

    ModifiedScore {
        score: clamp_score(base + total_points),
        total_points,
        applied,
    }
}

/// Clamp a score into `[MIN_SCORE, MAX_SCORE]`.
pub fn clamp_score(score: f64) -> f64 {
    score.clamp(MIN_SCORE, MAX_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Diet;

    fn healthy_entry() -> DailyEntry {
        DailyEntry {
            glucose_mg_dl: 110,
            activity_minutes: 45,
            diet: Diet::Healthy,
            adherence: Adherence::Good,
            stress: StressLevel::Low,
            sleep_hours: 7.5,
            hydration: Hydration::Yes,
        }
    }

    fn worst_entry() -> DailyEntry {
        DailyEntry {
            glucose_mg_dl: 200,
            activity_minutes: 20,
            diet: Diet::Unhealthy,
            adherence: Adherence::Poor,
            stress: StressLevel::High,
            sleep_hours: 5.0,
            hydration: Hydration::No,
        }
    }

    #[test]
    fn test_no_modifiers_for_healthy_day() {
        let result = apply_modifiers(25.0, &healthy_entry());
        assert!(result.applied.is_empty());
        assert_eq!(result.score, 25.0);
    }

    #[test]
    fn test_all_modifiers_apply() {
        let result = apply_modifiers(20.0, &worst_entry());
        assert_eq!(result.applied.len(), 6);
        assert_eq!(result.total_points, 55.0);
        assert_eq!(result.score, 75.0);
    }

    #[test]
    fn test_clamped_at_max() {
        let result = apply_modifiers(60.0, &worst_entry());
        assert_eq!(result.total_points, 55.0);
        assert_eq!(result.score, MAX_SCORE);
    }

    #[test]
    fn test_negative_base_clamped_at_min() {
        assert_eq!(apply_modifiers(-12.0, &healthy_entry()).score, MIN_SCORE);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let mut entry = healthy_entry();
        entry.glucose_mg_dl = 180;
        entry.activity_minutes = 30;
        entry.sleep_hours = 6.0;
        assert!(applicable_modifiers(&entry).is_empty());

        entry.glucose_mg_dl = 181;
        let applied = applicable_modifiers(&entry);
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].name, "high_blood_glucose");
        assert_eq!(applied[0].points, 15.0);
        assert_eq!(applied[0].description, "Blood glucose above 180 mg/dL");
    }

    #[test]
    fn test_medium_stress_does_not_apply() {
        let mut entry = healthy_entry();
        entry.stress = StressLevel::Medium;
        assert!(applicable_modifiers(&entry).is_empty());
    }
}
