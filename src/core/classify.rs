//! Risk category buckets for final scores.

use serde::{Deserialize, Serialize};

/// Scores strictly below this are low risk.
pub const MODERATE_RISK_FLOOR: f64 = 30.0;

/// Scores strictly above this are high risk.
pub const MODERATE_RISK_CEILING: f64 = 60.0;

/// Diabetes risk category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
}

impl RiskCategory {
    /// Both moderate bounds are inclusive.
    pub fn from_score(score: f64) -> Self {
        if score < MODERATE_RISK_FLOOR {
            RiskCategory::Low
        } else if score <= MODERATE_RISK_CEILING {
            RiskCategory::Moderate
        } else {
            RiskCategory::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskCategory::Low => "Low",
            RiskCategory::Moderate => "Moderate",
            RiskCategory::High => "High",
        }
    }

    /// Short guidance shown next to the score.
    pub fn description(&self) -> &'static str {
        match self {
            RiskCategory::Low => "Keep up your current habits",
            RiskCategory::Moderate => "Some risk factors need attention",
            RiskCategory::High => "Urgent attention needed, talk to your clinician",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(RiskCategory::from_score(29.9), RiskCategory::Low);
        assert_eq!(RiskCategory::from_score(30.0), RiskCategory::Moderate);
        assert_eq!(RiskCategory::from_score(60.0), RiskCategory::Moderate);
        assert_eq!(RiskCategory::from_score(60.1), RiskCategory::High);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(RiskCategory::from_score(0.0), RiskCategory::Low);
        assert_eq!(RiskCategory::from_score(100.0), RiskCategory::High);
    }
}
