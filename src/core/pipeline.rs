//! End-to-end risk scoring.
//!
//! raw inputs → feature vector → scaled vector → base prediction →
//! modified score → category, plus per-metric recommendations.

use crate::core::advice::{recommendations, Recommendation};
use crate::core::artifact::ArtifactError;
use crate::core::classify::RiskCategory;
use crate::core::features::{build_features, ActivityLevel, BmiCategory};
use crate::core::model::{RiskModel, TreeEnsemble};
use crate::core::modifiers::{apply_modifiers, AppliedModifier};
use crate::core::scaler::{FeatureScaler, StandardScaler};
use crate::input::{DailyEntry, UserProfile, ValidationError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Outcome of one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    /// Raw model output
    pub base_score: f64,
    /// Base plus modifiers, clamped to [0, 100]
    pub final_score: f64,
    pub category: RiskCategory,
    pub applied_modifiers: Vec<AppliedModifier>,
    pub bmi: f64,
    pub bmi_category: BmiCategory,
    pub activity_level: ActivityLevel,
    pub recommendations: Vec<Recommendation>,
}

/// Errors that stop a single assessment.
#[derive(Debug)]
pub enum ScoringError {
    /// Inputs could not form a feature vector
    Validation(ValidationError),
    /// The model produced NaN or infinity
    NonFinitePrediction(f64),
}

impl std::fmt::Display for ScoringError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoringError::Validation(e) => write!(f, "Invalid input: {e}"),
            ScoringError::NonFinitePrediction(v) => {
                write!(f, "Model produced a non-finite prediction: {v}")
            }
        }
    }
}

impl std::error::Error for ScoringError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScoringError::Validation(e) => Some(e),
            ScoringError::NonFinitePrediction(_) => None,
        }
    }
}

impl From<ValidationError> for ScoringError {
    fn from(e: ValidationError) -> Self {
        ScoringError::Validation(e)
    }
}

/// Scaler and model pair that scores assessments.
pub struct RiskScorer<S = StandardScaler, M = TreeEnsemble> {
    scaler: S,
    model: M,
}

impl RiskScorer {
    /// Load both artifacts from disk. Either one missing is fatal for scoring.
    pub fn load(model_path: &Path, scaler_path: &Path) -> Result<Self, ArtifactError> {
        let scaler = StandardScaler::load(scaler_path)?;
        let model = TreeEnsemble::load(model_path)?;
        Ok(Self::new(scaler, model))
    }
}

impl<S: FeatureScaler, M: RiskModel> RiskScorer<S, M> {
    pub fn new(scaler: S, model: M) -> Self {
        Self { scaler, model }
    }

    /// Score one profile and daily entry.
    pub fn assess(
        &self,
        profile: &UserProfile,
        entry: &DailyEntry,
    ) -> Result<RiskResult, ScoringError> {
        let features = build_features(profile, entry)?;
        tracing::debug!(raw = ?features.as_slice(), "Built feature vector");

        let scaled = self.scaler.scale(&features);
        tracing::debug!(scaled = ?scaled.as_slice(), "Scaled features");

        let base_score = self.model.predict(&scaled);
        if !base_score.is_finite() {
            return Err(ScoringError::NonFinitePrediction(base_score));
        }
        tracing::debug!(base_score, "Model prediction");

        let modified = apply_modifiers(base_score, entry);
        let category = RiskCategory::from_score(modified.score);
        tracing::debug!(
            final_score = modified.score,
            modifier_points = modified.total_points,
            category = %category,
            "Applied risk modifiers"
        );

        let bmi = features.0[2];

        Ok(RiskResult {
            base_score,
            final_score: modified.score,
            category,
            applied_modifiers: modified.applied,
            bmi,
            bmi_category: BmiCategory::from_bmi(bmi),
            activity_level: ActivityLevel::from_minutes(entry.activity_minutes),
            recommendations: recommendations(profile, entry),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::features::FeatureVector;
    use crate::input::{Adherence, Diet, Hydration, StressLevel};

    struct ConstantModel(f64);

    impl RiskModel for ConstantModel {
        fn predict(&self, _scaled: &FeatureVector) -> f64 {
            self.0
        }
    }

    fn profile() -> UserProfile {
        UserProfile {
            user_id: "u-1".to_string(),
            name: "Alex".to_string(),
            age: 42,
            weight_kg: 75.5,
            height_cm: 175.0,
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
    fn test_all_modifiers_on_base() {
        let scorer = RiskScorer::new(StandardScaler::identity(), ConstantModel(10.0));
        let result = scorer.assess(&profile(), &worst_entry()).unwrap();
        assert_eq!(result.base_score, 10.0);
        assert_eq!(result.final_score, 65.0);
        assert_eq!(result.category, RiskCategory::High);
        assert_eq!(result.applied_modifiers.len(), 6);
    }

    #[test]
    fn test_final_score_clamped() {
        let scorer = RiskScorer::new(StandardScaler::identity(), ConstantModel(80.0));
        let result = scorer.assess(&profile(), &worst_entry()).unwrap();
        assert_eq!(result.final_score, 100.0);
    }

    #[test]
    fn test_non_finite_prediction() {
        let scorer = RiskScorer::new(StandardScaler::identity(), ConstantModel(f64::NAN));
        assert!(matches!(
            scorer.assess(&profile(), &worst_entry()),
            Err(ScoringError::NonFinitePrediction(_))
        ));
    }

    #[test]
    fn test_bmi_reported() {
        let scorer = RiskScorer::new(StandardScaler::identity(), ConstantModel(0.0));
        let result = scorer.assess(&profile(), &worst_entry()).unwrap();
        assert!((result.bmi - 24.65).abs() < 0.01);
        assert_eq!(result.bmi_category, BmiCategory::Normal);
        assert_eq!(result.recommendations.len(), 8);
    }

    #[test]
    fn test_deterministic() {
        let scorer = RiskScorer::new(StandardScaler::identity(), ConstantModel(33.3));
        let a = scorer.assess(&profile(), &worst_entry()).unwrap();
        let b = scorer.assess(&profile(), &worst_entry()).unwrap();
        assert_eq!(a, b);
    }
}
