//! Core functionality for glycorisk.
//!
//! This module contains:
//! - Feature vector assembly in training order
//! - Scaler and gradient-boosted model artifacts
//! - Rule-based risk modifiers and category classification
//! - Per-metric recommendations
//! - FHIR bundle building for export

pub mod advice;
pub mod artifact;
pub mod classify;
pub mod features;
pub mod fhir;
pub mod model;
pub mod modifiers;
pub mod pipeline;
pub mod scaler;

// Re-export commonly used types
pub use advice::{recommendations, GlucoseStatus, Recommendation, SleepStatus};
pub use artifact::ArtifactError;
pub use classify::RiskCategory;
pub use features::{
    build_features, compute_bmi, ActivityLevel, BmiCategory, FeatureVector, FEATURE_COUNT,
    FEATURE_NAMES,
};
pub use fhir::{Bundle, ExportError, FhirBuilder, FHIR_VERSION, PRODUCER_NAME};
pub use model::{RiskModel, TreeEnsemble};
pub use modifiers::{apply_modifiers, AppliedModifier, ModifiedScore, RISK_MODIFIERS};
pub use pipeline::{RiskResult, RiskScorer, ScoringError};
pub use scaler::{FeatureScaler, StandardScaler};
