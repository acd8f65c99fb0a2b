//! Feature vector assembly.
//!
//! The order and encoding here are a contract with the persisted scaler and
//! model artifacts. Changing either requires retrained artifacts.

use crate::input::{DailyEntry, UserProfile, ValidationError};
use serde::{Deserialize, Serialize};

/// Number of model inputs.
pub const FEATURE_COUNT: usize = 10;

/// Feature names in training order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "weight",
    "height",
    "bmi",
    "blood_glucose",
    "physical_activity",
    "diet",
    "medication_adherence",
    "stress_level",
    "sleep_hours",
    "hydration_level",
];

/// Activity below this many minutes counts as low.
const LOW_ACTIVITY_MINUTES: u32 = 30;

/// Activity below this many minutes (and at least the low bound) is moderate.
const HIGH_ACTIVITY_MINUTES: u32 = 60;

/// Fixed-order model input, raw or scaled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Look up a value by feature name.
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.0[i])
    }

}

/// Body mass index from kilograms and centimetres.
pub fn compute_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// Coarse activity bucket used for advice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Low,
    Moderate,
    High,
}

impl ActivityLevel {
    pub fn from_minutes(minutes: u32) -> Self {
        if minutes < LOW_ACTIVITY_MINUTES {
            ActivityLevel::Low
        } else if minutes < HIGH_ACTIVITY_MINUTES {
            ActivityLevel::Moderate
        } else {
            ActivityLevel::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityLevel::Low => "Low",
            ActivityLevel::Moderate => "Moderate",
            ActivityLevel::High => "High",
        }
    }
}

/// WHO adult BMI category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal weight",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        }
    }
}

/// Build the model input from a profile and a daily entry.
///
/// Fails if the profile's measurements cannot yield a finite BMI.
pub fn build_features(
    profile: &UserProfile,
    entry: &DailyEntry,
) -> Result<FeatureVector, ValidationError> {
    if !(profile.weight_kg.is_finite() && profile.weight_kg > 0.0) {
        return Err(ValidationError::out_of_range(
            "weight",
            "must be a positive number",
        ));
    }
    if !(profile.height_cm.is_finite() && profile.height_cm > 0.0) {
        return Err(ValidationError::out_of_range(
            "height",
            "must be a positive number",
        ));
    }
    if !entry.sleep_hours.is_finite() {
        return Err(ValidationError::out_of_range("sleep_hours", "must be finite"));
    }

    let bmi = compute_bmi(profile.weight_kg, profile.height_cm);
    if !bmi.is_finite() {
        return Err(ValidationError::out_of_range(
            "height",
            "too small to compute a BMI",
        ));
    }

    Ok(FeatureVector([
        profile.weight_kg,
        profile.height_cm,
        bmi,
        entry.glucose_mg_dl as f64,
        entry.activity_minutes as f64,
        entry.diet.encode(),
        entry.adherence.encode(),
        entry.stress.encode(),
        entry.sleep_hours,
        entry.hydration.encode(),
    ]))
}
