//! Typed health inputs.
//!
//! Values in this module have already passed form validation. Categorical
//! answers are kept as enums so the feature encoding lives in one place.

use serde::{Deserialize, Serialize};

/// Static profile data; fixed for the rest of a session once submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Caller-supplied identifier
    pub user_id: String,
    /// Display name
    pub name: String,
    /// Age in whole years
    pub age: u32,
    /// Body weight in kilograms
    pub weight_kg: f64,
    /// Height in centimetres
    pub height_cm: f64,
}

/// Diet quality reported for the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diet {
    Healthy,
    Unhealthy,
}

impl Diet {
    pub const CHOICES: &'static [&'static str] = &["healthy", "unhealthy"];

    /// Parse a case-insensitive answer.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "healthy" => Some(Diet::Healthy),
            "unhealthy" => Some(Diet::Unhealthy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Diet::Healthy => "healthy",
            Diet::Unhealthy => "unhealthy",
        }
    }

    /// Training-time encoding: healthy = 1.
    pub fn encode(&self) -> f64 {
        match self {
            Diet::Healthy => 1.0,
            Diet::Unhealthy => 0.0,
        }
    }
}

/// Medication adherence reported for the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adherence {
    Good,
    Poor,
}

impl Adherence {
    pub const CHOICES: &'static [&'static str] = &["good", "poor"];

    /// Parse a case-insensitive answer.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "good" => Some(Adherence::Good),
            "poor" => Some(Adherence::Poor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Adherence::Good => "good",
            Adherence::Poor => "poor",
        }
    }

    /// Training-time encoding: good = 1.
    pub fn encode(&self) -> f64 {
        match self {
            Adherence::Good => 1.0,
            Adherence::Poor => 0.0,
        }
    }
}

/// Self-reported stress category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressLevel {
    Low,
    Medium,
    High,
}

impl StressLevel {
    pub const CHOICES: &'static [&'static str] = &["low", "medium", "high"];

    /// Parse a case-insensitive answer.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(StressLevel::Low),
            "medium" => Some(StressLevel::Medium),
            "high" => Some(StressLevel::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StressLevel::Low => "low",
            StressLevel::Medium => "medium",
            StressLevel::High => "high",
        }
    }

    /// Ordinal encoding: low = 0, medium = 1, high = 2.
    pub fn encode(&self) -> f64 {
        match self {
            StressLevel::Low => 0.0,
            StressLevel::Medium => 1.0,
            StressLevel::High => 2.0,
        }
    }
}

/// Whether the user drank enough water.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hydration {
    Yes,
    No,
}

impl Hydration {
    pub const CHOICES: &'static [&'static str] = &["yes", "no"];

    /// Parse a case-insensitive answer.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "yes" => Some(Hydration::Yes),
            "no" => Some(Hydration::No),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Hydration::Yes => "yes",
            Hydration::No => "no",
        }
    }

    /// Training-time encoding: yes = 1.
    pub fn encode(&self) -> f64 {
        match self {
            Hydration::Yes => 1.0,
            Hydration::No => 0.0,
        }
    }
}

/// One day of self-reported metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    /// Blood glucose in mg/dL
    pub glucose_mg_dl: u32,
    /// Minutes of physical activity
    pub activity_minutes: u32,
    pub diet: Diet,
    pub adherence: Adherence,
    pub stress: StressLevel,
    /// Hours slept
    pub sleep_hours: f64,
    pub hydration: Hydration,
}
