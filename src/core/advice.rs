//! Per-metric recommendations shown alongside a risk score.

use crate::core::features::{compute_bmi, ActivityLevel, BmiCategory};
use crate::input::{Adherence, DailyEntry, Diet, Hydration, StressLevel, UserProfile};
use serde::{Deserialize, Serialize};

/// Glucose readings above this are critically high (mg/dL).
const EXTREME_GLUCOSE: u32 = 300;
/// Glucose readings above this are elevated (mg/dL).
const HIGH_GLUCOSE: u32 = 180;
/// Glucose readings below this are low (mg/dL).
const LOW_GLUCOSE: u32 = 70;

const MIN_RECOMMENDED_SLEEP: f64 = 7.0;
const MAX_RECOMMENDED_SLEEP: f64 = 9.0;

/// Blood glucose reading status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlucoseStatus {
    Low,
    Normal,
    High,
    Extreme,
}

impl GlucoseStatus {
    pub fn from_reading(mg_dl: u32) -> Self {
        if mg_dl > EXTREME_GLUCOSE {
            GlucoseStatus::Extreme
        } else if mg_dl < LOW_GLUCOSE {
            GlucoseStatus::Low
        } else if mg_dl > HIGH_GLUCOSE {
            GlucoseStatus::High
        } else {
            GlucoseStatus::Normal
        }
    }
}

/// Sleep duration status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepStatus {
    Low,
    Optimal,
    High,
}

impl SleepStatus {
    pub fn from_hours(hours: f64) -> Self {
        if hours < MIN_RECOMMENDED_SLEEP {
            SleepStatus::Low
        } else if hours > MAX_RECOMMENDED_SLEEP {
            SleepStatus::High
        } else {
            SleepStatus::Optimal
        }
    }
}

/// Advice for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Metric title
    pub metric: String,
    /// Reported value as displayed
    pub value: String,
    pub advice: String,
}

impl Recommendation {
    fn new(metric: &str, value: String, advice: &str) -> Self {
        Self {
            metric: metric.to_string(),
            value,
            advice: advice.to_string(),
        }
    }
}

fn activity_advice(level: ActivityLevel) -> &'static str {
    match level {
        ActivityLevel::Low => {
            "Less than 30 minutes of activity. Aim for at least 30 minutes of moderate exercise daily."
        }
        ActivityLevel::Moderate => {
            "Good activity level! Try to maintain or gradually increase your activity."
        }
        ActivityLevel::High => {
            "Excellent activity level! Remember to stay hydrated and rest adequately."
        }
    }
}

fn bmi_advice(category: BmiCategory) -> &'static str {
    match category {
        BmiCategory::Underweight => {
            "Consider increasing caloric intake and strength training exercises."
        }
        BmiCategory::Normal => {
            "Great job maintaining a healthy weight! Keep up your current habits."
        }
        BmiCategory::Overweight => {
            "Consider increasing physical activity and watching portion sizes."
        }
        BmiCategory::Obese => {
            "Please consult with a healthcare provider about a weight management plan."
        }
    }
}

fn glucose_advice(status: GlucoseStatus) -> &'static str {
    match status {
        GlucoseStatus::Low => {
            "Blood glucose is low. Consider regular small meals and consulting your doctor."
        }
        GlucoseStatus::Normal => {
            "Blood glucose is in a healthy range. Maintain your current diet and medication routine."
        }
        GlucoseStatus::High => {
            "Blood glucose is elevated. Review your diet and medication adherence."
        }
        GlucoseStatus::Extreme => {
            "Blood glucose level is critically high. Please seek medical attention immediately!"
        }
    }
}

fn diet_advice(diet: Diet) -> &'static str {
    match diet {
        Diet::Healthy => "Excellent dietary choices! Keep maintaining a balanced, healthy diet.",
        Diet::Unhealthy => "Consider incorporating more whole foods and reducing processed foods.",
    }
}

fn medication_advice(adherence: Adherence) -> &'static str {
    match adherence {
        Adherence::Good => "Great medication adherence! Keep maintaining this routine.",
        Adherence::Poor => "Important to take medications as prescribed. Set reminders if needed.",
    }
}

fn stress_advice(stress: StressLevel) -> &'static str {
    match stress {
        StressLevel::Low => "Great stress management! Keep using your effective coping strategies.",
        StressLevel::Medium => "Consider stress-reduction techniques like meditation or yoga.",
        StressLevel::High => {
            "High stress detected. Please prioritize stress management and consider professional support."
        }
    }
}

fn sleep_advice(status: SleepStatus) -> &'static str {
    match status {
        SleepStatus::Low => "Less than 7 hours of sleep. Aim for 7-9 hours for better health.",
        SleepStatus::Optimal => {
            "Great sleep duration! Keep maintaining this healthy sleep schedule."
        }
        SleepStatus::High => {
            "More than 9 hours of sleep. Consider consulting your healthcare provider."
        }
    }
}

fn hydration_advice(hydration: Hydration) -> &'static str {
    match hydration {
        Hydration::Yes => "Well hydrated! Keep drinking water throughout the day.",
        Hydration::No => "Increase your water intake for better blood sugar control.",
    }
}

/// Build one recommendation per tracked metric, in display order.
pub fn recommendations(profile: &UserProfile, entry: &DailyEntry) -> Vec<Recommendation> {
    let activity = ActivityLevel::from_minutes(entry.activity_minutes);
    let bmi_category = BmiCategory::from_bmi(compute_bmi(profile.weight_kg, profile.height_cm));
    let glucose = GlucoseStatus::from_reading(entry.glucose_mg_dl);
    let sleep = SleepStatus::from_hours(entry.sleep_hours);

    vec![
        Recommendation::new(
            "Physical Activity",
            format!("{} ({} min)", activity.label(), entry.activity_minutes),
            activity_advice(activity),
        ),
        Recommendation::new(
            "BMI Status",
            bmi_category.label().to_string(),
            bmi_advice(bmi_category),
        ),
        Recommendation::new(
            "Blood Glucose",
            format!("{} mg/dL", entry.glucose_mg_dl),
            glucose_advice(glucose),
        ),
        Recommendation::new("Diet", entry.diet.as_str().to_string(), diet_advice(entry.diet)),
        Recommendation::new(
            "Medication",
            entry.adherence.as_str().to_string(),
            medication_advice(entry.adherence),
        ),
        Recommendation::new(
            "Stress Level",
            entry.stress.as_str().to_string(),
            stress_advice(entry.stress),
        ),
        Recommendation::new(
            "Sleep",
            format!("{} hours", entry.sleep_hours),
            sleep_advice(sleep),
        ),
        Recommendation::new(
            "Hydration",
            entry.hydration.as_str().to_string(),
            hydration_advice(entry.hydration),
        ),
    ]
}
