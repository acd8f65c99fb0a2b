//! Raw form input and validation.
//!
//! Forms hold exactly what the user typed. `validate` turns them into typed
//! values or a [`ValidationError`] naming the first offending field.

use crate::input::types::{Adherence, DailyEntry, Diet, Hydration, StressLevel, UserProfile};
use serde::{Deserialize, Serialize};

/// Upper bound on plausible glucose readings (mg/dL).
const MAX_GLUCOSE_MG_DL: u32 = 1000;

/// Minutes in a day.
const MAX_ACTIVITY_MINUTES: u32 = 24 * 60;

const MAX_SLEEP_HOURS: f64 = 24.0;
const MAX_AGE: u32 = 130;
const MAX_WEIGHT_KG: f64 = 500.0;
const MIN_HEIGHT_CM: f64 = 30.0;
const MAX_HEIGHT_CM: f64 = 300.0;

/// Why a field was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationErrorKind {
    /// Field was absent or blank
    Missing,
    /// Field could not be read as a number
    NotANumber(String),
    /// Field must be a non-negative whole number
    NotAWholeNumber(String),
    /// Field parsed but lies outside the accepted range
    OutOfRange(String),
    /// Field is not one of the allowed answers
    InvalidChoice {
        value: String,
        allowed: &'static [&'static str],
    },
}

/// A rejected form field.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Name of the offending field
    pub field: &'static str,
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    pub fn missing(field: &'static str) -> Self {
        Self {
            field,
            kind: ValidationErrorKind::Missing,
        }
    }

    pub fn out_of_range(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            kind: ValidationErrorKind::OutOfRange(reason.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ValidationErrorKind::Missing => write!(f, "{}: field is required", self.field),
            ValidationErrorKind::NotANumber(v) => {
                write!(f, "{}: '{v}' is not a number", self.field)
            }
            ValidationErrorKind::NotAWholeNumber(v) => {
                write!(f, "{}: '{v}' must be a non-negative whole number", self.field)
            }
            ValidationErrorKind::OutOfRange(reason) => write!(f, "{}: {reason}", self.field),
            ValidationErrorKind::InvalidChoice { value, allowed } => write!(
                f,
                "{}: '{value}' must be one of {}",
                self.field,
                allowed.join(", ")
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Profile screen as typed by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileForm {
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub age: Option<String>,
    pub weight: Option<String>,
    pub height: Option<String>,
}

impl ProfileForm {
    /// Validate the form into a [`UserProfile`].
    pub fn validate(&self) -> Result<UserProfile, ValidationError> {
        let user_id = required("user_id", &self.user_id)?.to_string();
        let name = required("name", &self.name)?.to_string();

        let age = parse_whole("age", &self.age)?;
        if age == 0 || age > MAX_AGE {
            return Err(ValidationError::out_of_range(
                "age",
                format!("must be between 1 and {MAX_AGE}"),
            ));
        }

        let weight_kg = parse_number("weight", &self.weight)?;
        if weight_kg <= 0.0 || weight_kg > MAX_WEIGHT_KG {
            return Err(ValidationError::out_of_range(
                "weight",
                format!("must be a positive number of kg up to {MAX_WEIGHT_KG}"),
            ));
        }

        let height_cm = parse_number("height", &self.height)?;
        if !(MIN_HEIGHT_CM..=MAX_HEIGHT_CM).contains(&height_cm) {
            return Err(ValidationError::out_of_range(
                "height",
                format!("must be between {MIN_HEIGHT_CM} and {MAX_HEIGHT_CM} cm"),
            ));
        }

        Ok(UserProfile {
            user_id,
            name,
            age,
            weight_kg,
            height_cm,
        })
    }
}

/// Daily metrics screen as typed by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyForm {
    pub glucose: Option<String>,
    pub activity_minutes: Option<String>,
    pub diet: Option<String>,
    pub adherence: Option<String>,
    pub stress: Option<String>,
    pub sleep_hours: Option<String>,
    pub hydration: Option<String>,
}

impl DailyForm {
    /// Validate the form into a [`DailyEntry`].
    pub fn validate(&self) -> Result<DailyEntry, ValidationError> {
        let glucose_mg_dl = parse_whole("glucose", &self.glucose)?;
        if glucose_mg_dl == 0 || glucose_mg_dl > MAX_GLUCOSE_MG_DL {
            return Err(ValidationError::out_of_range(
                "glucose",
                format!("must be between 1 and {MAX_GLUCOSE_MG_DL} mg/dL"),
            ));
        }

        let activity_minutes = parse_whole("activity_minutes", &self.activity_minutes)?;
        if activity_minutes > MAX_ACTIVITY_MINUTES {
            return Err(ValidationError::out_of_range(
                "activity_minutes",
                format!("cannot exceed {MAX_ACTIVITY_MINUTES} minutes"),
            ));
        }

        let diet = parse_choice("diet", &self.diet, Diet::CHOICES, Diet::parse)?;
        let adherence = parse_choice(
            "adherence",
            &self.adherence,
            Adherence::CHOICES,
            Adherence::parse,
        )?;
        let stress = parse_choice("stress", &self.stress, StressLevel::CHOICES, StressLevel::parse)?;

        let sleep_hours = parse_number("sleep_hours", &self.sleep_hours)?;
        if !(0.0..=MAX_SLEEP_HOURS).contains(&sleep_hours) {
            return Err(ValidationError::out_of_range(
                "sleep_hours",
                format!("must be between 0 and {MAX_SLEEP_HOURS}"),
            ));
        }

        let hydration = parse_choice(
            "hydration",
            &self.hydration,
            Hydration::CHOICES,
            Hydration::parse,
        )?;

        Ok(DailyEntry {
            glucose_mg_dl,
            activity_minutes,
            diet,
            adherence,
            stress,
            sleep_hours,
            hydration,
        })
    }
}

/// Named access to the raw fields of a form, in prompt order.
pub trait FormFields {
    /// `(field, prompt label)` pairs.
    const FIELDS: &'static [(&'static str, &'static str)];

    fn field_mut(&mut self, field: &str) -> Option<&mut Option<String>>;

    /// Drop a rejected value so it is asked for again.
    fn clear(&mut self, field: &str) {
        if let Some(slot) = self.field_mut(field) {
            *slot = None;
        }
    }
}

impl FormFields for ProfileForm {
    const FIELDS: &'static [(&'static str, &'static str)] = &[
        ("user_id", "User ID"),
        ("name", "Name"),
        ("age", "Age (years)"),
        ("weight", "Weight (kg)"),
        ("height", "Height (cm)"),
    ];

    fn field_mut(&mut self, field: &str) -> Option<&mut Option<String>> {
        match field {
            "user_id" => Some(&mut self.user_id),
            "name" => Some(&mut self.name),
            "age" => Some(&mut self.age),
            "weight" => Some(&mut self.weight),
            "height" => Some(&mut self.height),
            _ => None,
        }
    }
}

impl FormFields for DailyForm {
    const FIELDS: &'static [(&'static str, &'static str)] = &[
        ("glucose", "Blood glucose (mg/dL)"),
        ("activity_minutes", "Physical activity (minutes)"),
        ("diet", "Diet (healthy/unhealthy)"),
        ("adherence", "Medication adherence (good/poor)"),
        ("stress", "Stress level (low/medium/high)"),
        ("sleep_hours", "Sleep (hours)"),
        ("hydration", "Drank enough water (yes/no)"),
    ];

    fn field_mut(&mut self, field: &str) -> Option<&mut Option<String>> {
        match field {
            "glucose" => Some(&mut self.glucose),
            "activity_minutes" => Some(&mut self.activity_minutes),
            "diet" => Some(&mut self.diet),
            "adherence" => Some(&mut self.adherence),
            "stress" => Some(&mut self.stress),
            "sleep_hours" => Some(&mut self.sleep_hours),
            "hydration" => Some(&mut self.hydration),
            _ => None,
        }
    }
}

fn required<'a>(field: &'static str, value: &'a Option<String>) -> Result<&'a str, ValidationError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::missing(field)),
    }
}

fn parse_number(field: &'static str, value: &Option<String>) -> Result<f64, ValidationError> {
    let raw = required(field, value)?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ValidationError {
            field,
            kind: ValidationErrorKind::NotANumber(raw.to_string()),
        }),
    }
}

fn parse_whole(field: &'static str, value: &Option<String>) -> Result<u32, ValidationError> {
    let raw = required(field, value)?;
    raw.parse::<u32>().map_err(|_| ValidationError {
        field,
        kind: ValidationErrorKind::NotAWholeNumber(raw.to_string()),
    })
}

fn parse_choice<T>(
    field: &'static str,
    value: &Option<String>,
    allowed: &'static [&'static str],
    parse: fn(&str) -> Option<T>,
) -> Result<T, ValidationError> {
    let raw = required(field, value)?;
    parse(raw).ok_or_else(|| ValidationError {
        field,
        kind: ValidationErrorKind::InvalidChoice {
            value: raw.to_string(),
            allowed,
        },
    })
}
