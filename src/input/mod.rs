//! User input for risk assessment.
//!
//! This module contains:
//! - Raw profile and daily forms with field validation
//! - Typed profile, daily entry and categorical answers

pub mod form;
pub mod types;

// Re-export commonly used types
pub use form::{DailyForm, FormFields, ProfileForm, ValidationError, ValidationErrorKind};
pub use types::{Adherence, DailyEntry, Diet, Hydration, StressLevel, UserProfile};
