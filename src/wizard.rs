//! Two-step entry flow: profile, then daily metrics, then the result.
//!
//! Invalid submissions leave the wizard on the current step so the caller
//! can show the error inline and ask again.

use crate::core::model::RiskModel;
use crate::core::pipeline::{RiskResult, RiskScorer, ScoringError};
use crate::core::scaler::FeatureScaler;
use crate::input::{DailyEntry, DailyForm, ProfileForm, UserProfile, ValidationError};

/// Current screen of the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Profile,
    Daily,
    Result,
}

/// Session state for one user.
#[derive(Debug, Default)]
pub struct Wizard {
    profile: Option<UserProfile>,
    entry: Option<DailyEntry>,
    result: Option<RiskResult>,
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WizardStep {
        match (&self.profile, &self.result) {
            (None, _) => WizardStep::Profile,
            (Some(_), None) => WizardStep::Daily,
            (Some(_), Some(_)) => WizardStep::Result,
        }
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn entry(&self) -> Option<&DailyEntry> {
        self.entry.as_ref()
    }

    pub fn result(&self) -> Option<&RiskResult> {
        self.result.as_ref()
    }

    /// Submit the profile screen. The profile is fixed once accepted.
    pub fn submit_profile(&mut self, form: &ProfileForm) -> Result<&UserProfile, WizardError> {
        if self.step() != WizardStep::Profile {
            return Err(WizardError::WrongStep {
                expected: WizardStep::Profile,
                actual: self.step(),
            });
        }

        let profile = form.validate().map_err(WizardError::Validation)?;
        tracing::debug!(user_id = %profile.user_id, "Profile accepted");
        Ok(self.profile.insert(profile))
    }

    /// Submit the daily screen and score it.
    pub fn submit_daily<S: FeatureScaler, M: RiskModel>(
        &mut self,
        form: &DailyForm,
        scorer: &RiskScorer<S, M>,
    ) -> Result<&RiskResult, WizardError> {
        let profile = match (self.step(), &self.profile) {
            (WizardStep::Daily, Some(profile)) => profile,
            (actual, _) => {
                return Err(WizardError::WrongStep {
                    expected: WizardStep::Daily,
                    actual,
                })
            }
        };

        let entry = form.validate().map_err(WizardError::Validation)?;
        let result = scorer.assess(profile, &entry).map_err(WizardError::Scoring)?;

        self.entry = Some(entry);
        Ok(self.result.insert(result))
    }

    /// Go back to the daily screen keeping the same profile.
    pub fn new_entry(&mut self) {
        self.entry = None;
        self.result = None;
    }

    /// Start over from the profile screen.
    pub fn restart(&mut self) {
        self.profile = None;
        self.new_entry();
    }
}

/// Wizard errors.
#[derive(Debug)]
pub enum WizardError {
    /// A form field was rejected; the step is unchanged
    Validation(ValidationError),
    /// Scoring failed after validation passed
    Scoring(ScoringError),
    /// Submitted a screen that is not current
    WrongStep {
        expected: WizardStep,
        actual: WizardStep,
    },
}

impl WizardError {
    /// The rejected field, if this is a validation error.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            WizardError::Validation(e) => Some(e),
            WizardError::Scoring(ScoringError::Validation(e)) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for WizardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WizardError::Validation(e) => write!(f, "Input error: {e}"),
            WizardError::Scoring(e) => write!(f, "{e}"),
            WizardError::WrongStep { expected, actual } => {
                write!(f, "Expected the {expected:?} step but the wizard is at {actual:?}")
            }
        }
    }
}

impl std::error::Error for WizardError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::features::FeatureVector;
    use crate::core::scaler::StandardScaler;

    struct ConstantModel(f64);

    impl RiskModel for ConstantModel {
        fn predict(&self, _scaled: &FeatureVector) -> f64 {
            self.0
        }
    }

    fn scorer() -> RiskScorer<StandardScaler, ConstantModel> {
        RiskScorer::new(StandardScaler::identity(), ConstantModel(20.0))
    }

    fn profile_form() -> ProfileForm {
        ProfileForm {
            user_id: Some("u-1".to_string()),
            name: Some("Alex".to_string()),
            age: Some("42".to_string()),
            weight: Some("75.5".to_string()),
            height: Some("175".to_string()),
        }
    }

    fn daily_form() -> DailyForm {
        DailyForm {
            glucose: Some("120".to_string()),
            activity_minutes: Some("45".to_string()),
            diet: Some("healthy".to_string()),
            adherence: Some("good".to_string()),
            stress: Some("low".to_string()),
            sleep_hours: Some("8".to_string()),
            hydration: Some("yes".to_string()),
        }
    }

    #[test]
    fn test_full_flow() {
        let mut wizard = Wizard::new();
        assert_eq!(wizard.step(), WizardStep::Profile);

        wizard.submit_profile(&profile_form()).unwrap();
        assert_eq!(wizard.step(), WizardStep::Daily);

        let result = wizard.submit_daily(&daily_form(), &scorer()).unwrap();
        assert_eq!(result.final_score, 20.0);
        assert_eq!(wizard.step(), WizardStep::Result);
    }

    #[test]
    fn test_invalid_profile_keeps_step() {
        let mut wizard = Wizard::new();
        let mut form = profile_form();
        form.age = Some("-3".to_string());

        let err = wizard.submit_profile(&form).unwrap_err();
        assert_eq!(err.validation().unwrap().field, "age");
        assert_eq!(wizard.step(), WizardStep::Profile);
    }

    #[test]
    fn test_missing_glucose_computes_nothing() {
        let mut wizard = Wizard::new();
        wizard.submit_profile(&profile_form()).unwrap();

        let mut form = daily_form();
        form.glucose = None;
        let err = wizard.submit_daily(&form, &scorer()).unwrap_err();

        assert_eq!(err.validation().unwrap().field, "glucose");
        assert_eq!(wizard.step(), WizardStep::Daily);
        assert!(wizard.result().is_none());
    }

    #[test]
    fn test_daily_before_profile_rejected() {
        let mut wizard = Wizard::new();
        let err = wizard.submit_daily(&daily_form(), &scorer()).unwrap_err();
        assert!(matches!(
            err,
            WizardError::WrongStep {
                expected: WizardStep::Daily,
                actual: WizardStep::Profile
            }
        ));
    }

    #[test]
    fn test_profile_is_immutable_for_session() {
        let mut wizard = Wizard::new();
        wizard.submit_profile(&profile_form()).unwrap();

        let mut other = profile_form();
        other.name = Some("Someone Else".to_string());
        assert!(wizard.submit_profile(&other).is_err());
        assert_eq!(wizard.profile().unwrap().name, "Alex");
    }

    #[test]
    fn test_new_entry_and_restart() {
        let mut wizard = Wizard::new();
        wizard.submit_profile(&profile_form()).unwrap();
        wizard.submit_daily(&daily_form(), &scorer()).unwrap();

        wizard.new_entry();
        assert_eq!(wizard.step(), WizardStep::Daily);
        assert!(wizard.profile().is_some());

        wizard.restart();
        assert_eq!(wizard.step(), WizardStep::Profile);
        assert!(wizard.profile().is_none());
    }
}
