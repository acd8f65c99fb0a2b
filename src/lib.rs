//! glycorisk - Diabetes risk scoring from daily health metrics.
//!
//! This library turns a user profile and one day of self-reported metrics
//! into a 0-100 risk score, a three-level category and per-metric advice,
//! and can package the result as a FHIR R4 bundle.
//!
//! # Scope
//!
//! - **Local only**: scoring runs entirely on this machine
//! - **Deterministic**: the same inputs and artifacts always give the same result
//! - **Not a diagnosis**: results are educational, see [`MEDICAL_DISCLAIMER`]
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            glycorisk                             │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐       │
//! │  │  Forms   │──▶│ Features │──▶│  Scaler  │──▶│  Trees   │       │
//! │  │(validate)│   │ (order)  │   │(z-score) │   │ (base)   │       │
//! │  └──────────┘   └──────────┘   └──────────┘   └──────────┘       │
//! │                                                     │            │
//! │                                                     ▼            │
//! │  ┌──────────┐   ┌──────────┐                  ┌──────────┐       │
//! │  │   FHIR   │◀──│ Category │◀─────────────────│Modifiers │       │
//! │  │  Bundle  │   │ + Advice │                  │ (rules)  │       │
//! │  └──────────┘   └──────────┘                  └──────────┘       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use glycorisk::{core::RiskScorer, input::{DailyForm, ProfileForm}};
//! use std::path::Path;
//!
//! let scorer = RiskScorer::load(
//!     Path::new("artifacts/diabetes_risk_model.json"),
//!     Path::new("artifacts/scaler.json"),
//! )
//! .expect("Failed to load artifacts");
//!
//! let profile = ProfileForm::default().validate();
//! let entry = DailyForm::default().validate();
//! if let (Ok(profile), Ok(entry)) = (profile, entry) {
//!     let result = scorer.assess(&profile, &entry).expect("Scoring failed");
//!     println!("{:.1} ({})", result.final_score, result.category);
//! }
//! ```

pub mod config;
pub mod core;
pub mod input;
pub mod transparency;
pub mod wizard;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use core::{Bundle, FhirBuilder, RiskCategory, RiskResult, RiskScorer, ScoringError};
pub use input::{DailyEntry, DailyForm, ProfileForm, UserProfile, ValidationError};
pub use transparency::TransparencyLog;
pub use wizard::{Wizard, WizardError, WizardStep};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Disclaimer shown with every result.
pub const MEDICAL_DISCLAIMER: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║                 GLYCORISK - MEDICAL DISCLAIMER                   ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This tool estimates diabetes risk for educational purposes.     ║
║                                                                  ║
║  ✓ WHAT IT DOES:                                                 ║
║    • Combines a trained model with simple lifestyle rules        ║
║    • Gives a 0-100 score with Low / Moderate / High category     ║
║    • Suggests general lifestyle improvements                     ║
║                                                                  ║
║  ✗ WHAT IT IS NOT:                                               ║
║    • It is NOT a medical diagnosis                               ║
║    • It is NOT a substitute for professional medical advice      ║
║    • It does not account for your full medical history           ║
║                                                                  ║
║  Always consult a qualified healthcare provider about your       ║
║  health and before changing medication or treatment.             ║
║                                                                  ║
║  Assessments are computed locally. Exports are written only      ║
║  when you ask for them.                                          ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_medical_disclaimer_contents() {
        assert!(MEDICAL_DISCLAIMER.contains("DISCLAIMER"));
        assert!(MEDICAL_DISCLAIMER.contains("NOT a medical diagnosis"));
        assert!(MEDICAL_DISCLAIMER.contains("healthcare provider"));
    }
}
