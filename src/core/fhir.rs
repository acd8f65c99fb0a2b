//! FHIR R4 shaped export of an assessment.
//!
//! An export is a `collection` Bundle with one Patient, one Observation per
//! reported metric and one RiskAssessment. All resources share the same
//! observation timestamp, rendered in the configured time zone.

use crate::core::features::compute_bmi;
use crate::core::pipeline::RiskResult;
use crate::input::{DailyEntry, UserProfile};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// FHIR release the documents are shaped after.
pub const FHIR_VERSION: &str = "4.0.1";

/// The name of this producer.
pub const PRODUCER_NAME: &str = "glycorisk";

const LOINC_SYSTEM: &str = "http://loinc.org";
const UCUM_SYSTEM: &str = "http://unitsofmeasure.org";
const LOCAL_CODE_SYSTEM: &str = "urn:glycorisk:observation";
const PATIENT_ID_SYSTEM: &str = "urn:glycorisk:user-id";
const AGE_EXTENSION_URL: &str = "urn:glycorisk:age";
const FINAL_SCORE_EXTENSION_URL: &str = "urn:glycorisk:risk-score";
const BASE_SCORE_EXTENSION_URL: &str = "urn:glycorisk:base-score";
/// Suffixes tried before giving up on an export name.
const MAX_NAME_ATTEMPTS: u32 = 1000;

const FHIR_VERSION_SYSTEM: &str = "http://hl7.org/fhir/FHIR-version";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coding {
    pub system: String,
    pub code: String,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    pub unit: String,
    pub system: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extension {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_integer: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_decimal: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    pub system: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanName {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub text: String,
}

/// Patient identity block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub identifier: Vec<Identifier>,
    pub name: Vec<HumanName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
}

/// One measured or reported value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: String,
    pub status: String,
    pub code: CodeableConcept,
    pub subject: Reference,
    pub effective_date_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_quantity: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskPrediction {
    pub outcome: CodeableConcept,
    pub qualitative_risk: CodeableConcept,
}

/// Computed risk score and category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub id: String,
    pub status: String,
    pub subject: Reference,
    pub occurrence_date_time: String,
    pub basis: Vec<Reference>,
    pub prediction: Vec<RiskPrediction>,
    pub extension: Vec<Extension>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<Annotation>,
}

/// Resources that can appear in an export bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resourceType")]
pub enum Resource {
    Patient(Patient),
    Observation(Observation),
    RiskAssessment(RiskAssessment),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    pub full_url: String,
    pub resource: Resource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMeta {
    /// Producer and host that generated the document
    pub source: String,
    /// Carries the FHIR release the document is shaped after
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag: Vec<Coding>,
}

/// Export document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub resource_type: String,
    pub id: String,
    #[serde(rename = "type")]
    pub bundle_type: String,
    pub timestamp: String,
    pub meta: BundleMeta,
    pub entry: Vec<BundleEntry>,
}

impl Bundle {
    pub fn patient(&self) -> Option<&Patient> {
        self.entry.iter().find_map(|e| match &e.resource {
            Resource::Patient(p) => Some(p),
            _ => None,
        })
    }

    pub fn observations(&self) -> impl Iterator<Item = &Observation> {
        self.entry.iter().filter_map(|e| match &e.resource {
            Resource::Observation(o) => Some(o),
            _ => None,
        })
    }

    pub fn risk_assessment(&self) -> Option<&RiskAssessment> {
        self.entry.iter().find_map(|e| match &e.resource {
            Resource::RiskAssessment(r) => Some(r),
            _ => None,
        })
    }
}

/// Export errors.
#[derive(Debug)]
pub enum ExportError {
    IoError(String),
    SerializeError(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::IoError(e) => write!(f, "IO error: {e}"),
            ExportError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ExportError {}

/// Builder for export bundles.
pub struct FhirBuilder {
    instance_id: Uuid,
    timezone: Tz,
    source: String,
}

impl FhirBuilder {
    /// Create a builder that stamps times in `timezone`.
    pub fn new(timezone: Tz) -> Self {
        let host = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown-host".to_string());

        Self {
            instance_id: Uuid::new_v4(),
            timezone,
            source: format!("{PRODUCER_NAME}@{host}"),
        }
    }

    /// Build a bundle stamped with the current time.
    pub fn build(&self, profile: &UserProfile, entry: &DailyEntry, result: &RiskResult) -> Bundle {
        self.build_at(profile, entry, result, Utc::now())
    }

    /// Build a bundle stamped with `observed_at`.
    pub fn build_at(
        &self,
        profile: &UserProfile,
        entry: &DailyEntry,
        result: &RiskResult,
        observed_at: DateTime<Utc>,
    ) -> Bundle {
        let timestamp = observed_at.with_timezone(&self.timezone).to_rfc3339();
        let patient_id = resource_id(&profile.user_id);
        let subject = Reference {
            reference: format!("Patient/{patient_id}"),
        };

        let patient = Patient {
            id: patient_id.clone(),
            identifier: vec![Identifier {
                system: PATIENT_ID_SYSTEM.to_string(),
                value: profile.user_id.clone(),
            }],
            name: vec![HumanName {
                text: profile.name.clone(),
            }],
            extension: vec![Extension {
                url: AGE_EXTENSION_URL.to_string(),
                value_integer: Some(i64::from(profile.age)),
                value_decimal: None,
            }],
        };

        let bmi = compute_bmi(profile.weight_kg, profile.height_cm);
        let measurements = [
            ("29463-7", "Body weight", profile.weight_kg, "kg", "kg"),
            ("8302-2", "Body height", profile.height_cm, "cm", "cm"),
            ("39156-5", "Body mass index (BMI) [Ratio]", round2(bmi), "kg/m2", "kg/m2"),
            (
                "2339-0",
                "Glucose [Mass/volume] in Blood",
                f64::from(entry.glucose_mg_dl),
                "mg/dL",
                "mg/dL",
            ),
            (
                "55411-3",
                "Exercise duration",
                f64::from(entry.activity_minutes),
                "min",
                "min",
            ),
            ("93832-4", "Sleep duration", entry.sleep_hours, "h", "h"),
        ];
        let answers = [
            ("diet", "Diet quality", entry.diet.as_str()),
            ("medication_adherence", "Medication adherence", entry.adherence.as_str()),
            ("stress_level", "Stress level", entry.stress.as_str()),
            ("hydration", "Adequate hydration", entry.hydration.as_str()),
        ];

        let mut observations = Vec::with_capacity(measurements.len() + answers.len());
        for (code, display, value, unit, ucum) in measurements {
            observations.push(Observation {
                id: Uuid::new_v4().to_string(),
                status: "final".to_string(),
                code: CodeableConcept {
                    coding: vec![Coding {
                        system: LOINC_SYSTEM.to_string(),
                        code: code.to_string(),
                        display: display.to_string(),
                    }],
                    text: display.to_string(),
                },
                subject: subject.clone(),
                effective_date_time: timestamp.clone(),
                value_quantity: Some(Quantity {
                    value,
                    unit: unit.to_string(),
                    system: UCUM_SYSTEM.to_string(),
                    code: ucum.to_string(),
                }),
                value_string: None,
            });
        }
        for (code, display, answer) in answers {
            observations.push(Observation {
                id: Uuid::new_v4().to_string(),
                status: "final".to_string(),
                code: CodeableConcept {
                    coding: vec![Coding {
                        system: LOCAL_CODE_SYSTEM.to_string(),
                        code: code.to_string(),
                        display: display.to_string(),
                    }],
                    text: display.to_string(),
                },
                subject: subject.clone(),
                effective_date_time: timestamp.clone(),
                value_quantity: None,
                value_string: Some(answer.to_string()),
            });
        }

        let note = result
            .applied_modifiers
            .iter()
            .map(|m| Annotation {
                text: format!("{} (+{})", m.description, m.points),
            })
            .collect();

        let assessment = RiskAssessment {
            id: Uuid::new_v4().to_string(),
            status: "final".to_string(),
            subject,
            occurrence_date_time: timestamp.clone(),
            basis: observations
                .iter()
                .map(|o| Reference {
                    reference: format!("Observation/{}", o.id),
                })
                .collect(),
            prediction: vec![RiskPrediction {
                outcome: CodeableConcept {
                    coding: Vec::new(),
                    text: "Diabetes risk".to_string(),
                },
                qualitative_risk: CodeableConcept {
                    coding: Vec::new(),
                    text: result.category.label().to_string(),
                },
            }],
            extension: vec![
                Extension {
                    url: FINAL_SCORE_EXTENSION_URL.to_string(),
                    value_integer: None,
                    value_decimal: Some(round2(result.final_score)),
                },
                Extension {
                    url: BASE_SCORE_EXTENSION_URL.to_string(),
                    value_integer: None,
                    value_decimal: Some(round2(result.base_score)),
                },
            ],
            note,
        };

        let mut entries = Vec::with_capacity(observations.len() + 2);
        entries.push(BundleEntry {
            full_url: format!("urn:uuid:{}", Uuid::new_v4()),
            resource: Resource::Patient(patient),
        });
        for observation in observations {
            entries.push(BundleEntry {
                full_url: format!("urn:uuid:{}", observation.id),
                resource: Resource::Observation(observation),
            });
        }
        entries.push(BundleEntry {
            full_url: format!("urn:uuid:{}", assessment.id),
            resource: Resource::RiskAssessment(assessment),
        });

        Bundle {
            resource_type: "Bundle".to_string(),
            id: Uuid::new_v4().to_string(),
            bundle_type: "collection".to_string(),
            timestamp,
            meta: BundleMeta {
                source: format!("{}#{}", self.source, self.instance_id),
                tag: vec![Coding {
                    system: FHIR_VERSION_SYSTEM.to_string(),
                    code: FHIR_VERSION.to_string(),
                    display: "FHIR R4".to_string(),
                }],
            },
            entry: entries,
        }
    }

    /// Write a bundle into `dir`, returning the file path.
    ///
    /// The name is stamped with the bundle's own timestamp. Existing files
    /// are never replaced: a clash gets a `_2`, `_3`, ... suffix.
    pub fn write(&self, bundle: &Bundle, user_id: &str, dir: &Path) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(dir).map_err(|e| ExportError::IoError(e.to_string()))?;

        let json = serde_json::to_string_pretty(bundle)
            .map_err(|e| ExportError::SerializeError(e.to_string()))?;

        let stamp = DateTime::parse_from_rfc3339(&bundle.timestamp)
            .map(|t| t.format("%Y%m%d_%H%M%S").to_string())
            .map_err(|e| {
                ExportError::SerializeError(format!(
                    "bundle timestamp '{}' is not RFC 3339: {e}",
                    bundle.timestamp
                ))
            })?;
        let stem = format!("assessment_{}_{stamp}", resource_id(user_id));

        for attempt in 1..=MAX_NAME_ATTEMPTS {
            let path = if attempt == 1 {
                dir.join(format!("{stem}.json"))
            } else {
                dir.join(format!("{stem}_{attempt}.json"))
            };

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(ExportError::IoError(e.to_string())),
            };
            file.write_all(json.as_bytes())
                .map_err(|e| ExportError::IoError(e.to_string()))?;

            tracing::info!("Wrote FHIR export to {:?}", path);
            return Ok(path);
        }

        Err(ExportError::IoError(format!(
            "no free file name for {stem} in {dir:?}"
        )))
    }
}

/// Reduce a user id to characters allowed in FHIR ids and file names.
fn resource_id(user_id: &str) -> String {
    let id: String = user_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .take(64)
        .collect();
    if id.is_empty() {
        "anonymous".to_string()
    } else {
        id
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classify::RiskCategory;
    use crate::core::features::{ActivityLevel, BmiCategory};
    use crate::core::modifiers::AppliedModifier;
    use crate::input::{Adherence, Diet, Hydration, StressLevel};
    use chrono::TimeZone;

    fn profile() -> UserProfile {
        UserProfile {
            user_id: "user 42/a".to_string(),
            name: "Alex Doe".to_string(),
            age: 42,
            weight_kg: 75.5,
            height_cm: 175.0,
        }
    }

    fn entry() -> DailyEntry {
        DailyEntry {
            glucose_mg_dl: 190,
            activity_minutes: 45,
            diet: Diet::Healthy,
            adherence: Adherence::Good,
            stress: StressLevel::Low,
            sleep_hours: 7.0,
            hydration: Hydration::Yes,
        }
    }

    fn result() -> RiskResult {
        RiskResult {
            base_score: 30.123,
            final_score: 45.123,
            category: RiskCategory::Moderate,
            applied_modifiers: vec![AppliedModifier {
                name: "high_blood_glucose".to_string(),
                points: 15.0,
                description: "Blood glucose above 180 mg/dL".to_string(),
            }],
            bmi: 24.65,
            bmi_category: BmiCategory::Normal,
            activity_level: ActivityLevel::Moderate,
            recommendations: Vec::new(),
        }
    }

    #[test]
    fn test_bundle_structure() {
        let builder = FhirBuilder::new(chrono_tz::UTC);
        let bundle = builder.build(&profile(), &entry(), &result());

        assert_eq!(bundle.resource_type, "Bundle");
        assert_eq!(bundle.bundle_type, "collection");

        let patient = bundle.patient().unwrap();
        assert_eq!(patient.id, "user-42-a");
        assert_eq!(patient.identifier[0].value, "user 42/a");
        assert_eq!(patient.name[0].text, "Alex Doe");

        assert_eq!(bundle.observations().count(), 10);
        for obs in bundle.observations() {
            assert_eq!(obs.effective_date_time, bundle.timestamp);
            assert_eq!(obs.subject.reference, "Patient/user-42-a");
        }

        let assessment = bundle.risk_assessment().unwrap();
        assert_eq!(assessment.prediction[0].qualitative_risk.text, "Moderate");
        assert_eq!(assessment.extension[0].value_decimal, Some(45.12));
        assert_eq!(assessment.basis.len(), 10);
        assert_eq!(assessment.note.len(), 1);
        assert_eq!(assessment.note[0].text, "Blood glucose above 180 mg/dL (+15)");
    }

    #[test]
    fn test_glucose_observation() {
        let builder = FhirBuilder::new(chrono_tz::UTC);
        let bundle = builder.build(&profile(), &entry(), &result());

        let glucose = bundle
            .observations()
            .find(|o| o.code.coding[0].code == "2339-0")
            .unwrap();
        let quantity = glucose.value_quantity.as_ref().unwrap();
        assert_eq!(quantity.value, 190.0);
        assert_eq!(quantity.unit, "mg/dL");
    }

    #[test]
    fn test_timestamp_uses_timezone() {
        let builder = FhirBuilder::new(chrono_tz::America::New_York);
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let bundle = builder.build_at(&profile(), &entry(), &result(), at);
        assert_eq!(bundle.timestamp, "2024-01-15T07:00:00-05:00");
    }

    #[test]
    fn test_json_field_names() {
        let builder = FhirBuilder::new(chrono_tz::UTC);
        let bundle = builder.build(&profile(), &entry(), &result());
        let json = serde_json::to_string_pretty(&bundle).unwrap();

        assert!(json.contains("\"resourceType\": \"Bundle\""));
        assert!(json.contains("\"resourceType\": \"Patient\""));
        assert!(json.contains("\"resourceType\": \"RiskAssessment\""));
        assert!(json.contains("effectiveDateTime"));
        assert!(json.contains("valueQuantity"));
        assert!(json.contains("\"type\": \"collection\""));
        assert!(json.contains("\"tag\""));
        assert!(!json.contains("versionId"));
    }

    #[test]
    fn test_release_carried_as_meta_tag() {
        let builder = FhirBuilder::new(chrono_tz::UTC);
        let bundle = builder.build(&profile(), &entry(), &result());
        assert_eq!(bundle.meta.tag[0].system, FHIR_VERSION_SYSTEM);
        assert_eq!(bundle.meta.tag[0].code, FHIR_VERSION);
    }

    #[test]
    fn test_back_to_back_writes_keep_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let builder = FhirBuilder::new(chrono_tz::America::New_York);
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let first = builder.build_at(&profile(), &entry(), &result(), at);
        let second = builder.build_at(&profile(), &entry(), &result(), at);

        let a = builder.write(&first, "user 42/a", dir.path()).unwrap();
        let b = builder.write(&second, "user 42/a", dir.path()).unwrap();

        assert_ne!(a, b);
        assert_eq!(
            a.file_name().unwrap(),
            "assessment_user-42-a_20240115_070000.json"
        );
        assert_eq!(
            b.file_name().unwrap(),
            "assessment_user-42-a_20240115_070000_2.json"
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);

        let reread: Bundle =
            serde_json::from_str(&std::fs::read_to_string(&a).unwrap()).unwrap();
        assert_eq!(reread.id, first.id);
    }

    #[test]
    fn test_bundle_parses_back() {
        let builder = FhirBuilder::new(chrono_tz::UTC);
        let bundle = builder.build(&profile(), &entry(), &result());
        let json = serde_json::to_string(&bundle).unwrap();
        let parsed: Bundle = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.id, bundle.id);
        assert_eq!(parsed.entry.len(), bundle.entry.len());
        assert_eq!(parsed.patient(), bundle.patient());
    }

    #[test]
    fn test_resource_id() {
        assert_eq!(resource_id("abc-123"), "abc-123");
        assert_eq!(resource_id("a b/c"), "a-b-c");
        assert_eq!(resource_id(""), "anonymous");
    }
}
