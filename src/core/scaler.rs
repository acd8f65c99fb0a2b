//! Standardisation of feature vectors with a previously fitted scaler.

use crate::core::artifact::{check_feature_names, read_json, ArtifactError};
use crate::core::features::{FeatureVector, FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Maps a raw feature vector into the model's input space.
pub trait FeatureScaler {
    fn scale(&self, features: &FeatureVector) -> FeatureVector;
}

/// On-disk scaler format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

/// Per-feature `(x - mean) / scale` transform.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: [f64; FEATURE_COUNT],
    scale: [f64; FEATURE_COUNT],
}

impl StandardScaler {
    /// Create a scaler from fitted statistics. A zero scale is treated as 1.
    pub fn new(mean: &[f64], scale: &[f64]) -> Result<Self, ArtifactError> {
        let mean = to_array("mean", mean)?;
        let mut scale = to_array("scale", scale)?;

        for s in scale.iter_mut() {
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Ok(Self { mean, scale })
    }

    /// Build from a parsed artifact, checking the declared feature order.
    pub fn from_artifact(artifact: &ScalerArtifact) -> Result<Self, ArtifactError> {
        check_feature_names(artifact.feature_names.as_deref())?;
        Self::new(&artifact.mean, &artifact.scale)
    }

    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        let artifact: ScalerArtifact =
            serde_json::from_str(json).map_err(|e| ArtifactError::Parse {
                path: None,
                message: e.to_string(),
            })?;
        Self::from_artifact(&artifact)
    }

    /// Load a scaler artifact from disk.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let artifact: ScalerArtifact = read_json(path)?;
        let scaler = Self::from_artifact(&artifact)?;
        tracing::info!("Loaded scaler from {:?}", path);
        Ok(scaler)
    }

    /// A scaler that leaves vectors unchanged.
    pub fn identity() -> Self {
        Self {
            mean: [0.0; FEATURE_COUNT],
            scale: [1.0; FEATURE_COUNT],
        }
    }
}

impl FeatureScaler for StandardScaler {
    fn scale(&self, features: &FeatureVector) -> FeatureVector {
        let mut out = [0.0; FEATURE_COUNT];
        for (i, value) in out.iter_mut().enumerate() {
            *value = (features.0[i] - self.mean[i]) / self.scale[i];
        }
        FeatureVector(out)
    }
}

fn to_array(name: &str, values: &[f64]) -> Result<[f64; FEATURE_COUNT], ArtifactError> {
    if values.len() != FEATURE_COUNT {
        return Err(ArtifactError::Shape(format!(
            "scaler {name} has {} values, expected {FEATURE_COUNT}",
            values.len()
        )));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(ArtifactError::Shape(format!(
            "scaler {name} contains non-finite value {bad}"
        )));
    }

    let mut out = [0.0; FEATURE_COUNT];
    out.copy_from_slice(values);
    Ok(out)
}
