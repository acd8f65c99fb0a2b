//! Shared loading support for persisted scaler and model artifacts.

use crate::core::features::{FEATURE_COUNT, FEATURE_NAMES};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Errors raised while loading an artifact. Scoring is unavailable after any of these.
#[derive(Debug)]
pub enum ArtifactError {
    /// File could not be read
    Io { path: PathBuf, message: String },
    /// File content is not valid artifact JSON
    Parse { path: Option<PathBuf>, message: String },
    /// Vector lengths do not match the feature count
    Shape(String),
    /// Declared feature names disagree with the builder's order
    FeatureMismatch {
        index: usize,
        expected: &'static str,
        found: String,
    },
    /// A tree references missing nodes, unknown features or loops back on itself
    InvalidTree { tree: usize, message: String },
}

impl std::fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactError::Io { path, message } => {
                write!(f, "Could not read artifact {path:?}: {message}")
            }
            ArtifactError::Parse {
                path: Some(path),
                message,
            } => write!(f, "Could not parse artifact {path:?}: {message}"),
            ArtifactError::Parse {
                path: None,
                message,
            } => write!(f, "Could not parse artifact: {message}"),
            ArtifactError::Shape(e) => write!(f, "Artifact shape error: {e}"),
            ArtifactError::FeatureMismatch {
                index,
                expected,
                found,
            } => write!(
                f,
                "Feature {index} is '{found}' in artifact but '{expected}' in the feature builder"
            ),
            ArtifactError::InvalidTree { tree, message } => {
                write!(f, "Invalid tree {tree}: {message}")
            }
        }
    }
}

impl std::error::Error for ArtifactError {}

/// Read and deserialize a JSON artifact from disk.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let content = std::fs::read_to_string(path).map_err(|e| ArtifactError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| ArtifactError::Parse {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })
}

/// Check optional artifact feature names against the training order.
pub(crate) fn check_feature_names(names: Option<&[String]>) -> Result<(), ArtifactError> {
    let Some(names) = names else {
        return Ok(());
    };

    if names.len() != FEATURE_COUNT {
        return Err(ArtifactError::Shape(format!(
            "expected {FEATURE_COUNT} feature names, got {}",
            names.len()
        )));
    }

    for (index, (found, expected)) in names.iter().zip(FEATURE_NAMES.iter()).enumerate() {
        if found != expected {
            return Err(ArtifactError::FeatureMismatch {
                index,
                expected,
                found: found.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_names_absent_is_ok() {
        assert!(check_feature_names(None).is_ok());
    }

    #[test]
    fn test_feature_name_mismatch() {
        let mut names: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        names.swap(0, 1);
        match check_feature_names(Some(&names)) {
            Err(ArtifactError::FeatureMismatch { index, .. }) => assert_eq!(index, 0),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result: Result<serde_json::Value, _> =
            read_json(Path::new("/nonexistent/glycorisk/model.json"));
        assert!(matches!(result, Err(ArtifactError::Io { .. })));
    }
}
