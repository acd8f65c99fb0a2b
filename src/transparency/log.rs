//! Cumulative usage counters, persisted as JSON between runs.
//!
//! Only counts and a timestamp are kept. Names, identifiers and health
//! measurements never reach this file.

use crate::core::classify::RiskCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What the tool has done across all runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransparencyLog {
    pub assessments: u64,
    pub high_risk_results: u64,
    pub validation_rejections: u64,
    pub exports_written: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl TransparencyLog {
    /// Read counters from `path`. A missing file is an empty log.
    pub fn load(path: &Path) -> Result<Self, LogError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| LogError::IoError(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| LogError::ParseError(e.to_string()))
    }

    /// Like [`TransparencyLog::load`], starting over when the file is unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Could not load previous transparency stats from {path:?}: {e}");
            Self::default()
        })
    }

    /// Write counters to `path`, stamping the update time.
    pub fn save(&mut self, path: &Path) -> Result<(), LogError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LogError::IoError(e.to_string()))?;
        }

        self.last_updated = Some(Utc::now());
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| LogError::SerializeError(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| LogError::IoError(e.to_string()))
    }

    pub fn record_assessment(&mut self, category: RiskCategory) {
        self.assessments += 1;
        if category == RiskCategory::High {
            self.high_risk_results += 1;
        }
    }

    pub fn record_validation_rejection(&mut self) {
        self.validation_rejections += 1;
    }

    pub fn record_export(&mut self) {
        self.exports_written += 1;
    }

    /// Multi-line summary for the terminal.
    pub fn summary(&self) -> String {
        let last = self
            .last_updated
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "never".to_string());

        format!(
            "Usage Statistics:\n\
             - Assessments computed: {}\n\
             - High risk results: {}\n\
             - Rejected submissions: {}\n\
             - Exports written: {}\n\
             - Last updated: {last}\n\
             \n\
             Privacy Guarantee:\n\
             - No names or identifiers stored in this log\n\
             - No health measurements stored in this log\n\
             - Exports are only written when you ask for them",
            self.assessments,
            self.high_risk_results,
            self.validation_rejections,
            self.exports_written,
        )
    }
}

/// Transparency log persistence errors.
#[derive(Debug)]
pub enum LogError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for LogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogError::IoError(e) => write!(f, "IO error: {e}"),
            LogError::ParseError(e) => write!(f, "Parse error: {e}"),
            LogError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for LogError {}
