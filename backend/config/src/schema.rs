//! AOI Guard configuration schema.
//!
//! Every section is optional; absent values fall back to the constants in
//! [`crate::defaults`] through the accessor methods on [`AoiGuardConfig`].

use serde::{Deserialize, Serialize};

use aoiguard_core::CandidatePolicy;

use crate::defaults::{
    DEFAULT_HISTORY_OPERATOR, DEFAULT_LOG_LEVEL, DEFAULT_MAX_REPORTS, DEFAULT_MAX_SCANS,
    DEFAULT_UNMATCHED_FALLBACK_SCORE,
};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AoiGuardConfig {
    /// OEM reference catalog source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<CatalogConfig>,

    /// Marking verifier options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifier: Option<VerifierConfig>,

    /// Verdict fusion options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fusion: Option<FusionConfig>,

    /// Scan history storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<HistoryConfig>,

    /// Logging configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

impl AoiGuardConfig {
    pub fn candidate_policy(&self) -> CandidatePolicy {
        self.verifier
            .as_ref()
            .and_then(|v| v.candidate_policy)
            .unwrap_or_default()
    }

    pub fn extra_country_codes(&self) -> &[String] {
        self.verifier
            .as_ref()
            .map(|v| v.extra_country_codes.as_slice())
            .unwrap_or_default()
    }

    pub fn unmatched_fallback_score(&self) -> f64 {
        self.fusion
            .as_ref()
            .and_then(|f| f.unmatched_fallback_score)
            .unwrap_or(DEFAULT_UNMATCHED_FALLBACK_SCORE)
    }

    pub fn history_backend(&self) -> HistoryBackend {
        self.history
            .as_ref()
            .and_then(|h| h.backend)
            .unwrap_or_default()
    }

    pub fn max_scans(&self) -> usize {
        self.history
            .as_ref()
            .and_then(|h| h.max_scans)
            .unwrap_or(DEFAULT_MAX_SCANS)
    }

    pub fn max_reports(&self) -> usize {
        self.history
            .as_ref()
            .and_then(|h| h.max_reports)
            .unwrap_or(DEFAULT_MAX_REPORTS)
    }

    pub fn operator(&self) -> &str {
        self.history
            .as_ref()
            .and_then(|h| h.operator.as_deref())
            .unwrap_or(DEFAULT_HISTORY_OPERATOR)
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogConfig {
    /// External catalog file (.yaml, .yml, .json or .toml)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Merge the file's records over the embedded catalog instead of
    /// replacing it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extend_embedded: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifierConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_policy: Option<CandidatePolicy>,

    /// Country tokens recognized in addition to the built-in list
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_country_codes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FusionConfig {
    /// Score reported when the part is unknown and no classifier answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unmatched_fallback_score: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HistoryBackend {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<HistoryBackend>,

    /// SQLite database file; only used by the `sqlite` backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_scans: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_reports: Option<usize>,

    /// Operator name recorded with each scan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// "trace" | "debug" | "info" | "warn" | "error"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Directory for the rolling JSON log file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    /// Also emit JSON lines to the log file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}
