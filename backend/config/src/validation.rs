//! Config validation with field paths in every message.

use std::path::Path;

use thiserror::Error;

use crate::schema::{AoiGuardConfig, HistoryBackend};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &AoiGuardConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_catalog(config, &mut report);
    validate_verifier(config, &mut report);
    validate_fusion(config, &mut report);
    validate_history(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_catalog(config: &AoiGuardConfig, report: &mut ValidationReport) {
    let Some(catalog) = &config.catalog else { return };
    match catalog.path.as_deref() {
        Some(path) if path.trim().is_empty() => {
            report.error("catalog.path", "Catalog path cannot be empty");
        }
        Some(path) => {
            let path = Path::new(path);
            if !path.exists() {
                report.error(
                    "catalog.path",
                    format!("Catalog file not found: {}", path.display()),
                );
            }
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !matches!(ext, "yaml" | "yml" | "json" | "toml") {
                report.error(
                    "catalog.path",
                    format!("Unsupported catalog format '{ext}'. Use .yaml, .json or .toml"),
                );
            }
        }
        None => {
            if catalog.extend_embedded.is_some() {
                report.warn(
                    "catalog.extendEmbedded",
                    "Has no effect without catalog.path",
                );
            }
        }
    }
}

fn validate_verifier(config: &AoiGuardConfig, report: &mut ValidationReport) {
    for (i, code) in config.extra_country_codes().iter().enumerate() {
        let path = format!("verifier.extraCountryCodes[{i}]");
        if code.trim().is_empty() {
            report.error(path, "Country code cannot be empty");
        } else if !code.trim().chars().all(|c| c.is_ascii_alphabetic()) {
            report.warn(path, format!("Country code '{code}' contains non-letters"));
        }
    }
}

fn validate_fusion(config: &AoiGuardConfig, report: &mut ValidationReport) {
    let score = config.unmatched_fallback_score();
    if !(0.0..=100.0).contains(&score) {
        report.error(
            "fusion.unmatchedFallbackScore",
            format!("Score {score} must be within 0..=100"),
        );
    }
}

fn validate_history(config: &AoiGuardConfig, report: &mut ValidationReport) {
    if config.max_scans() == 0 {
        report.error("history.maxScans", "maxScans must be >= 1");
    }
    if config.max_reports() == 0 {
        report.error("history.maxReports", "maxReports must be >= 1");
    }
    let Some(history) = &config.history else { return };
    match (config.history_backend(), history.path.as_deref()) {
        (HistoryBackend::Sqlite, None) => report.warn(
            "history.path",
            "No database path set; history.db in the config directory will be used",
        ),
        (HistoryBackend::Memory, Some(_)) => {
            report.warn("history.path", "Ignored by the memory backend")
        }
        _ => {}
    }
    if history.operator.as_deref().is_some_and(|o| o.trim().is_empty()) {
        report.error("history.operator", "Operator name cannot be empty");
    }
}

fn validate_logging(config: &AoiGuardConfig, report: &mut ValidationReport) {
    let level = config.log_level();
    if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        report.error(
            "logging.level",
            format!("Unknown log level '{level}'. Use one of {}", LOG_LEVELS.join(", ")),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CatalogConfig, FusionConfig, HistoryConfig, LoggingConfig};

    #[test]
    fn empty_config_is_valid() {
        let report = validate(&AoiGuardConfig::default());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn out_of_range_score_is_error() {
        let cfg = AoiGuardConfig {
            fusion: Some(FusionConfig {
                unmatched_fallback_score: Some(140.0),
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "fusion.unmatchedFallbackScore");
    }

    #[test]
    fn zero_caps_and_bad_level_are_errors() {
        let cfg = AoiGuardConfig {
            history: Some(HistoryConfig {
                max_scans: Some(0),
                max_reports: Some(0),
                ..Default::default()
            }),
            logging: Some(LoggingConfig {
                level: Some("verbose".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let paths: Vec<String> = validate(&cfg).errors.into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["history.maxScans", "history.maxReports", "logging.level"]);
    }

    #[test]
    fn missing_catalog_file_is_error() {
        let cfg = AoiGuardConfig {
            catalog: Some(CatalogConfig {
                path: Some("/nonexistent/parts.yaml".to_string()),
                extend_embedded: None,
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.contains("not found"));
    }

    #[test]
    fn sqlite_without_path_warns() {
        let cfg = AoiGuardConfig {
            history: Some(HistoryConfig {
                backend: Some(HistoryBackend::Sqlite),
                ..Default::default()
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert_eq!(report.warnings[0].path, "history.path");
    }
}
