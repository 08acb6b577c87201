//! Engine components assembled from the loaded configuration.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;

use aoiguard_config::{config_dir, log_report, validate, AoiGuardConfig, HistoryBackend};
use aoiguard_core::{AoiGuardError, ScanHistoryStore};
use aoiguard_engine::{Catalog, FusionPolicy, OemVerifier};
use aoiguard_history::{InMemoryHistory, SqliteHistory};

const HISTORY_DB_FILE: &str = "history.db";

pub struct Runtime {
    pub config: AoiGuardConfig,
    pub verifier: Arc<OemVerifier>,
    pub fusion: FusionPolicy,
    pub history: Arc<dyn ScanHistoryStore>,
}

impl Runtime {
    pub fn from_config(config: AoiGuardConfig) -> Result<Self> {
        let catalog = load_catalog(&config)?;
        let verifier = OemVerifier::new(Arc::new(catalog))
            .with_policy(config.candidate_policy())
            .with_extra_country_codes(config.extra_country_codes().iter().cloned());
        let fusion = FusionPolicy::new(config.unmatched_fallback_score());
        let history = open_history(&config)?;

        info!(
            parts = verifier.catalog().len(),
            policy = ?verifier.policy(),
            history = ?config.history_backend(),
            "Runtime ready"
        );

        Ok(Self {
            config,
            verifier: Arc::new(verifier),
            fusion,
            history,
        })
    }
}

/// Log the validation findings and refuse to run with errors.
pub fn check_config(config: &AoiGuardConfig, path: &Path) -> Result<()> {
    let report = validate(config);
    log_report(&report);
    if !report.is_valid() {
        let message = format!(
            "{} error(s) in {}; run `aoiguard config validate` for details",
            report.errors.len(),
            path.display()
        );
        return Err(AoiGuardError::Config(message).into());
    }
    Ok(())
}

/// The embedded catalog, a catalog file, or the file overlaid on the
/// embedded records when `catalog.extendEmbedded` is set.
pub fn load_catalog(config: &AoiGuardConfig) -> Result<Catalog> {
    let Some(section) = config.catalog.as_ref() else {
        return Ok(Catalog::embedded().clone());
    };
    let Some(path) = section.path.as_deref() else {
        return Ok(Catalog::embedded().clone());
    };

    let file = Catalog::from_path(Path::new(path))?;
    if section.extend_embedded.unwrap_or(false) {
        Ok(Catalog::embedded().merged_with(&file))
    } else {
        Ok(file)
    }
}

pub fn open_history(config: &AoiGuardConfig) -> Result<Arc<dyn ScanHistoryStore>> {
    let (max_scans, max_reports) = (config.max_scans(), config.max_reports());
    match config.history_backend() {
        HistoryBackend::Memory => Ok(Arc::new(InMemoryHistory::new(max_scans, max_reports))),
        HistoryBackend::Sqlite => {
            let path = config
                .history
                .as_ref()
                .and_then(|h| h.path.as_deref())
                .map(PathBuf::from)
                .unwrap_or_else(|| config_dir().join(HISTORY_DB_FILE));
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create history directory: {}", parent.display())
                })?;
            }
            Ok(Arc::new(SqliteHistory::open(&path, max_scans, max_reports)?))
        }
    }
}

/// JSON file logging goes to `logging.dir` unless `logging.json` is false.
pub fn log_dir(config: &AoiGuardConfig) -> Option<PathBuf> {
    let logging = config.logging.as_ref()?;
    if logging.json == Some(false) {
        return None;
    }
    logging.dir.as_deref().map(PathBuf::from)
}

/// Marking text from positional arguments, files, or stdin (in that order
/// of preference). Each argument or file is one reading.
pub fn read_readings(texts: Vec<String>, files: &[PathBuf]) -> Result<Vec<String>> {
    let mut readings = texts;
    for file in files {
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read marking text: {}", file.display()))?;
        readings.push(text);
    }
    if readings.is_empty() {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read marking text from stdin")?;
        if text.trim().is_empty() {
            bail!("No marking text given; pass TEXT, --file, or pipe text on stdin");
        }
        readings.push(text);
    }
    Ok(readings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aoiguard_config::{CatalogConfig, HistoryConfig, LoggingConfig};

    fn with_catalog(path: &Path, extend: bool) -> AoiGuardConfig {
        AoiGuardConfig {
            catalog: Some(CatalogConfig {
                path: Some(path.display().to_string()),
                extend_embedded: Some(extend),
            }),
            ..Default::default()
        }
    }

    const EXTRA_PART: &str = r#"
parts:
  - partNumber: LM317T
    manufacturer: ST
    expectedMarkings:
      - { role: logo, value: ST }
      - { role: partNumber, value: LM317T }
      - { role: dateCode, value: YYWW }
    validCountries: [CHN, MAR]
"#;

    #[test]
    fn default_config_uses_embedded_catalog() {
        let catalog = load_catalog(&AoiGuardConfig::default()).unwrap();
        assert_eq!(catalog.len(), Catalog::embedded().len());
    }

    #[test]
    fn catalog_file_replaces_or_extends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parts.yaml");
        std::fs::write(&path, EXTRA_PART).unwrap();

        let replaced = load_catalog(&with_catalog(&path, false)).unwrap();
        assert_eq!(replaced.len(), 1);

        let extended = load_catalog(&with_catalog(&path, true)).unwrap();
        assert_eq!(extended.len(), Catalog::embedded().len() + 1);
        assert!(extended.lookup("LM317T").is_some());
        assert!(extended.lookup("LM358N").is_some());
    }

    #[test]
    fn invalid_config_is_refused() {
        let path = Path::new("config.yaml");
        assert!(check_config(&AoiGuardConfig::default(), path).is_ok());

        let config = AoiGuardConfig {
            history: Some(HistoryConfig {
                max_scans: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = check_config(&config, path).unwrap_err();
        assert!(err.to_string().contains("1 error(s) in config.yaml"), "{err}");
    }

    #[test]
    fn log_dir_respects_json_flag() {
        let mut config = AoiGuardConfig {
            logging: Some(LoggingConfig {
                dir: Some("/tmp/aoiguard-logs".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(log_dir(&config), Some(PathBuf::from("/tmp/aoiguard-logs")));
        config.logging.as_mut().unwrap().json = Some(false);
        assert_eq!(log_dir(&config), None);
    }

    #[test]
    fn readings_from_args_and_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("reading.txt");
        std::fs::write(&file, "TI\nLM358N").unwrap();
        let readings = read_readings(vec!["ATMEL".to_string()], &[file]).unwrap();
        assert_eq!(readings, vec!["ATMEL", "TI\nLM358N"]);
    }

    #[tokio::test]
    async fn sqlite_history_created_under_given_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.db");
        let config: AoiGuardConfig = serde_json::from_value(serde_json::json!({
            "history": { "backend": "sqlite", "path": path.display().to_string() }
        }))
        .unwrap();
        let store = open_history(&config).unwrap();
        assert!(store.list_recent(5).await.unwrap().is_empty());
        assert!(path.exists());
    }
}
