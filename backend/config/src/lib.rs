//! `aoiguard-config`: AOI Guard runtime configuration.
//!
//! Provides:
//! - Typed config schema (catalog, verifier, fusion, history, logging)
//! - YAML read/write with atomic backup rotation
//! - `${ENV_VAR}` substitution
//! - Default value application
//! - Validation with path-qualified messages

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{collect_referenced_vars, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, load_raw, write_config};
pub use schema::{
    AoiGuardConfig, CatalogConfig, FusionConfig, HistoryBackend, HistoryConfig, LoggingConfig,
    VerifierConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use std::path::Path;

use anyhow::{Context, Result};

/// Load a config file, substitute env vars and apply defaults. Callers
/// validate the result once logging is set up.
pub async fn load_and_prepare(path: &Path) -> Result<AoiGuardConfig> {
    let value = load_raw(path).await?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;

    let config: AoiGuardConfig = serde_json::from_value(value)
        .with_context(|| format!("Invalid config at: {}", path.display()))?;
    Ok(apply_all_defaults(config))
}

/// Emit every finding in a validation report through `tracing`.
pub fn log_report(report: &ValidationReport) {
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
}
