//! `aoiguard config`: write a starter file or check an existing one.

use std::path::Path;

use anyhow::{bail, Result};
use clap::Subcommand;

use aoiguard_config::{
    apply_all_defaults, collect_referenced_vars, load_and_prepare, load_raw, validate,
    write_config, AoiGuardConfig,
};

use aoiguard_core::AoiGuardError;

use crate::terminal_output::{note_error, note_info, note_success, note_warn};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a config file with every default filled in
    Init {
        /// Replace an existing file (the old one is kept as a backup)
        #[arg(long)]
        force: bool,
    },
    /// Load the config and report problems
    Validate,
}

pub async fn run(cmd: ConfigCommands, path: &Path) -> Result<()> {
    match cmd {
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                bail!("{} already exists; pass --force to overwrite", path.display());
            }
            write_config(&apply_all_defaults(AoiGuardConfig::default()), path).await?;
            note_success(&format!("Wrote {}", path.display()));
        }
        ConfigCommands::Validate => {
            if !path.exists() {
                note_info(&format!("{} does not exist; defaults apply", path.display()));
            }
            let vars = collect_referenced_vars(&load_raw(path).await?);
            if !vars.is_empty() {
                note_info(&format!("Environment variables referenced: {}", vars.join(", ")));
            }

            let config = load_and_prepare(path).await?;
            let report = validate(&config);
            for warning in &report.warnings {
                note_warn(&warning.to_string());
            }
            for error in &report.errors {
                note_error(&error.to_string());
            }
            if !report.is_valid() {
                let message = format!("{} error(s) in {}", report.errors.len(), path.display());
                return Err(AoiGuardError::Config(message).into());
            }
            note_success("Config is valid");
        }
    }
    Ok(())
}
