mod catalog_cmd;
mod config_cmd;
mod history_cmd;
mod runtime;
mod scan_cmd;
mod terminal_output;
mod verify_cmd;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use aoiguard_config::{config_dir, config_file_path, load_and_prepare};

use catalog_cmd::CatalogCommands;
use config_cmd::ConfigCommands;
use history_cmd::HistoryCommands;
use runtime::Runtime;

#[derive(Parser)]
#[command(name = "aoiguard")]
#[command(about = "AOI Guard: OEM marking verification for IC counterfeit screening")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $AOIGUARD_CONFIG_DIR/config.yaml or ~/.aoiguard/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check OCR marking text against the OEM catalog
    Verify(verify_cmd::VerifyArgs),
    /// Run the full scan pipeline and record the result
    Scan(scan_cmd::ScanArgs),
    /// Inspect the OEM reference catalog
    #[command(subcommand)]
    Catalog(CatalogCommands),
    /// Recent scans and statistics
    #[command(subcommand)]
    History(HistoryCommands),
    /// Create or check the config file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .unwrap_or_else(|| config_file_path(&config_dir()));

    match cli.command {
        // `config` subcommands must work on files that fail to load.
        Commands::Config(cmd) => {
            aoiguard_logging::init_logger(None, "warn");
            config_cmd::run(cmd, &config_path).await
        }
        Commands::Verify(args) => verify_cmd::run(args, &load_runtime(&config_path).await?),
        Commands::Scan(args) => scan_cmd::run(args, &load_runtime(&config_path).await?).await,
        Commands::Catalog(cmd) => catalog_cmd::run(cmd, &load_runtime(&config_path).await?),
        Commands::History(cmd) => history_cmd::run(cmd, &load_runtime(&config_path).await?).await,
    }
}

/// Load the config, install logging, then validate and build the runtime.
async fn load_runtime(config_path: &Path) -> Result<Runtime> {
    let config = load_and_prepare(config_path).await?;
    aoiguard_logging::init_logger(runtime::log_dir(&config).as_deref(), config.log_level());
    runtime::check_config(&config, config_path)?;
    debug!(path = %config_path.display(), "Configuration ready");
    Runtime::from_config(config)
}
