use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};

use vdab_job_archiver_lib::cli::{self, Cli};
use vdab_job_archiver_lib::infrastructure::{
    ConfigManager, PreferenceStore, init_logging_with_config,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let config = manager.load_config().await?;
    init_logging_with_config(&config.logging)?;
    debug!("Configuration loaded from {:?}", manager.config_path());

    let preferences = PreferenceStore::beside(&manager);
    if let Err(e) = cli::execute(cli, config, preferences).await {
        error!("❌ {:#}", e);
        return Err(e);
    }
    Ok(())
}
