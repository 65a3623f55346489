pub mod checkpoint;
pub mod cli;
pub mod core;
pub mod ingest;
pub mod merge;
pub mod providers;
pub mod store;
pub mod sync;

use crate::core::config::AppConfig;
use crate::providers::util::build_client;
use crate::providers::{FintablesProvider, LogoStore};
use crate::store::FundStore;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

/// Commands that need a loaded configuration and an open store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    Sync { dry_run: bool },
    Status,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fonsync starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    }
    .apply_env_overrides_from(|key| std::env::var(key).ok());
    debug!("Loaded config: {config:#?}");

    let data_path = config.data_path()?;
    let store = FundStore::open(&data_path)
        .with_context(|| format!("Failed to open fund store at {}", data_path.display()))?;

    match command {
        AppCommand::Status => cli::status::run(&store),
        AppCommand::Sync { dry_run } => {
            let client = build_client(&config.http)?;
            let provider =
                FintablesProvider::new(&config.providers.fintables.base_url, client.clone());
            if dry_run {
                return cli::sync::plan(&config, &store, &provider).await;
            }
            let logos = LogoStore::new(config.public_path.as_deref().map(Path::new), client);
            cli::sync::run(&config, &store, &provider, &logos)
                .await
                .map(|_| ())
        }
    }
}
