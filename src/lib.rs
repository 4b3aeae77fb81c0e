pub mod bot;
pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::providers::CbrProvider;
use crate::store::RateStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Commands that need a loaded configuration and a rate store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Bot,
    List,
    Rate { code: String },
    Convert { code: String, amount: String },
}

pub fn build_store(config: &AppConfig) -> Result<RateStore> {
    let source = CbrProvider::new(&config.api_url).context("Failed to create rate source")?;
    Ok(RateStore::new(source, config.cache_ttl()))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("kursbot starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        api_url = %config.api_url,
        cache_ttl_seconds = config.cache_ttl_seconds,
        items_per_page = config.items_per_page,
        "Loaded config"
    );

    let store = build_store(&config)?;

    match command {
        AppCommand::Bot => bot::run(&config, Arc::new(store)).await,
        AppCommand::List => cli::rates::list(&store).await,
        AppCommand::Rate { code } => cli::rates::rate(&store, &code).await,
        AppCommand::Convert { code, amount } => cli::rates::convert(&store, &code, &amount).await,
    }
}
