use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use argus_client::{ArgusClient, HttpBackend};
use dashboard::{DashboardStore, FetchOrchestrator};
use market_core::Catalog;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod markdown;
mod widgets;

use app::App;
use config::AppConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Load .env and configuration while the terminal is still ours to print to
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    // 2. Logs go to a file; stdout belongs to the dashboard
    init_tracing(&config)?;

    // Panic hook: give the terminal back before reporting
    std::panic::set_hook(Box::new(|info| {
        app::restore_terminal();
        eprintln!("PANIC: {info}");
        tracing::error!("PANIC: {info}");
    }));

    tracing::info!("Starting Argus futures terminal");
    tracing::info!("  Backend: {}", config.api.base_url);
    tracing::info!(
        "  Transport timeout: {}",
        config
            .api
            .timeout
            .map(|t| format!("{}s", t.as_secs()))
            .unwrap_or_else(|| "none".to_string())
    );
    tracing::info!("  Run policy: {:?}", config.run_policy);

    // 3. Instrument catalog
    let catalog = match &config.catalog_path {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("Failed to load catalog from {}", path.display()))?,
        None => Catalog::builtin().context("Bundled catalog is invalid")?,
    };
    tracing::info!("Catalog loaded: {} instruments", catalog.len());

    // 4. Backend client
    let client = ArgusClient::new(config.api.clone()).context("Failed to build HTTP client")?;
    match tokio::time::timeout(Duration::from_secs(3), client.ping()).await {
        Ok(true) => tracing::info!("Argus backend reachable at {}", client.base_url()),
        _ => tracing::warn!(
            "Argus backend at {} is not answering; runs will fail until it is up",
            client.base_url()
        ),
    }

    // 5. State, orchestration, UI
    let store = DashboardStore::new(Arc::new(catalog));
    let orchestrator = FetchOrchestrator::new(Arc::new(HttpBackend::from(client)), store)
        .with_policy(config.run_policy);

    App::new(orchestrator, config.chart_height).run().await?;

    tracing::info!("Argus terminal closed");
    Ok(())
}

fn init_tracing(config: &AppConfig) -> Result<()> {
    if let Some(dir) = config.log_file.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("Failed to open log file {}", config.log_file.display()))?;
    let writer = Mutex::new(file);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(writer)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(writer)
            .init();
    }
    Ok(())
}
