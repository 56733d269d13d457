// src/main.rs
use aidly_lib::{
    api::{AppState, create_api_routes},
    config::{self, APP_NAME, AppConfig},
};
use anyhow::{Context, Result};
use log::{error, info};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    config::load_env_files();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            return Err(e);
        }
    };
    config.log_summary();

    let addr = config.bind_address();
    let app_state = Arc::new(AppState::from_config(config).context("Failed to start services")?);

    let app = create_api_routes(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Starting {} API server on {}", APP_NAME, addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("{} shutting down", APP_NAME);

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
