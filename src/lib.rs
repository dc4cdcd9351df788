pub mod actions; // Async follow-up dispatcher with retries
pub mod api; // HTTP intake boundary
pub mod config;
pub mod core_state; // Transport-agnostic state
pub mod db;
pub mod models;
pub mod pipeline;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::core_state::{CoreError, CoreState};

/// Initialize tracing, load configuration, open the store and serve the
/// API until Ctrl-C.
pub async fn run() -> Result<(), CoreError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Docflow starting v{}", config::APP_VERSION);

    let config = config::AppConfig::from_env()?;
    let core = Arc::new(CoreState::bootstrap(
        &config,
        tokio::runtime::Handle::current(),
    )?);

    let mut server = api::start_api_server(core, config.bind_addr)
        .await
        .map_err(CoreError::Server)?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Ctrl-C received, shutting down");

    server.shutdown();
    server.stopped().await;
    Ok(())
}
