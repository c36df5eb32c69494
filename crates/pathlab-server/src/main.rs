//! Portal server entry point.

use pathlab_db::{DbManager, run_migrations};
use pathlab_server::{AppState, ServerConfig, app};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("pathlab=info".parse()?),
        )
        .json()
        .init();

    let config = ServerConfig::from_env();

    let manager = DbManager::connect(&config.db).await?;
    run_migrations(manager.client()).await?;

    let state = AppState::new(manager.client().clone(), config.auth.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "Portal server listening");

    axum::serve(listener, app(state)).await?;

    Ok(())
}
