//! Atelier access-control API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use atelier_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, init_tracing};
use crate::api_router::build_router;
use crate::api_services::{build_app_state, connect_and_migrate};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    if config.migrate_only {
        if let Some(database_url) = config.database_url.as_deref() {
            connect_and_migrate(database_url).await?;
        }
        info!("database migrations applied successfully");
        return Ok(());
    }

    let app_state = build_app_state(&config).await?;
    let app = build_router(app_state, &config.frontend_url)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;

    info!(%address, "atelier api listening");
    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server failed: {error}")))
}
