pub mod adapters;
mod app;
pub mod client;
pub mod config;
pub mod ports;
pub mod push;
mod state;
#[cfg(test)]
mod testing;
pub mod types;

use std::net::SocketAddr;
use thiserror::Error;
use tracing::info;

pub use app::{app, app_with_sender};
pub use push::generate_vapid_credentials;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Validates the configuration, then binds and serves until the listener
/// fails. Configuration errors are reported before anything is bound.
pub async fn serve(addr: SocketAddr, config: config::AppConfig) -> Result<(), ServeError> {
    let router = app(config)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;
    info!("listening on http://{addr}");
    axum::serve(listener, router).await?;
    Ok(())
}
