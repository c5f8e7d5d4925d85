//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate the merged configuration
//! - Build the credential table (fatal on malformed entries)
//! - Load the origin trust roots
//! - Load TLS material when both certificate and key are configured
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener is bound last, so a bad config never opens a socket

use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::{validate_config, ConfigError, ProxyConfig};
use crate::http::{ProxyServer, ServerError};
use crate::net::{self, ListenerError, TlsError};

/// Error that prevents the proxy from serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Start the proxy and serve until `shutdown` fires.
pub async fn run(
    config: ProxyConfig,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), StartupError> {
    validate_config(&config).map_err(ConfigError::Validation)?;

    let tls_paths = config
        .listener
        .tls_paths()
        .map(|(cert, key)| (cert.to_path_buf(), key.to_path_buf()));
    let listener_config = config.listener.clone();

    let server = ProxyServer::new(config)?;

    let tls = match tls_paths {
        Some((cert, key)) => Some(net::load_tls_config(&cert, &key).await?),
        None => None,
    };

    let listener = net::bind(&listener_config).await?;

    match tls {
        Some(tls) => server.run_tls(listener, tls, shutdown).await?,
        None => server.run(listener, shutdown).await?,
    }
    Ok(())
}
