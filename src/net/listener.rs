//! TCP listener binding.
//!
//! # Responsibilities
//! - Resolve the configured `ip:port`
//! - Bind the listening socket
//! - Report the bound address (useful with port 0)

use std::io;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
}

/// Bind to the configured address.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
    let address = config.address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| ListenerError::Bind {
            address: address.clone(),
            source,
        })?;

    match listener.local_addr() {
        Ok(local_addr) => tracing::info!(
            address = %local_addr,
            tls = config.tls_enabled(),
            "Listener bound"
        ),
        Err(e) => tracing::debug!(error = %e, "Bound listener has no local address"),
    }

    Ok(listener)
}
