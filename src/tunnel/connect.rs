//! CONNECT handling: dial the target, acknowledge, hand the client stream to a session.
//!
//! # Flow
//! ```text
//! CONNECT host:port
//!     → take raw-upgrade capability   (missing → 500, nothing dialed)
//!     → dial host:port over TCP       (failure → 503 with the dial error)
//!     → respond 200 Connection established
//!     → [hyper flushes the 200, then resolves the upgrade]
//!     → TunnelSession::relay until both directions finish
//! ```

use std::io;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header::HOST, Request, StatusCode},
    response::{IntoResponse, Response},
};
use hyper::ext::ReasonPhrase;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::TcpStream;

use crate::config::TimeoutConfig;
use crate::tunnel::session::{SessionId, TunnelSession};
use crate::tunnel::upgrade::RawUpgrade;

/// Reason phrase sent with the CONNECT acknowledgement.
pub const CONNECTION_ESTABLISHED: &[u8] = b"Connection established";

/// Errors that stop a tunnel before it is established.
#[derive(Debug, Error)]
pub enum TunnelError {
    #[error("CONNECT request has no host:port target")]
    MissingTarget,

    #[error("dial tcp {target}: {source}")]
    Dial {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("dial tcp {target}: i/o timeout after {timeout:?}")]
    DialTimeout { target: String, timeout: Duration },
}

/// Deadlines applied by the tunnel engine. All are off by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct TunnelConfig {
    pub connect_timeout: Option<Duration>,
    pub idle_timeout: Option<Duration>,
}

impl From<&TimeoutConfig> for TunnelConfig {
    fn from(timeouts: &TimeoutConfig) -> Self {
        Self {
            connect_timeout: timeouts.connect(),
            idle_timeout: timeouts.tunnel_idle(),
        }
    }
}

/// Handle an admitted CONNECT request.
pub async fn handle_connect(mut request: Request<Body>, config: TunnelConfig) -> Response {
    let Some(on_upgrade) = request.take_raw_upgrade() else {
        tracing::error!(uri = %request.uri(), "Server connection does not support raw-stream upgrade");
        return (StatusCode::INTERNAL_SERVER_ERROR, "hijacking not supported").into_response();
    };

    let target = match connect_target(&request) {
        Some(target) => target,
        None => return unavailable(TunnelError::MissingTarget),
    };

    let origin = match dial(&target, config.connect_timeout).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(authority = %target, error = %e, "Tunnel dial failed");
            return unavailable(e);
        }
    };

    let id = SessionId::new();
    tracing::debug!(session = %id, authority = %target, "Tunnel origin connected");

    tokio::spawn(async move {
        match on_upgrade.await {
            Ok(upgraded) => {
                let stats = TunnelSession::new(id, TokioIo::new(upgraded), origin)
                    .with_idle_timeout(config.idle_timeout)
                    .relay()
                    .await;
                tracing::debug!(
                    session = %id,
                    authority = %target,
                    client_to_origin = stats.client_to_origin,
                    origin_to_client = stats.origin_to_client,
                    "Tunnel closed"
                );
            }
            Err(e) => {
                tracing::warn!(session = %id, authority = %target, error = %e, "Raw-stream upgrade failed");
            }
        }
    });

    connection_established()
}

/// Dial the tunnel target, optionally bounded by a deadline.
pub async fn dial(target: &str, timeout: Option<Duration>) -> Result<TcpStream, TunnelError> {
    let connect = TcpStream::connect(target);
    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, connect)
            .await
            .map_err(|_| TunnelError::DialTimeout {
                target: target.to_string(),
                timeout: limit,
            })?,
        None => connect.await,
    };

    result.map_err(|source| TunnelError::Dial {
        target: target.to_string(),
        source,
    })
}

/// `host:port` from the authority-form request target, falling back to `Host`.
fn connect_target<B>(request: &Request<B>) -> Option<String> {
    if let Some(authority) = request.uri().authority() {
        return Some(authority.to_string());
    }
    request
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn unavailable(error: TunnelError) -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, error.to_string()).into_response()
}

fn connection_established() -> Response {
    let mut response = StatusCode::OK.into_response();
    response
        .extensions_mut()
        .insert(ReasonPhrase::from_static(CONNECTION_ESTABLISHED));
    response
}
