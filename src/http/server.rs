//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the dispatcher as its only handler
//! - Build the shared origin client (HTTP and HTTPS origins)
//! - Wire up middleware (tracing)
//! - Serve plain or TLS-terminated connections with upgrade support
//! - Stop accepting on shutdown

use std::net::SocketAddr;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::{ProxyConfig, TimeoutConfig};
use crate::http::dispatch::dispatch;
use crate::http::forward::{origin_client, OriginClient};
use crate::net::{origin_client_config, TlsError};
use crate::security::{AuthGate, CredentialError, CredentialTable};
use crate::tunnel::TunnelConfig;

/// Error building the server's shared state.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    OriginTls(#[from] TlsError),
}

/// Application state injected into the dispatcher.
#[derive(Clone)]
pub struct AppState {
    pub gate: AuthGate,
    pub client: OriginClient,
    pub timeouts: TimeoutConfig,
    pub tunnel: TunnelConfig,
}

/// HTTP server for the forward proxy.
pub struct ProxyServer {
    router: Router,
}

impl ProxyServer {
    /// Create a new server.
    ///
    /// Fails if the auth specification is malformed or the origin CA file
    /// cannot be loaded; nothing is bound yet.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let gate = AuthGate::new(CredentialTable::parse(&config.auth.credentials)?);
        if gate.is_open() {
            tracing::warn!("No credentials configured, proxy is open to every client");
        } else {
            tracing::info!(users = gate.users(), "Proxy authentication enabled");
        }

        let tls = origin_client_config(config.origin.ca_path.as_deref())?;
        let state = AppState {
            gate,
            client: origin_client(config.timeouts.connect(), tls),
            timeouts: config.timeouts.clone(),
            tunnel: TunnelConfig::from(&config.timeouts),
        };

        Ok(Self {
            router: Self::build_router(state),
        })
    }

    /// Build the Axum router.
    ///
    /// CONNECT targets are in authority form and never match a path route,
    /// so the dispatcher is installed as the fallback for every request.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// The router, without connection info attached.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve plain HTTP on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Forward proxy serving HTTP");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Listener stopping");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve TLS-terminated connections on `listener` until `shutdown` fires.
    pub async fn run_tls(
        self,
        listener: TcpListener,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Forward proxy serving HTTPS");

        let handle = axum_server::Handle::new();
        let watcher = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Listener stopping");
            watcher.graceful_shutdown(None);
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::from_tcp_rustls(listener.into_std()?, tls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}
