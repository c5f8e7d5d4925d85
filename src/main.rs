//! HTTP/HTTPS forward proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ listener (+TLS) ──▶ dispatch ──▶ auth gate ──✗──▶ 403
//!                                      │ admitted
//!                     ┌─── CONNECT ────┴──── other ───┐
//!                     ▼                               ▼
//!                  tunnel ◀═══ raw bytes ═══▶ Origin ◀─── forward
//! ```

use std::path::PathBuf;

use clap::Parser;
use forward_proxy::config::{load_config, ProxyConfig};
use forward_proxy::lifecycle::{self, Shutdown};
use forward_proxy::observability::init_logging;

#[derive(Parser, Debug)]
#[command(name = "forward-proxy")]
#[command(about = "HTTP/HTTPS forward proxy with CONNECT tunnelling", long_about = None)]
struct Cli {
    /// TOML configuration file; flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// The ip address the proxy binds to [default: 127.0.0.1]
    #[arg(long)]
    ip: Option<String>,

    /// The port the proxy binds to [default: 1081]
    #[arg(long)]
    port: Option<u16>,

    /// The path of the certificate file used for TLS
    #[arg(long)]
    cert: Option<PathBuf>,

    /// The path of the key file used for TLS
    #[arg(long)]
    key: Option<PathBuf>,

    /// Auth configuration. If not set, no auth is required. Format: user1:password;user2:password
    #[arg(long)]
    auth: Option<String>,

    /// Extra PEM root certificates trusted for https:// origins
    #[arg(long)]
    origin_ca: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Merge defaults, the optional config file, and flags.
    fn into_config(self) -> Result<ProxyConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(ip) = self.ip {
            config.listener.ip = ip;
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(cert) = self.cert {
            config.listener.cert_path = Some(cert);
        }
        if let Some(key) = self.key {
            config.listener.key_path = Some(key);
        }
        if let Some(auth) = self.auth {
            config.auth.credentials = auth;
        }
        if let Some(ca) = self.origin_ca {
            config.origin.ca_path = Some(ca);
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;
    init_logging(&config.observability);

    tracing::info!(
        bind_address = %config.listener.address(),
        tls = config.listener.tls_enabled(),
        auth = !config.auth.credentials.is_empty(),
        "forward-proxy v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    shutdown.trigger_on_signal();

    if let Err(e) = lifecycle::run(config, receiver).await {
        tracing::error!(error = %e, "Proxy failed to start");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
