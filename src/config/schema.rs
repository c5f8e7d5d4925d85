//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the forward proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Proxy authentication.
    pub auth: AuthConfig,

    /// Optional dial/request/idle deadlines.
    pub timeouts: TimeoutConfig,

    /// TLS settings for `https://` origins reached by the forwarder.
    pub origin: OriginConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// IP address to bind to.
    pub ip: String,

    /// Port to bind to.
    pub port: u16,

    /// Certificate file (PEM). TLS is only enabled if `key_path` is also set.
    pub cert_path: Option<PathBuf>,

    /// Private key file (PEM).
    pub key_path: Option<PathBuf>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            ip: "127.0.0.1".to_string(),
            port: 1081,
            cert_path: None,
            key_path: None,
        }
    }
}

impl ListenerConfig {
    /// Bind address including the port, e.g. `127.0.0.1:1081` or `[::1]:1081`.
    pub fn address(&self) -> String {
        if self.ip.contains(':') && !self.ip.starts_with('[') {
            format!("[{}]:{}", self.ip, self.port)
        } else {
            format!("{}:{}", self.ip, self.port)
        }
    }

    /// Certificate and key paths, present only when both are configured.
    pub fn tls_paths(&self) -> Option<(&Path, &Path)> {
        let cert = self.cert_path.as_deref().filter(|p| !p.as_os_str().is_empty())?;
        let key = self.key_path.as_deref().filter(|p| !p.as_os_str().is_empty())?;
        Some((cert, key))
    }

    /// True iff both a certificate and a key are configured.
    pub fn tls_enabled(&self) -> bool {
        self.tls_paths().is_some()
    }
}

/// Proxy authentication configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Raw credential list, `user1:pass1;user2:pass2`. Empty disables auth.
    pub credentials: String,
}

/// Timeout configuration for network operations.
///
/// Every deadline is off unless set.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Origin dial timeout in seconds (HTTP forward and CONNECT).
    pub connect_secs: Option<u64>,

    /// Origin round-trip timeout for forwarded HTTP requests, in seconds.
    pub request_secs: Option<u64>,

    /// Per-read idle timeout inside an established tunnel, in seconds.
    pub tunnel_idle_secs: Option<u64>,
}

impl TimeoutConfig {
    pub fn connect(&self) -> Option<Duration> {
        self.connect_secs.map(Duration::from_secs)
    }

    pub fn request(&self) -> Option<Duration> {
        self.request_secs.map(Duration::from_secs)
    }

    pub fn tunnel_idle(&self) -> Option<Duration> {
        self.tunnel_idle_secs.map(Duration::from_secs)
    }
}

/// Origin TLS configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Extra PEM root certificates trusted for origin TLS, on top of the
    /// bundled web PKI roots.
    pub ca_path: Option<PathBuf>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
