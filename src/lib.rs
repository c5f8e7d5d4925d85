//! HTTP/HTTPS forward proxy library.
//!
//! Relays plain HTTP requests to origin servers and opens raw CONNECT
//! tunnels for everything else (TLS, WebSocket), optionally behind
//! `Proxy-Authorization: Basic` credentials.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;
pub mod tunnel;

pub use config::schema::ProxyConfig;
pub use http::ProxyServer;
pub use lifecycle::Shutdown;
pub use security::{AuthGate, CredentialTable};
