//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, plain or TLS serving, upgrades enabled)
//!     → dispatch.rs (auth gate, method classification)
//!     → forward.rs (HTTP/HTTPS origin relay)  |  tunnel (CONNECT)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod forward;
pub mod server;

pub use dispatch::{dispatch, Route};
pub use forward::{ForwardError, OriginClient, X_FORWARDED_FOR};
pub use server::{AppState, ProxyServer, ServerError};
