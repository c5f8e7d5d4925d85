//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig
//!     → listener.rs (bind ip:port)
//!     → tls.rs (optional certificate/key loading, origin trust roots)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - TLS is enabled only when both certificate and key are configured
//! - Binding happens last during startup, after every config check passed

pub mod listener;
pub mod tls;

pub use listener::{bind, ListenerError};
pub use tls::{load_tls_config, origin_client_config, TlsError};
