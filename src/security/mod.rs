//! Access control subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     auth spec string ("user1:pass1;user2:pass2")
//!     → credentials.rs (parse once, fatal on malformed entry)
//!     → CredentialTable (read-only, shared via Arc)
//!
//! Per request:
//!     Proxy-Authorization header
//!     → auth.rs (decode Basic scheme, look up table)
//!     → admit / deny (403)
//! ```
//!
//! # Design Decisions
//! - An empty table means authentication is disabled, not "nobody matches"
//! - The table is never mutated after startup, so no locking is needed

pub mod auth;
pub mod credentials;

pub use auth::{admit, parse_basic_auth, AuthGate, BasicCredentials};
pub use credentials::{CredentialError, CredentialTable};
