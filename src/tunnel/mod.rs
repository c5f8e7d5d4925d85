//! CONNECT tunnel engine.
//!
//! # Data Flow
//! ```text
//! Admitted CONNECT request
//!     → upgrade.rs (raw-stream capability check)
//!     → connect.rs (dial origin, acknowledge with 200)
//!     → session.rs (two copy tasks, joined, then both sockets closed)
//! ```
//!
//! # Design Decisions
//! - The origin is dialed before the acknowledgement so failures surface as 503
//! - The acknowledgement is flushed by hyper before the upgrade resolves
//! - No protocol inspection of tunneled bytes

pub mod connect;
pub mod session;
pub mod upgrade;

pub use connect::{dial, handle_connect, TunnelConfig, TunnelError};
pub use session::{RelayStats, SessionId, TunnelSession};
pub use upgrade::RawUpgrade;
