//! Observability subsystem.
//!
//! All subsystems emit `tracing` events with structured fields
//! (`peer`, `target`, `session`, `status`); `logging.rs` installs the
//! subscriber that renders them.

pub mod logging;

pub use logging::init_logging;
