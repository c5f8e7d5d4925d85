//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the bind IP parses as an IPv4 or IPv6 address
//! - Check the auth specification builds a credential table
//! - Validate value ranges (timeouts > 0 when set)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - A lone certificate or key is not an error; the listener stays plain
//! - Runs before the listener is bound

use std::net::IpAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::security::{CredentialError, CredentialTable};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.ip must not be empty")]
    EmptyBindIp,

    #[error("listener.ip is not an IP address: {0}")]
    InvalidBindIp(String),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let ip = config.listener.ip.trim();
    if ip.is_empty() {
        errors.push(ValidationError::EmptyBindIp);
    } else if bare_ip(ip).parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidBindIp(ip.to_string()));
    }

    let listener = &config.listener;
    if !listener.tls_enabled() && (listener.cert_path.is_some() || listener.key_path.is_some()) {
        tracing::warn!(
            cert_path = ?listener.cert_path,
            key_path = ?listener.key_path,
            "Only one of certificate/key configured, TLS stays disabled"
        );
    }

    let timeouts = [
        ("connect_secs", config.timeouts.connect_secs),
        ("request_secs", config.timeouts.request_secs),
        ("tunnel_idle_secs", config.timeouts.tunnel_idle_secs),
    ];
    for (name, value) in timeouts {
        if value == Some(0) {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    if let Err(e) = CredentialTable::parse(&config.auth.credentials) {
        errors.push(e.into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Strip the brackets of an IPv6 literal such as `[::1]`.
fn bare_ip(ip: &str) -> &str {
    ip.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(ip)
}
