//! Proxy authentication gate.
//!
//! Enforces HTTP Basic credentials carried in `Proxy-Authorization`.

use std::sync::Arc;

use axum::http::{header::PROXY_AUTHORIZATION, HeaderMap};
use base64::{engine::general_purpose, Engine as _};

use crate::security::credentials::CredentialTable;

const BASIC_PREFIX: &str = "Basic ";

/// Username and password decoded from a Basic authorization value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

/// Parse an HTTP Basic authorization value.
///
/// `"Basic dXNlcjpwYXNzd29yZA=="` yields `user` / `password`. The password is
/// everything after the first `:`, so it may itself contain colons.
pub fn parse_basic_auth(value: &str) -> Option<BasicCredentials> {
    let encoded = value.strip_prefix(BASIC_PREFIX)?;
    let decoded = general_purpose::STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Decide whether a request may use the proxy.
///
/// An empty table admits everything, whatever the header says.
pub fn admit(credentials: &CredentialTable, headers: &HeaderMap) -> bool {
    if credentials.is_empty() {
        return true;
    }

    let Some(value) = headers
        .get(PROXY_AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    match parse_basic_auth(value) {
        Some(presented) => credentials.contains(&presented.username, &presented.password),
        None => false,
    }
}

/// Shared handle to the startup-built credential table.
#[derive(Debug, Clone, Default)]
pub struct AuthGate {
    credentials: Arc<CredentialTable>,
}

impl AuthGate {
    pub fn new(credentials: CredentialTable) -> Self {
        Self {
            credentials: Arc::new(credentials),
        }
    }

    /// True when the proxy runs without authentication.
    pub fn is_open(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Number of configured users.
    pub fn users(&self) -> usize {
        self.credentials.len()
    }

    pub fn admit(&self, headers: &HeaderMap) -> bool {
        admit(&self.credentials, headers)
    }
}
