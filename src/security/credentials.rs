//! Username/password table built from the `--auth` specification.

use std::collections::HashMap;
use std::str::FromStr;

use thiserror::Error;

/// Separates entries in the auth specification.
const ENTRY_SEPARATOR: char = ';';
/// Separates username from password inside one entry.
const FIELD_SEPARATOR: char = ':';

/// Error raised while building a [`CredentialTable`].
///
/// This only ever happens at startup; the proxy must refuse to serve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("auth config failed: `{0}` is invalid, expected `user:password`")]
    MalformedEntry(String),
}

/// In-memory mapping of username to password.
///
/// Built once from a string like `alice:secret;bob:hunter2`. Later entries
/// overwrite earlier ones with the same username.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialTable {
    entries: HashMap<String, String>,
}

impl CredentialTable {
    /// Parse an auth specification.
    ///
    /// An empty specification yields an empty table (authentication disabled).
    /// Every entry must contain exactly one `:`.
    pub fn parse(spec: &str) -> Result<Self, CredentialError> {
        let mut entries = HashMap::new();
        if spec.is_empty() {
            return Ok(Self { entries });
        }

        for entry in spec.split(ENTRY_SEPARATOR) {
            let mut fields = entry.split(FIELD_SEPARATOR);
            match (fields.next(), fields.next(), fields.next()) {
                (Some(username), Some(password), None) => {
                    entries.insert(username.to_string(), password.to_string());
                }
                _ => return Err(CredentialError::MalformedEntry(entry.to_string())),
            }
        }

        Ok(Self { entries })
    }

    /// True when no credentials are configured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Exact, case-sensitive match on both username and password.
    pub fn contains(&self, username: &str, password: &str) -> bool {
        self.entries
            .get(username)
            .is_some_and(|expected| expected == password)
    }
}

impl FromStr for CredentialTable {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
