//! Access credential value type

use std::fmt;

use serde::{Deserialize, Serialize};

/// Short-lived bearer credential.
///
/// Opaque to the client: it carries no expiry, validity is only discovered
/// when the server rejects it. `Debug` output is redacted so the value never
/// reaches logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessCredential(String);

impl AccessCredential {
    /// Wrap a credential string as issued by the server.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Parse a persisted value, treating blank strings as absent.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Raw credential value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessCredential(***)")
    }
}

impl From<String> for AccessCredential {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for AccessCredential {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
