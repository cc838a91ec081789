//! Trait abstractions for security components
//!
//! These traits let the credential store persist values without depending on
//! a concrete backend, so tests can swap the platform keychain for an
//! in-memory mock.

use super::keychain::KeychainError;

/// Key/value secret storage (`get` / `set` / `remove`).
///
/// Implementations may block briefly (platform keychains do); callers
/// decide how failures degrade.
pub trait SecretStore: Send + Sync {
    /// Retrieve the value stored under `key`.
    ///
    /// # Errors
    /// Returns `KeychainError::NotFound` when nothing is stored, or
    /// `KeychainError::AccessFailed` when the backend is unavailable.
    fn get_secret(&self, key: &str) -> Result<String, KeychainError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns `KeychainError::AccessFailed` when the backend rejects the
    /// write.
    fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError>;

    /// Remove the value under `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    /// Returns `KeychainError::AccessFailed` when the backend rejects the
    /// deletion.
    fn delete_secret(&self, key: &str) -> Result<(), KeychainError>;
}
