//! Mock implementations of platform traits

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::security::{KeychainError, SecretStore};

type StorageData = Arc<Mutex<HashMap<String, String>>>;

/// Mock keychain provider that stores secrets in memory.
///
/// Clones share storage. `set_failing(true)` makes every operation return
/// `KeychainError::AccessFailed`, which is how tests simulate a locked or
/// unavailable keychain.
#[derive(Clone, Debug)]
pub struct MockKeychainProvider {
    storage: StorageData,
    failing: Arc<AtomicBool>,
    operations: Arc<AtomicUsize>,
    service_name: String,
}

impl MockKeychainProvider {
    /// Create a new mock keychain provider with a service name for namespacing.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            storage: Arc::new(Mutex::new(HashMap::new())),
            failing: Arc::new(AtomicBool::new(false)),
            operations: Arc::new(AtomicUsize::new(0)),
            service_name: service_name.into(),
        }
    }

    /// Service name this mock was created for.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Make every subsequent operation fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of get/set/delete calls observed, failed ones included.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    /// Store an arbitrary secret value in memory.
    pub fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError> {
        self.check()?;
        // SAFETY: Mutex poisoning is acceptable in test mocks
        self.storage.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Retrieve a secret value or return `KeychainError::NotFound`.
    pub fn get_secret(&self, key: &str) -> Result<String, KeychainError> {
        self.check()?;
        self.storage.lock().unwrap().get(key).cloned().ok_or(KeychainError::NotFound)
    }

    /// Delete a secret value (idempotent).
    pub fn delete_secret(&self, key: &str) -> Result<(), KeychainError> {
        self.check()?;
        self.storage.lock().unwrap().remove(key);
        Ok(())
    }

    /// Determine whether a secret exists, bypassing failure injection.
    #[must_use]
    pub fn secret_exists(&self, key: &str) -> bool {
        self.storage.lock().unwrap().contains_key(key)
    }

    fn check(&self) -> Result<(), KeychainError> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            Err(KeychainError::AccessFailed("mock keychain unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for MockKeychainProvider {
    fn default() -> Self {
        Self::new("storefront-test")
    }
}

impl SecretStore for MockKeychainProvider {
    fn get_secret(&self, key: &str) -> Result<String, KeychainError> {
        Self::get_secret(self, key)
    }

    fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError> {
        Self::set_secret(self, key, value)
    }

    fn delete_secret(&self, key: &str) -> Result<(), KeychainError> {
        Self::delete_secret(self, key)
    }
}
