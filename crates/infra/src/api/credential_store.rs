//! In-process credential cache mirrored to durable storage

use std::sync::Arc;

use parking_lot::RwLock;
use storefront_common::security::{KeychainError, SecretStore};
use storefront_domain::AccessCredential;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task;
use tracing::{debug, warn};

/// Memory view of the credential.
#[derive(Debug, Clone)]
enum Cached {
    /// Durable storage has not been consulted yet
    Unloaded,
    /// Authoritative value, absence included
    Loaded(Option<AccessCredential>),
}

/// Cache of the current access credential.
///
/// Memory is authoritative while the process lives; durable storage covers
/// restarts. Storage failures are logged and otherwise ignored: a failing
/// read reads as "absent", a failing write still updates memory. Clones share
/// the same cache.
///
/// The memory lock is never held across storage I/O. Storage calls run on
/// the blocking pool, and writes are serialised so durable storage always
/// converges to the latest memory value.
#[derive(Clone)]
pub struct CredentialStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    memory: RwLock<Cached>,
    persist_lock: AsyncMutex<()>,
    storage: Arc<dyn SecretStore>,
    key: String,
}

impl CredentialStore {
    /// Create a store persisting under `key` in `storage`.
    pub fn new(storage: Arc<dyn SecretStore>, key: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                memory: RwLock::new(Cached::Unloaded),
                persist_lock: AsyncMutex::new(()),
                storage,
                key: key.into(),
            }),
        }
    }

    /// Current credential, from memory or else from durable storage.
    ///
    /// The durable read happens at most once; its result, absence included,
    /// is cached.
    pub async fn get(&self) -> Option<AccessCredential> {
        let cached = self.inner.memory.read().clone();
        if let Cached::Loaded(credential) = cached {
            return credential;
        }

        let loaded = self.read_durable().await;

        // A set() or clear() that landed during the read wins over it.
        let mut memory = self.inner.memory.write();
        match &*memory {
            Cached::Loaded(credential) => credential.clone(),
            Cached::Unloaded => {
                if loaded.is_some() {
                    debug!(key = %self.inner.key, "Credential restored from durable storage");
                }
                *memory = Cached::Loaded(loaded.clone());
                loaded
            }
        }
    }

    /// Memory value only; `None` when absent or not yet loaded.
    pub fn cached(&self) -> Option<AccessCredential> {
        match &*self.inner.memory.read() {
            Cached::Loaded(credential) => credential.clone(),
            Cached::Unloaded => None,
        }
    }

    /// Replace the memory value without touching durable storage.
    ///
    /// Follow with [`Self::persist`].
    pub fn cache(&self, credential: Option<AccessCredential>) {
        *self.inner.memory.write() = Cached::Loaded(credential);
    }

    /// Replace the current credential in memory and durable storage.
    pub async fn set(&self, credential: AccessCredential) {
        self.cache(Some(credential));
        self.persist().await;
    }

    /// Remove the credential from memory and durable storage.
    pub async fn clear(&self) {
        self.cache(None);
        self.persist().await;
    }

    /// Write the current memory value to durable storage.
    pub async fn persist(&self) {
        let _guard = self.inner.persist_lock.lock().await;

        let cached = self.inner.memory.read().clone();
        let Cached::Loaded(snapshot) = cached else {
            return;
        };

        let storage = Arc::clone(&self.inner.storage);
        let key = self.inner.key.clone();
        let result = task::spawn_blocking(move || match snapshot {
            Some(credential) => storage.set_secret(&key, credential.as_str()),
            None => storage.delete_secret(&key),
        })
        .await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(key = %self.inner.key, error = %err, "Credential storage write failed");
            }
            Err(err) => {
                warn!(key = %self.inner.key, error = %err, "Credential storage task failed");
            }
        }
    }

    async fn read_durable(&self) -> Option<AccessCredential> {
        let storage = Arc::clone(&self.inner.storage);
        let key = self.inner.key.clone();

        match task::spawn_blocking(move || storage.get_secret(&key)).await {
            Ok(Ok(value)) => AccessCredential::parse(&value),
            Ok(Err(KeychainError::NotFound)) => None,
            Ok(Err(err)) => {
                warn!(key = %self.inner.key, error = %err, "Credential storage read failed");
                None
            }
            Err(err) => {
                warn!(key = %self.inner.key, error = %err, "Credential storage task failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use storefront_common::testing::MockKeychainProvider;

    use super::*;

    fn store_with(keychain: &MockKeychainProvider) -> CredentialStore {
        CredentialStore::new(Arc::new(keychain.clone()), "accessToken")
    }

    /// Keychain whose every call blocks the calling thread.
    struct SlowKeychain {
        inner: MockKeychainProvider,
        delay: Duration,
    }

    impl SecretStore for SlowKeychain {
        fn get_secret(&self, key: &str) -> Result<String, KeychainError> {
            std::thread::sleep(self.delay);
            self.inner.get_secret(key)
        }

        fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError> {
            std::thread::sleep(self.delay);
            self.inner.set_secret(key, value)
        }

        fn delete_secret(&self, key: &str) -> Result<(), KeychainError> {
            std::thread::sleep(self.delay);
            self.inner.delete_secret(key)
        }
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let keychain = MockKeychainProvider::default();
        let store = store_with(&keychain);

        store.set(AccessCredential::new("tok1")).await;

        assert_eq!(store.get().await, Some(AccessCredential::new("tok1")));
        assert_eq!(keychain.get_secret("accessToken").unwrap(), "tok1");
    }

    #[tokio::test]
    async fn test_clear_then_get_is_absent() {
        let keychain = MockKeychainProvider::default();
        let store = store_with(&keychain);

        store.set(AccessCredential::new("tok1")).await;
        store.clear().await;

        assert_eq!(store.get().await, None);
        assert!(!keychain.secret_exists("accessToken"));
    }

    #[tokio::test]
    async fn test_restores_from_durable_storage() {
        let keychain = MockKeychainProvider::default();
        keychain.set_secret("accessToken", "persisted").unwrap();

        let store = store_with(&keychain);
        assert_eq!(store.cached(), None);
        assert_eq!(store.get().await, Some(AccessCredential::new("persisted")));

        // second read is served from memory
        let before = keychain.operation_count();
        assert_eq!(store.get().await, Some(AccessCredential::new("persisted")));
        assert_eq!(keychain.operation_count(), before);
    }

    #[tokio::test]
    async fn test_absence_is_cached() {
        let keychain = MockKeychainProvider::default();
        let store = store_with(&keychain);

        assert_eq!(store.get().await, None);
        assert_eq!(store.get().await, None);
        assert_eq!(keychain.operation_count(), 1);

        // clear() knows the value is gone; no read-back afterwards
        store.clear().await;
        let after_clear = keychain.operation_count();
        assert_eq!(store.get().await, None);
        assert_eq!(keychain.operation_count(), after_clear);
    }

    #[tokio::test]
    async fn test_storage_failures_never_escape() {
        let keychain = MockKeychainProvider::default();
        keychain.set_failing(true);
        let store = store_with(&keychain);

        assert_eq!(store.get().await, None);

        store.set(AccessCredential::new("tok1")).await;
        assert_eq!(store.get().await, Some(AccessCredential::new("tok1")));

        store.clear().await;
        assert_eq!(store.get().await, None);
    }

    #[tokio::test]
    async fn test_blank_persisted_value_is_absent() {
        let keychain = MockKeychainProvider::default();
        keychain.set_secret("accessToken", "  ").unwrap();

        assert_eq!(store_with(&keychain).get().await, None);
    }

    #[tokio::test]
    async fn test_clones_share_cache() {
        let store = store_with(&MockKeychainProvider::default());
        let clone = store.clone();

        store.set(AccessCredential::new("tok2")).await;
        assert_eq!(clone.get().await, Some(AccessCredential::new("tok2")));
    }

    #[tokio::test]
    async fn test_cache_then_persist_writes_latest_value() {
        let keychain = MockKeychainProvider::default();
        let store = store_with(&keychain);

        store.cache(Some(AccessCredential::new("tok1")));
        assert!(!keychain.secret_exists("accessToken"));
        assert_eq!(store.cached(), Some(AccessCredential::new("tok1")));

        store.cache(Some(AccessCredential::new("tok2")));
        store.persist().await;
        assert_eq!(keychain.get_secret("accessToken").unwrap(), "tok2");
    }

    #[tokio::test]
    async fn test_blocking_storage_does_not_stall_runtime() {
        let keychain =
            SlowKeychain { inner: MockKeychainProvider::default(), delay: Duration::from_millis(200) };
        let store = CredentialStore::new(Arc::new(keychain), "accessToken");

        // current-thread runtime: the ticker only runs if set() yields
        let ticker = tokio::spawn(async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Instant::now()
        });

        store.set(AccessCredential::new("tok1")).await;
        let stored_at = Instant::now();

        assert!(ticker.await.unwrap() < stored_at);
        assert_eq!(store.get().await, Some(AccessCredential::new("tok1")));
    }

    #[tokio::test]
    async fn test_concurrent_set_and_clear_converge() {
        let keychain = MockKeychainProvider::default();
        let store = store_with(&keychain);

        tokio::join!(store.set(AccessCredential::new("tok1")), store.clear());

        // durable storage always matches memory once writes have settled
        match store.get().await {
            Some(credential) => {
                assert_eq!(keychain.get_secret("accessToken").unwrap(), credential.as_str());
            }
            None => assert!(!keychain.secret_exists("accessToken")),
        }
    }
}
