//! Client configuration structures

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_CREDENTIAL_KEY, DEFAULT_EXCLUDED_PATHS, DEFAULT_REFRESH_TIMEOUT_MS,
    DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_STORAGE_SERVICE, REFRESH_PATH,
};

/// Configuration for the authenticated API client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL for the API (e.g., "https://shop.example.com/api")
    pub base_url: String,
    /// Path of the renewal endpoint, relative to `base_url`
    pub refresh_path: String,
    /// Timeout for ordinary API calls, in milliseconds
    pub request_timeout_ms: u64,
    /// Upper bound for a single renewal call, in milliseconds
    pub refresh_timeout_ms: u64,
    /// URL fragments that never trigger or await a renewal
    pub excluded_paths: Vec<String>,
    /// Keychain service name used for durable credential storage
    pub storage_service: String,
    /// Key under which the access credential is persisted
    pub credential_key: String,
    /// `User-Agent` header for every call
    pub user_agent: Option<String>,
    /// Proxy for every call; system proxy settings apply when unset
    pub proxy: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh_path: REFRESH_PATH.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            refresh_timeout_ms: DEFAULT_REFRESH_TIMEOUT_MS,
            excluded_paths: DEFAULT_EXCLUDED_PATHS.iter().map(|p| (*p).to_string()).collect(),
            storage_service: DEFAULT_STORAGE_SERVICE.to_string(),
            credential_key: DEFAULT_CREDENTIAL_KEY.to_string(),
            user_agent: None,
            proxy: None,
        }
    }
}

impl ClientConfig {
    /// Create a configuration for `base_url` with every other field defaulted.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Self::default() }
    }

    /// `request_timeout_ms` as a [`Duration`]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// `refresh_timeout_ms` as a [`Duration`]
    #[must_use]
    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.refresh_timeout_ms)
    }

    /// Absolute URL of the renewal endpoint.
    #[must_use]
    pub fn refresh_url(&self) -> String {
        self.resolve_url(&self.refresh_path)
    }

    /// Resolve a request URL against `base_url`.
    ///
    /// Absolute `http`/`https` URLs are returned unchanged.
    #[must_use]
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }

        let base = self.base_url.trim_end_matches('/');
        let path = url.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        }
    }

    /// Whether `url` targets an endpoint that must bypass renewal.
    ///
    /// Matching is by substring so both relative paths and absolute URLs
    /// (with or without query strings) are recognised.
    #[must_use]
    pub fn is_excluded(&self, url: &str) -> bool {
        self.excluded_paths.iter().filter(|p| !p.is_empty()).any(|p| url.contains(p.as_str()))
    }
}
