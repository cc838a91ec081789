//! Configuration loader
//!
//! Loads the client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `STOREFRONT_API_BASE_URL` is unset, falls back to a config file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `STOREFRONT_API_BASE_URL`: API base URL (required)
//! - `STOREFRONT_REFRESH_PATH`: Renewal endpoint path
//! - `STOREFRONT_REQUEST_TIMEOUT_MS`: API call timeout in milliseconds
//! - `STOREFRONT_REFRESH_TIMEOUT_MS`: Renewal call timeout in milliseconds
//! - `STOREFRONT_EXCLUDED_PATHS`: Comma-separated endpoints that never renew
//! - `STOREFRONT_STORAGE_SERVICE`: Keychain service name
//! - `STOREFRONT_CREDENTIAL_KEY`: Keychain entry for the access credential
//! - `STOREFRONT_USER_AGENT`: User-Agent header
//! - `STOREFRONT_PROXY`: Proxy URL for every call
//!
//! Every variable except the base URL falls back to the
//! [`ClientConfig::default`] value.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./storefront.{json,toml}` or `./config.{json,toml}` (current
//!    working directory)
//! 2. `../config.{json,toml}` (parent directory)
//! 3. Relative to executable location

use std::path::{Path, PathBuf};

use storefront_domain::{ClientConfig, Result, StorefrontError};

const FILE_NAMES: [&str; 4] = ["storefront.json", "storefront.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `StorefrontError::Config` if configuration cannot be loaded from
/// either source or a value is invalid.
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `StorefrontError::Config` if `STOREFRONT_API_BASE_URL` is missing
/// or a timeout is not a number.
pub fn load_from_env() -> Result<ClientConfig> {
    let mut config = ClientConfig::new(env_var("STOREFRONT_API_BASE_URL")?);

    if let Some(path) = optional_env("STOREFRONT_REFRESH_PATH") {
        config.refresh_path = path;
    }
    if let Some(timeout) = optional_env("STOREFRONT_REQUEST_TIMEOUT_MS") {
        config.request_timeout_ms = parse_millis("STOREFRONT_REQUEST_TIMEOUT_MS", &timeout)?;
    }
    if let Some(timeout) = optional_env("STOREFRONT_REFRESH_TIMEOUT_MS") {
        config.refresh_timeout_ms = parse_millis("STOREFRONT_REFRESH_TIMEOUT_MS", &timeout)?;
    }
    if let Some(paths) = optional_env("STOREFRONT_EXCLUDED_PATHS") {
        config.excluded_paths = paths
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(service) = optional_env("STOREFRONT_STORAGE_SERVICE") {
        config.storage_service = service;
    }
    if let Some(key) = optional_env("STOREFRONT_CREDENTIAL_KEY") {
        config.credential_key = key;
    }
    config.user_agent = optional_env("STOREFRONT_USER_AGENT");
    config.proxy = optional_env("STOREFRONT_PROXY");

    validate(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `StorefrontError::Config` if the file is missing, unreadable or
/// invalid.
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(StorefrontError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            StorefrontError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| StorefrontError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration; format is detected by extension, JSON if none.
///
/// # Errors
/// Returns `StorefrontError::Config` if the format is unsupported or parsing
/// fails.
pub fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    let config: ClientConfig = match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| StorefrontError::Config(format!("Invalid TOML format: {}", e)))?,
        "json" => serde_json::from_str(contents)
            .map_err(|e| StorefrontError::Config(format!("Invalid JSON format: {}", e)))?,
        _ => {
            return Err(StorefrontError::Config(format!(
                "Unsupported config format: {}",
                extension
            )))
        }
    };

    validate(config)
}

/// First existing config file among the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join(".."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
            dirs.push(exe_dir.join(".."));
        }
    }

    dirs.iter()
        .flat_map(|dir| FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn validate(config: ClientConfig) -> Result<ClientConfig> {
    if config.base_url.trim().is_empty() {
        return Err(StorefrontError::Config("base_url must not be empty".to_string()));
    }
    if config.refresh_timeout_ms == 0 {
        return Err(StorefrontError::Config("refresh_timeout_ms must be positive".to_string()));
    }
    if config.request_timeout_ms == 0 {
        return Err(StorefrontError::Config("request_timeout_ms must be positive".to_string()));
    }
    Ok(config)
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        StorefrontError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Set and non-blank, trimmed.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_millis(key: &str, value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .map_err(|e| StorefrontError::Config(format!("Invalid {}: {}", key, e)))
}
