//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! client.

// Endpoints
/// Base URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:4000/api";
/// Renewal endpoint, relative to the base URL
pub const REFRESH_PATH: &str = "/auth/refresh";
/// Sign-in endpoint
pub const LOGIN_PATH: &str = "/auth/login";
/// Account registration endpoint
pub const REGISTER_PATH: &str = "/auth/register";
/// Password reset request endpoint
pub const FORGOT_PASSWORD_PATH: &str = "/auth/forgot-password";
/// Password reset confirmation endpoint
pub const RESET_PASSWORD_PATH: &str = "/auth/reset-password";

/// Endpoints that must never trigger or await a credential renewal.
pub const DEFAULT_EXCLUDED_PATHS: [&str; 5] =
    [LOGIN_PATH, REGISTER_PATH, REFRESH_PATH, FORGOT_PASSWORD_PATH, RESET_PASSWORD_PATH];

// Timeouts
/// Ordinary API call timeout
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
/// Renewal call timeout
pub const DEFAULT_REFRESH_TIMEOUT_MS: u64 = 10_000;

// Durable storage
/// Keychain service name
pub const DEFAULT_STORAGE_SERVICE: &str = "Storefront.api";
/// Keychain entry holding the access credential
pub const DEFAULT_CREDENTIAL_KEY: &str = "accessToken";

// Session event fan-out
/// Events buffered per lagging subscriber
pub const SESSION_EVENT_CAPACITY: usize = 16;
