//! API-specific error types
//!
//! Every outcome of [`super::AuthenticatedClient::send`] that is not a
//! successful response is one of these values.

use std::time::Duration;

use storefront_domain::StorefrontError;
use thiserror::Error;

/// Categories of API errors, for callers deciding how to react
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorCategory {
    /// The session is gone; the embedding application should sign in again
    SessionEnded,
    /// Credential rejected without a renewal being attempted or allowed
    Authentication,
    /// Transport-level failure or timeout
    Network,
    /// Server answered with a non-success status other than 401
    Http,
    /// Response body could not be decoded
    Decode,
    /// Misconfiguration or invalid request
    Config,
}

/// Failure outcomes of an authenticated call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Connection or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// No response within the request timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Non-success status that is not handled by renewal
    #[error("HTTP {status}: {message}")]
    Http {
        /// Response status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// 401 on an endpoint that must not trigger a renewal
    #[error("Credential rejected: {0}")]
    AuthRejected(String),

    /// The renewal call was rejected, errored or timed out
    #[error("Session renewal failed: {0}")]
    RefreshFailed(String),

    /// Still unauthorized after a successful renewal and one replay
    #[error("Still unauthorized after renewal: {0}")]
    RetryExhausted(String),

    /// Response body did not match the expected type
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Invalid configuration or request
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Get the error category for this error
    pub fn category(&self) -> AuthErrorCategory {
        match self {
            Self::RefreshFailed(_) => AuthErrorCategory::SessionEnded,
            Self::AuthRejected(_) | Self::RetryExhausted(_) => AuthErrorCategory::Authentication,
            Self::Network(_) | Self::Timeout(_) => AuthErrorCategory::Network,
            Self::Http { .. } => AuthErrorCategory::Http,
            Self::Decode(_) => AuthErrorCategory::Decode,
            Self::Config(_) => AuthErrorCategory::Config,
        }
    }

    /// True when the embedding application should clear session state and
    /// send the user to sign-in.
    pub fn is_session_ended(&self) -> bool {
        self.category() == AuthErrorCategory::SessionEnded
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::AuthRejected(_) | Self::RetryExhausted(_) => Some(401),
            _ => None,
        }
    }
}

impl From<StorefrontError> for AuthError {
    fn from(err: StorefrontError) -> Self {
        match err {
            StorefrontError::Network(message) => Self::Network(message),
            StorefrontError::Config(message) | StorefrontError::InvalidInput(message) => {
                Self::Config(message)
            }
            StorefrontError::Storage(message) | StorefrontError::Internal(message) => {
                Self::Network(message)
            }
        }
    }
}
