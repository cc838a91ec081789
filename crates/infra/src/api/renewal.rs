//! Renewal endpoint client
//!
//! Obtains a fresh access credential from `POST <base>/auth/refresh`. The
//! renewal ticket is not handled here: it travels in the transport's cookie
//! jar, set by the server at login.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use storefront_domain::{AccessCredential, ApiRequest};
use tracing::{debug, warn};

use super::errors::AuthError;
use super::transport::Transport;

/// Source of new access credentials
///
/// This trait allows dependency injection and testing with scripted
/// renewers.
#[async_trait]
pub trait CredentialRenewer: Send + Sync {
    /// Perform one renewal call.
    async fn renew(&self) -> Result<AccessCredential, AuthError>;
}

/// Renews through the storefront's refresh endpoint
pub struct HttpRenewer {
    transport: Arc<dyn Transport>,
    refresh_url: String,
}

impl HttpRenewer {
    /// Renew by POSTing to `refresh_url` over `transport`.
    pub fn new(transport: Arc<dyn Transport>, refresh_url: impl Into<String>) -> Self {
        Self { transport, refresh_url: refresh_url.into() }
    }
}

#[async_trait]
impl CredentialRenewer for HttpRenewer {
    async fn renew(&self) -> Result<AccessCredential, AuthError> {
        debug!(url = %self.refresh_url, "Requesting credential renewal");

        let request = ApiRequest::post(self.refresh_url.as_str());
        let response = self.transport.send(&request).await?;

        if !response.is_success() {
            warn!(status = response.status, "Renewal endpoint rejected the ticket");
            return Err(AuthError::Http { status: response.status, message: response.text() });
        }

        let body: RenewalBody = serde_json::from_slice(&response.body)
            .map_err(|e| AuthError::Decode(format!("Invalid renewal response: {}", e)))?;

        body.into_credential().ok_or_else(|| {
            AuthError::Decode("Renewal response did not contain an access token".to_string())
        })
    }
}

/// Accepts `{"accessToken": ..}`, `{"access_token": ..}` and the same nested
/// under `data`.
#[derive(Debug, Deserialize)]
struct RenewalBody {
    #[serde(rename = "accessToken", alias = "access_token")]
    access_token: Option<String>,
    data: Option<Box<RenewalBody>>,
}

impl RenewalBody {
    fn into_credential(self) -> Option<AccessCredential> {
        self.access_token
            .as_deref()
            .and_then(AccessCredential::parse)
            .or_else(|| self.data.and_then(|nested| (*nested).into_credential()))
    }
}
