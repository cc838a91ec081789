//! Authenticated API client
//!
//! Public facade over the credential store, the request executor and the
//! refresh coordinator. Callers hand in an [`ApiRequest`] and get back a
//! response or an [`AuthError`]; rejected credentials are renewed and the
//! call replayed transparently.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use storefront_common::security::{KeychainProvider, SecretStore};
use storefront_domain::{AccessCredential, ApiRequest, ApiResponse, ClientConfig, TrackedRequest};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::credential_store::CredentialStore;
use super::errors::AuthError;
use super::executor::{ExecutionOutcome, RequestExecutor};
use super::refresh::RefreshCoordinator;
use super::renewal::{CredentialRenewer, HttpRenewer};
use super::session::{SessionEvent, SessionEvents};
use super::transport::{HttpTransport, Transport};
use crate::http::HttpClient;

/// API client that renews rejected credentials and replays the call once
///
/// Each client owns its own refresh state, so independent clients never
/// coordinate with each other. Clones share the same state.
#[derive(Clone)]
pub struct AuthenticatedClient {
    config: Arc<ClientConfig>,
    store: CredentialStore,
    executor: RequestExecutor,
    coordinator: RefreshCoordinator,
    events: SessionEvents,
}

impl AuthenticatedClient {
    /// Create a client with the default keychain storage and HTTP transport
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be built
    pub fn new(config: ClientConfig) -> Result<Self, AuthError> {
        Self::builder().config(config).build()
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> AuthenticatedClientBuilder {
        AuthenticatedClientBuilder::default()
    }

    /// Configuration this client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a request, renewing the credential once if the server rejects it
    ///
    /// # Returns
    ///
    /// The successful (2xx) response
    ///
    /// # Errors
    ///
    /// - [`AuthError::AuthRejected`] for a 401 on an excluded endpoint
    /// - [`AuthError::RefreshFailed`] when the renewal was refused, errored
    ///   or timed out; the session has ended
    /// - [`AuthError::RetryExhausted`] when the replay was rejected as well
    /// - any other variant for transport or HTTP failures
    #[instrument(
        skip(self, request),
        fields(request_id = %Uuid::now_v7(), method = %request.method(), url = %request.url())
    )]
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AuthError> {
        let mut tracked = TrackedRequest::new(request);
        let mut outcome = self.executor.execute(tracked.request()).await;

        loop {
            let signal = match outcome {
                ExecutionOutcome::Success(response) => {
                    debug!(status = response.status, "Request succeeded");
                    return Ok(response);
                }
                ExecutionOutcome::Failure(err) => {
                    debug!(error = %err, "Request failed");
                    return Err(err);
                }
                ExecutionOutcome::Unauthorized(signal) => signal,
            };

            if self.config.is_excluded(tracked.request().url()) {
                debug!("Credential rejected on excluded endpoint, not renewing");
                return Err(AuthError::AuthRejected(signal.message));
            }

            if tracked.marker().is_replayed() {
                warn!("Credential rejected again after renewal");
                return Err(AuthError::RetryExhausted(signal.message));
            }

            // On failure the coordinator has cleared the store and emitted
            // SessionEvent::Ended.
            let credential = self.coordinator.refresh_or_wait(signal.presented.as_ref()).await?;

            debug!("Replaying request with renewed credential");
            tracked = tracked.into_replay();
            outcome = self.executor.execute_with(tracked.request(), Some(credential)).await;
        }
    }

    /// GET `path` (relative to the base URL) and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AuthError> {
        let response = self.send(ApiRequest::get(path)).await?;
        decode_body(&response)
    }

    /// POST `body` as JSON to `path` and decode the JSON response
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, AuthError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::post(path)
            .with_json(body)
            .map_err(|e| AuthError::Config(format!("Failed to serialize body: {}", e)))?;
        let response = self.send(request).await?;
        decode_body(&response)
    }

    /// Install a credential obtained by the embedding application at login
    pub async fn sign_in(&self, credential: AccessCredential) {
        info!("Signed in");
        self.store.set(credential).await;
    }

    /// Forget the current credential
    pub async fn sign_out(&self) {
        info!("Signed out");
        self.store.clear().await;
    }

    /// Whether a credential is held, in memory or in durable storage
    pub async fn is_authenticated(&self) -> bool {
        self.store.get().await.is_some()
    }

    /// Receive [`SessionEvent`]s emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Number of renewal calls this client has issued
    pub fn renewal_count(&self) -> u64 {
        self.coordinator.renewal_count()
    }
}

fn decode_body<T: DeserializeOwned>(response: &ApiResponse) -> Result<T, AuthError> {
    response.json().map_err(|e| {
        AuthError::Decode(format!("Failed to parse response ({}): {}", response.status, e))
    })
}

/// Builder for [`AuthenticatedClient`]
///
/// Every collaborator has a production default; tests swap in mocks.
#[derive(Default)]
pub struct AuthenticatedClientBuilder {
    config: Option<ClientConfig>,
    storage: Option<Arc<dyn SecretStore>>,
    transport: Option<Arc<dyn Transport>>,
    renewer: Option<Arc<dyn CredentialRenewer>>,
}

impl AuthenticatedClientBuilder {
    /// Client configuration (defaults to [`ClientConfig::default`])
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Durable storage for the credential (defaults to the OS keychain)
    pub fn storage(mut self, storage: Arc<dyn SecretStore>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Transport for API and renewal calls (defaults to reqwest with a
    /// cookie jar)
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Renewal strategy (defaults to `POST <base>/auth/refresh`)
    pub fn renewer(mut self, renewer: Arc<dyn CredentialRenewer>) -> Self {
        self.renewer = Some(renewer);
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns error if the default HTTP client cannot be created
    pub fn build(self) -> Result<AuthenticatedClient, AuthError> {
        let config = Arc::new(self.config.unwrap_or_default());

        let storage: Arc<dyn SecretStore> = match self.storage {
            Some(storage) => storage,
            None => Arc::new(KeychainProvider::new(config.storage_service.clone())),
        };

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => {
                let mut http = HttpClient::builder().timeout(config.request_timeout());
                if let Some(user_agent) = config.user_agent.as_deref() {
                    http = http.user_agent(user_agent);
                }
                if let Some(proxy) = config.proxy.as_deref() {
                    http = http.proxy(proxy);
                }
                let http = http
                    .build()
                    .map_err(|e| AuthError::Config(format!("Failed to build HttpClient: {}", e)))?;
                Arc::new(HttpTransport::new(http, config.request_timeout()))
            }
        };

        let renewer: Arc<dyn CredentialRenewer> = match self.renewer {
            Some(renewer) => renewer,
            None => Arc::new(HttpRenewer::new(Arc::clone(&transport), config.refresh_url())),
        };

        let store = CredentialStore::new(storage, config.credential_key.clone());
        let events = SessionEvents::new();
        let coordinator =
            RefreshCoordinator::new(renewer, store.clone(), config.refresh_timeout(), events.clone());
        let executor = RequestExecutor::new(transport, store.clone(), Arc::clone(&config));

        Ok(AuthenticatedClient { config, store, executor, coordinator, events })
    }
}
