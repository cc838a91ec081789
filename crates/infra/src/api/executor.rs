//! Single outbound call with the current credential attached

use std::sync::Arc;

use storefront_domain::{AccessCredential, ApiRequest, ApiResponse, ClientConfig};
use tracing::debug;

use super::credential_store::CredentialStore;
use super::errors::AuthError;
use super::transport::Transport;

/// The server rejected the credential a request carried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnauthorizedSignal {
    /// Credential attached to the rejected call, if any
    pub presented: Option<AccessCredential>,
    /// Response body, kept for error messages
    pub message: String,
}

/// Classified outcome of one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// 2xx response
    Success(ApiResponse),
    /// 401: the server rejected the attached credential
    Unauthorized(UnauthorizedSignal),
    /// Any other status, or a transport error
    Failure(AuthError),
}

/// Attaches the bearer credential, performs the call, classifies the result.
///
/// Has no side effects beyond the call itself.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    store: CredentialStore,
    config: Arc<ClientConfig>,
}

impl RequestExecutor {
    /// Create an executor resolving URLs against `config.base_url`.
    pub fn new(transport: Arc<dyn Transport>, store: CredentialStore, config: Arc<ClientConfig>) -> Self {
        Self { transport, store, config }
    }

    /// Execute with whatever credential the store currently holds.
    pub async fn execute(&self, request: &ApiRequest) -> ExecutionOutcome {
        let credential = self.store.get().await;
        self.execute_with(request, credential).await
    }

    /// Execute with an explicit credential (or none).
    pub async fn execute_with(
        &self,
        request: &ApiRequest,
        credential: Option<AccessCredential>,
    ) -> ExecutionOutcome {
        let mut outbound = request.clone().with_url(self.config.resolve_url(request.url()));
        if let Some(credential) = credential.as_ref() {
            outbound = outbound.with_header("Authorization", credential.bearer());
        }

        let response = match self.transport.send(&outbound).await {
            Ok(response) => response,
            Err(err) => return ExecutionOutcome::Failure(err),
        };

        if response.is_success() {
            ExecutionOutcome::Success(response)
        } else if response.is_unauthorized() {
            debug!(method = %outbound.method(), url = %outbound.url(), "Credential rejected");
            ExecutionOutcome::Unauthorized(UnauthorizedSignal {
                presented: credential,
                message: response.text(),
            })
        } else {
            ExecutionOutcome::Failure(AuthError::Http {
                status: response.status,
                message: response.text(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use storefront_common::testing::MockKeychainProvider;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    use super::*;
    use crate::api::transport::HttpTransport;
    use crate::http::HttpClient;

    fn executor_for(server: &MockServer) -> (RequestExecutor, CredentialStore) {
        let config = Arc::new(ClientConfig::new(server.uri()));
        let store = CredentialStore::new(Arc::new(MockKeychainProvider::default()), "accessToken");
        let transport = Arc::new(HttpTransport::new(
            HttpClient::new().expect("http client"),
            config.request_timeout(),
        ));
        (RequestExecutor::new(transport, store.clone(), config), store)
    }

    #[tokio::test]
    async fn test_attaches_bearer_and_resolves_relative_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orders"))
            .and(header("Authorization", "Bearer tok1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .expect(1)
            .mount(&server)
            .await;

        let (executor, store) = executor_for(&server);
        store.set(AccessCredential::new("tok1")).await;

        let outcome = executor.execute(&ApiRequest::get("/orders")).await;
        assert!(matches!(outcome, ExecutionOutcome::Success(ref r) if r.text() == "[]"));
    }

    #[tokio::test]
    async fn test_no_credential_means_no_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(|req: &Request| -> ResponseTemplate {
                if req.headers.contains_key("authorization") {
                    ResponseTemplate::new(400)
                } else {
                    ResponseTemplate::new(200)
                }
            })
            .mount(&server)
            .await;

        let (executor, _store) = executor_for(&server);
        let outcome = executor.execute(&ApiRequest::get("/catalog")).await;
        assert!(matches!(outcome, ExecutionOutcome::Success(_)));
    }

    #[tokio::test]
    async fn test_401_is_unauthorized_signal_with_presented_credential() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(401).set_body_string("jwt expired"))
            .mount(&server)
            .await;

        let (executor, store) = executor_for(&server);
        store.set(AccessCredential::new("tok1")).await;

        let outcome = executor.execute(&ApiRequest::get("/me")).await;
        assert_eq!(
            outcome,
            ExecutionOutcome::Unauthorized(UnauthorizedSignal {
                presented: Some(AccessCredential::new("tok1")),
                message: "jwt expired".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_other_statuses_are_definitive_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forbidden"))
            .respond_with(ResponseTemplate::new(403).set_body_string("nope"))
            .mount(&server)
            .await;

        let (executor, _store) = executor_for(&server);
        let outcome = executor.execute(&ApiRequest::get("/forbidden")).await;

        assert_eq!(
            outcome,
            ExecutionOutcome::Failure(AuthError::Http { status: 403, message: "nope".to_string() })
        );
    }

    #[tokio::test]
    async fn test_explicit_credential_overrides_caller_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("Authorization", "Bearer tok2"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let (executor, _store) = executor_for(&server);
        let request = ApiRequest::get("/cart").with_header("authorization", "Bearer stale");

        let outcome =
            executor.execute_with(&request, Some(AccessCredential::new("tok2"))).await;
        assert!(matches!(outcome, ExecutionOutcome::Success(_)));
    }
}
