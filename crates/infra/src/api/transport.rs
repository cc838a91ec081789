//! Transport seam between the client and the network

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use storefront_domain::{ApiRequest, ApiResponse, HttpMethod};

use super::errors::AuthError;
use crate::http::HttpClient;

/// Performs one outbound call.
///
/// The request URL is absolute by the time it reaches the transport and any
/// `Authorization` header has already been attached. Non-success statuses
/// are returned as responses; only transport-level failures are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, AuthError>;
}

/// [`Transport`] over the shared reqwest [`HttpClient`]
#[derive(Clone)]
pub struct HttpTransport {
    client: HttpClient,
    timeout: Duration,
}

impl HttpTransport {
    /// Wrap `client`, bounding every call by `timeout`.
    pub fn new(client: HttpClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, AuthError> {
        let mut builder = self.client.request(to_reqwest_method(request.method()), request.url());

        for (name, value) in request.headers() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| AuthError::Config(format!("Invalid header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| AuthError::Config(format!("Invalid header value for {}: {}", name, e)))?;
            builder = builder.header(name, value);
        }

        if let Some(body) = request.body() {
            builder = builder.body(body.to_vec());
        }

        let response = match tokio::time::timeout(self.timeout, self.client.send(builder)).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return Err(err.into()),
            Err(_) => return Err(AuthError::Timeout(self.timeout)),
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::Network(format!("Failed to read response body: {}", e)))?;

        Ok(ApiResponse { status, headers, body: body.to_vec() })
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn transport() -> HttpTransport {
        HttpTransport::new(HttpClient::new().expect("http client"), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_forwards_method_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/cart/items/4"))
            .and(header("x-store", "eu"))
            .and(body_json(serde_json::json!({"qty": 2})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-request-id", "abc")
                    .set_body_string("updated"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let request = ApiRequest::put(format!("{}/cart/items/4", server.uri()))
            .with_header("X-Store", "eu")
            .with_json(&serde_json::json!({"qty": 2}))
            .unwrap();

        let response = transport().send(&request).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.text(), "updated");
        assert_eq!(response.header("X-Request-Id"), Some("abc"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_a_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let response = transport().send(&ApiRequest::get(server.uri())).await.unwrap();
        assert!(response.is_unauthorized());
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let transport =
            HttpTransport::new(HttpClient::new().expect("http client"), Duration::from_millis(50));
        let result = transport.send(&ApiRequest::get(server.uri())).await;

        assert_eq!(result, Err(AuthError::Timeout(Duration::from_millis(50))));
    }

    #[tokio::test]
    async fn test_invalid_header_is_config_error() {
        let request = ApiRequest::get("http://127.0.0.1:9/").with_header("bad header", "x");
        let result = transport().send(&request).await;
        assert!(matches!(result, Err(AuthError::Config(_))));
    }
}
