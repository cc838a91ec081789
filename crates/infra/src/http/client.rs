use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use storefront_domain::StorefrontError;
use tracing::debug;

/// HTTP client with a per-request timeout and a cookie jar.
///
/// Each call is attempted once. The cookie jar is what carries the
/// server-issued renewal ticket to the refresh endpoint, so one client
/// instance must be shared by ordinary calls and renewal calls.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, StorefrontError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder once.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, StorefrontError> {
        let request = builder.build().map_err(map_reqwest_error)?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status();
                debug!(%method, %url, %status, "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                Err(map_reqwest_error(err))
            }
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
    cookie_store: bool,
    proxy: Option<String>,
    system_proxy: bool,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: None,
            default_headers: None,
            cookie_store: true,
            proxy: None,
            system_proxy: true,
        }
    }
}

impl HttpClientBuilder {
    /// Overall timeout for each request (default 30s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `User-Agent` header sent with every request.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Headers sent with every request.
    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    /// Keep cookies set by the server and replay them on later calls.
    pub fn cookie_store(mut self, enabled: bool) -> Self {
        self.cookie_store = enabled;
        self
    }

    /// Route every request through `url`, ahead of any system proxy.
    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.proxy = Some(url.into());
        self
    }

    /// Honour proxy settings from the environment (default on).
    pub fn system_proxy(mut self, enabled: bool) -> Self {
        self.system_proxy = enabled;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    /// Returns `StorefrontError::Config` for an invalid proxy URL or when
    /// reqwest cannot build the client.
    pub fn build(self) -> Result<HttpClient, StorefrontError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).cookie_store(self.cookie_store);

        // no_proxy() also drops explicit proxies, so it must come first
        if !self.system_proxy {
            builder = builder.no_proxy();
        }

        if let Some(url) = self.proxy {
            let proxy = reqwest::Proxy::all(&url).map_err(|err| {
                StorefrontError::Config(format!("Invalid proxy URL {}: {}", url, err))
            })?;
            builder = builder.proxy(proxy);
        }

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| {
            StorefrontError::Config(format!("Failed to build HTTP client: {}", err))
        })?;

        Ok(HttpClient { client })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> StorefrontError {
    if err.is_timeout() {
        StorefrontError::Network(format!("HTTP request timed out: {}", err))
    } else if err.is_builder() {
        StorefrontError::InvalidInput(format!("Invalid HTTP request: {}", err))
    } else {
        StorefrontError::Network(format!("HTTP request failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::{Method, StatusCode};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn returns_successful_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new().expect("http client");
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn does_not_retry_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new().expect("http client");
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn replays_cookies_set_by_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "refreshToken=ticket-1; Path=/; HttpOnly"),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(header("cookie", "refreshToken=ticket-1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new().expect("http client");
        let login = format!("{}/auth/login", server.uri());
        let refresh = format!("{}/auth/refresh", server.uri());

        client.send(client.request(Method::POST, &login)).await.expect("login");
        let response = client.send(client.request(Method::POST, &refresh)).await.expect("refresh");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn maps_connection_failure_to_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so that requests fail with ECONNREFUSED
        let url = format!("http://{}", addr);

        let client = HttpClient::new().expect("http client");

        let result = client.send(client.request(Method::GET, &url)).await;
        match result {
            Err(StorefrontError::Network(msg)) => {
                assert!(msg.to_lowercase().contains("http"));
            }
            other => panic!("expected network error, got {:?}", other.map(|r| r.status())),
        }
    }

    #[tokio::test]
    async fn routes_requests_through_configured_proxy() {
        // a plain-HTTP proxy receives the absolute-form request
        let proxy = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_string("via proxy"))
            .expect(1)
            .mount(&proxy)
            .await;

        let client = HttpClient::builder().proxy(proxy.uri()).build().expect("http client");
        let response = client
            .send(client.request(Method::GET, "http://storefront.invalid/orders"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "via proxy");
    }

    #[test]
    fn rejects_invalid_proxy_url() {
        let result = HttpClient::builder().proxy("not a url").build();
        assert!(matches!(result, Err(StorefrontError::Config(_))));
    }
}
