//! Request and response values exchanged with the transport

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// HTTP method of an outbound call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Method name as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of one outbound call.
///
/// `url` may be a path relative to the configured base URL or an absolute
/// URL. Header names are matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    method: HttpMethod,
    url: String,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl ApiRequest {
    /// Request with no headers and no body.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), headers: Vec::new(), body: None }
    }

    /// `GET url`
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// `POST url`
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    /// `PUT url`
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, url)
    }

    /// `PATCH url`
    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, url)
    }

    /// `DELETE url`
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    /// Set a header, replacing any existing header with the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Set the raw body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set `Content-Type`.
    ///
    /// # Errors
    /// Returns the serializer error if `value` cannot be encoded.
    pub fn with_json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        Ok(self.with_header("Content-Type", "application/json").with_body(body))
    }

    /// Copy of this request pointed at another URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Absolute URL, or a path relative to the base URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Headers in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Raw body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

/// Response returned by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers in wire order
    pub headers: Vec<(String, String)>,
    /// Raw body
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Response with no headers.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, headers: Vec::new(), body: body.into() }
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Status is 401.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Body decoded as UTF-8, lossy.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    ///
    /// 204/205 responses and empty bodies decode from `null`.
    ///
    /// # Errors
    /// Returns the deserializer error if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        if self.status == 204 || self.status == 205 || self.body.is_empty() {
            serde_json::from_value(serde_json::Value::Null)
        } else {
            serde_json::from_slice(&self.body)
        }
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
}

/// Whether a logical request has already been replayed after a renewal.
///
/// Kept beside the request rather than inside it so the request value stays
/// immutable across the replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryMarker {
    replayed: bool,
}

impl RetryMarker {
    /// Marker for a request not yet replayed.
    #[must_use]
    pub const fn fresh() -> Self {
        Self { replayed: false }
    }

    /// Whether the replay has been spent.
    #[must_use]
    pub const fn is_replayed(self) -> bool {
        self.replayed
    }

    /// Marker after the single replay.
    #[must_use]
    pub const fn replayed(self) -> Self {
        Self { replayed: true }
    }
}

/// A request paired with its retry marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedRequest {
    request: ApiRequest,
    marker: RetryMarker,
}

impl TrackedRequest {
    /// Track a fresh request.
    #[must_use]
    pub const fn new(request: ApiRequest) -> Self {
        Self { request, marker: RetryMarker::fresh() }
    }

    /// The request to send.
    #[must_use]
    pub const fn request(&self) -> &ApiRequest {
        &self.request
    }

    /// Current retry marker.
    #[must_use]
    pub const fn marker(&self) -> RetryMarker {
        self.marker
    }

    /// The same request, marked as replayed.
    #[must_use]
    pub fn into_replay(self) -> Self {
        Self { request: self.request, marker: self.marker.replayed() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_header_replaces_case_insensitively() {
        let request = ApiRequest::get("/cart")
            .with_header("authorization", "Bearer old")
            .with_header("Authorization", "Bearer new");

        assert_eq!(request.headers().len(), 1);
        assert_eq!(request.header("AUTHORIZATION"), Some("Bearer new"));
    }

    #[test]
    fn test_with_json_sets_content_type() {
        let request = ApiRequest::post("/orders").with_json(&serde_json::json!({"sku": 7})).unwrap();

        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.body(), Some(br#"{"sku":7}"#.as_slice()));
    }

    #[test]
    fn test_response_json_no_content() {
        let response = ApiResponse::new(204, Vec::new());
        let decoded: Option<serde_json::Value> = response.json().unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn test_replay_keeps_request_and_sets_marker() {
        let request = ApiRequest::delete("/cart/items/3");
        let tracked = TrackedRequest::new(request.clone());
        assert!(!tracked.marker().is_replayed());

        let replay = tracked.into_replay();
        assert!(replay.marker().is_replayed());
        assert_eq!(replay.request(), &request);
    }

    #[test]
    fn test_status_classification() {
        assert!(ApiResponse::new(200, "ok").is_success());
        assert!(ApiResponse::new(401, "").is_unauthorized());
        assert!(!ApiResponse::new(403, "").is_unauthorized());
        assert!(!ApiResponse::new(500, "").is_success());
    }
}
