//! Domain types and models
//!
//! Value types shared between the credential store, the request executor
//! and the public client facade.

pub mod credential;
pub mod request;

pub use credential::AccessCredential;
pub use request::{ApiRequest, ApiResponse, HttpMethod, RetryMarker, TrackedRequest};
