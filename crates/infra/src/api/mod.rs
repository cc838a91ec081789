//! Authenticated storefront API client
//!
//! Attaches the current access credential to every outbound call and, when
//! the server rejects it, renews it once and replays the call.
//!
//! # Architecture
//!
//! - [`CredentialStore`]: memory cache mirrored to the OS keychain
//! - [`RequestExecutor`]: one call, classified as success, unauthorized or
//!   failure
//! - [`RefreshCoordinator`]: single-flight renewal with a waiter queue
//! - [`AuthenticatedClient`]: public facade; the only type most callers need
//!
//! Renewal is purely reactive: there is no timer-based refresh.

pub mod client;
pub mod credential_store;
pub mod errors;
pub mod executor;
pub mod refresh;
pub mod renewal;
pub mod session;
pub mod transport;

pub use client::{AuthenticatedClient, AuthenticatedClientBuilder};
pub use credential_store::CredentialStore;
pub use errors::{AuthError, AuthErrorCategory};
pub use executor::{ExecutionOutcome, RequestExecutor, UnauthorizedSignal};
pub use refresh::RefreshCoordinator;
pub use renewal::{CredentialRenewer, HttpRenewer};
pub use session::{SessionEvent, SessionEvents};
pub use transport::{HttpTransport, Transport};
