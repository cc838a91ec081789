//! # Storefront Infrastructure
//!
//! Impure side of the storefront API client.
//!
//! This crate contains:
//! - The reqwest-backed HTTP transport (cookie store carries the renewal
//!   ticket)
//! - The authenticated API client and its single-flight credential renewal
//! - Configuration loading from environment variables and files
//!
//! ## Architecture
//! - Depends on `storefront-domain` for value types and `storefront-common`
//!   for durable storage
//! - External collaborators only use [`api::AuthenticatedClient`]

pub mod api;
pub mod config;
pub mod http;

// Re-export commonly used items
pub use api::{AuthError, AuthErrorCategory, AuthenticatedClient, SessionEvent};
pub use http::HttpClient;
