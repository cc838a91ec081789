//! # Storefront Domain
//!
//! Domain types for the storefront API client.
//!
//! This crate contains:
//! - Credential, request and response value types
//! - Domain error types and Result definitions
//! - Client configuration structures
//! - Domain constants (excluded endpoints, storage keys)
//!
//! ## Architecture
//! - No dependencies on other storefront crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
