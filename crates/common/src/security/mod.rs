//! Durable secret storage
//!
//! This module provides the storage seam used to persist the access
//! credential across restarts, and its platform keychain implementation.

pub mod keychain;
pub mod traits;

pub use keychain::{KeychainError, KeychainProvider};
pub use traits::SecretStore;
