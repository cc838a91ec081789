//! Testing utilities and helpers
//!
//! In-memory stand-ins for platform integrations so downstream crates can
//! test without touching the real keychain:
//! - **[`mocks`]**: `MockKeychainProvider` with switchable failure injection

pub mod mocks;

pub use mocks::MockKeychainProvider;
