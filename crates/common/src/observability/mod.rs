//! Observability primitives
//!
//! Structured logging setup shared by binaries and integration tests.
//! Library code only emits `tracing` events; installing a subscriber is the
//! embedding application's call.

pub mod logging;

pub use logging::{init_tracing, LogFormat};
