//! Utility functions.
//!
//! Shared initialization helpers for hosts embedding the interceptor.

pub mod bootstrap;

pub use bootstrap::init_tracing;
