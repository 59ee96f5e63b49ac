//! Shared utilities for Chatlink.
//!
//! Logging setup and time helpers used by the client library, its binary
//! and the integration tests.

pub mod logger;
pub mod time;
