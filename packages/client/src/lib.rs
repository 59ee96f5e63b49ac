//! Client-side communication layer for a WebSocket chat server.
//!
//! The library owns one persistent socket to the chat server
//! ([`Connection`]), keeps it alive with a heartbeat, reconnects after
//! unexpected closes, and routes inbound typed envelopes to registered
//! handlers ([`MessageRouter`]). The [`usecase`] module builds the
//! request/response flows of the chat protocol on top of it.

pub mod client;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod usecase;

// Re-export entry points
pub use client::{ClientConfig, Connection, ConnectionEvent, MessageRouter};
pub use domain::{ConnectionState, GroupId, MsgId, MsgIdGenerator, MsgType, UserId};
pub use error::{ConnectError, RequestError, SendError};
pub use infrastructure::dto::Envelope;
