//! Errors surfaced to callers of the connection and the use cases.

use std::time::Duration;

use thiserror::Error;

use crate::domain::{ConnectionState, MsgType};
use crate::infrastructure::ProtocolError;

/// Failure of a caller-issued [`connect`](crate::Connection::connect).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// The open attempt failed and no reconnect budget was configured
    #[error("failed to open connection: {0}")]
    Transport(String),

    /// Every automatic reconnect failed
    #[error("gave up after {attempts} reconnect attempts")]
    ReconnectExhausted { attempts: u32 },

    /// `disconnect()` was called while the connect was pending
    #[error("connection was closed before it opened")]
    Disconnected,
}

/// Failure of [`send`](crate::Connection::send). Connection state is unaffected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("cannot send while {state}")]
    NotConnected { state: ConnectionState },

    #[error("failed to serialize envelope: {0}")]
    Serialize(String),

    /// The session ended between the state check and the write
    #[error("connection session has ended")]
    ChannelClosed,
}

/// Failure of a request awaiting its acknowledgement.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error(transparent)]
    Send(#[from] SendError),

    #[error("no {msg_type} received within {after:?}")]
    Timeout { msg_type: MsgType, after: Duration },

    /// The connection closed while the request was pending
    #[error("connection closed while awaiting acknowledgement")]
    Disconnected,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The message type has no acknowledgement to wait for
    #[error("{0} is not answered by the server")]
    NoAcknowledgement(MsgType),
}
