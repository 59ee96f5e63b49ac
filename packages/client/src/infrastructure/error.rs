//! Infrastructure layer error definitions.

use thiserror::Error;

use crate::domain::MsgType;

/// A frame could not be understood as an envelope.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The frame is not valid JSON
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// The frame is JSON but not an object
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// `msgtype` is absent or not an integer
    #[error("frame has no integer msgtype")]
    MissingMsgType,

    /// `msgtype` is an integer outside the known enumeration
    #[error("unknown msgtype: {0}")]
    UnknownMsgType(i64),

    /// The envelope does not have the shape its `msgtype` requires
    #[error("invalid {msg_type} payload: {reason}")]
    InvalidPayload { msg_type: MsgType, reason: String },
}

/// The socket failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The socket could not be opened
    #[error("failed to connect: {0}")]
    Connect(String),

    /// Writing a frame failed
    #[error("failed to send frame: {0}")]
    Send(String),

    /// Reading a frame failed
    #[error("failed to receive frame: {0}")]
    Receive(String),

    /// The socket is already closed
    #[error("socket closed")]
    Closed,
}
