//! Domain layer for the chat client.
//!
//! This module contains the protocol vocabulary (message types and the
//! identifiers carried in envelopes) and the connection lifecycle states,
//! independent of the wire format and the transport.

pub mod connection_state;
pub mod error;
pub mod message_type;
pub mod value_object;

pub use connection_state::{AtomicConnectionState, ConnectionState};
pub use error::ValueObjectError;
pub use message_type::MsgType;
pub use value_object::{GroupId, MsgId, MsgIdGenerator, UserId};
