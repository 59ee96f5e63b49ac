//! Infrastructure layer.
//!
//! Wire DTOs for the JSON envelope protocol and the transport seam the
//! connection manager drives (real WebSocket, offline responder).

pub mod dto;
pub mod error;
pub mod transport;

pub use error::{ProtocolError, TransportError};
