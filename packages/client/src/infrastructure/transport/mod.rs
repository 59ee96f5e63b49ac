//! Transport seam between the connection manager and the network.
//!
//! The connection manager only ever talks to a [`Connector`] (to open a
//! socket) and the [`Transport`] it returns (to move text frames). The real
//! implementation is [`WsConnector`]; [`OfflineConnector`] stands in when the
//! server is unreachable and offline fallback is enabled.

mod offline;
#[cfg(test)]
pub(crate) mod scripted;
mod websocket;

use async_trait::async_trait;

use super::error::TransportError;

pub use offline::{OFFLINE_REPLY_DELAY, OfflineConnector, OfflineTransport};
pub use websocket::{WsConnector, WsTransport};

/// Opens sockets to a URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a socket. This is the only suspension point of a connect attempt.
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, TransportError>;
}

/// An open, text-framed socket.
///
/// `recv` must be cancellation-safe: the session loop drops a pending `recv`
/// whenever an outbound frame or heartbeat is due.
#[async_trait]
pub trait Transport: Send {
    /// Write one text frame.
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Read the next text frame. `None` means the peer closed the socket.
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;

    /// Close the socket.
    async fn close(&mut self) -> Result<(), TransportError>;
}
