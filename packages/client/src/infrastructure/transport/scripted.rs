//! Channel-backed transport for deterministic connection tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::Transport;
use crate::infrastructure::error::TransportError;

/// Client side of a scripted socket.
pub struct ScriptedTransport {
    inbound: mpsc::UnboundedReceiver<String>,
    outbound: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
}

/// Test-controlled server side of a scripted socket.
pub struct ScriptedPeer {
    to_client: Option<mpsc::UnboundedSender<String>>,
    from_client: mpsc::UnboundedReceiver<String>,
    closed: Arc<AtomicBool>,
}

pub fn scripted_pair() -> (ScriptedTransport, ScriptedPeer) {
    let (to_client, inbound) = mpsc::unbounded_channel();
    let (outbound, from_client) = mpsc::unbounded_channel();
    let closed = Arc::new(AtomicBool::new(false));
    (
        ScriptedTransport {
            inbound,
            outbound,
            closed: closed.clone(),
        },
        ScriptedPeer {
            to_client: Some(to_client),
            from_client,
            closed,
        },
    )
}

impl ScriptedPeer {
    /// Deliver a frame to the client.
    pub fn send(&self, frame: &str) {
        if let Some(tx) = &self.to_client {
            let _ = tx.send(frame.to_string());
        }
    }

    /// Next frame written by the client; `None` once the client side is gone.
    pub async fn recv(&mut self) -> Option<String> {
        self.from_client.recv().await
    }

    /// Close the socket from the server side.
    pub fn hang_up(&mut self) {
        self.to_client = None;
    }

    /// Whether the client closed the socket.
    pub fn client_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.outbound
            .send(text)
            .map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        self.inbound.recv().await.map(Ok)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::SeqCst);
        self.inbound.close();
        Ok(())
    }
}
