//! Test fixtures for integration tests.
//!
//! [`TestServer`] is an in-process axum WebSocket chat server on an ephemeral
//! port. It records every frame the client writes, answers requests through a
//! scripted responder, and can push frames or drop connections on demand.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const FRAME_TIMEOUT: Duration = Duration::from_secs(10);

/// Computes the reply to an inbound frame, if any.
pub type Responder = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

enum Outbound {
    Text(String),
    Close,
}

#[derive(Clone)]
struct FixtureState {
    received: mpsc::UnboundedSender<String>,
    responder: Responder,
    sessions: Arc<Mutex<Vec<mpsc::UnboundedSender<Outbound>>>>,
    connections: Arc<AtomicUsize>,
}

/// Scripted chat server for integration tests.
pub struct TestServer {
    url: String,
    received: mpsc::UnboundedReceiver<String>,
    sessions: Arc<Mutex<Vec<mpsc::UnboundedSender<Outbound>>>>,
    connections: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server that never replies.
    pub async fn start() -> Self {
        Self::with_responder(|_| None).await
    }

    /// Start a server that answers each inbound frame with `responder`.
    pub async fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        let (received_tx, received) = mpsc::unbounded_channel();
        let sessions = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));
        let state = FixtureState {
            received: received_tx,
            responder: Arc::new(responder),
            sessions: sessions.clone(),
            connections: connections.clone(),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("Failed to read local address");
        let app = Router::new()
            .route("/ws", get(ws_handler))
            .with_state(state);
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });

        Self {
            url: format!("ws://{addr}/ws"),
            received,
            sessions,
            connections,
            handle,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Next frame written by any client.
    pub async fn next_frame(&mut self) -> String {
        tokio::time::timeout(FRAME_TIMEOUT, self.received.recv())
            .await
            .expect("Timed out waiting for a client frame")
            .expect("Test server stopped")
    }

    /// Next frame that is not a heartbeat.
    pub async fn next_message(&mut self) -> String {
        loop {
            let frame = self.next_frame().await;
            if frame != "ping" {
                return frame;
            }
        }
    }

    /// Send `frame` to every open connection.
    pub fn push(&self, frame: &str) {
        for session in self.sessions.lock().unwrap().iter() {
            let _ = session.send(Outbound::Text(frame.to_string()));
        }
    }

    /// Close every open connection from the server side.
    pub fn drop_connections(&self) {
        for session in self.sessions.lock().unwrap().drain(..) {
            let _ = session.send(Outbound::Close);
        }
    }

    /// Connections accepted so far.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` connections have been accepted.
    pub async fn wait_for_connections(&self, count: usize) {
        tokio::time::timeout(FRAME_TIMEOUT, async {
            while self.connection_count() < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("Timed out waiting for connections");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<FixtureState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: FixtureState) {
    let (outbound_tx, mut outbound) = mpsc::unbounded_channel();
    state.sessions.lock().unwrap().push(outbound_tx);
    state.connections.fetch_add(1, Ordering::SeqCst);
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            command = outbound.recv() => match command {
                Some(Outbound::Text(text)) => {
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    let text = text.as_str().to_owned();
                    let reply = (state.responder)(&text);
                    let _ = state.received.send(text);
                    if let Some(reply) = reply
                        && sink.send(Message::Text(reply.into())).await.is_err()
                    {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}
