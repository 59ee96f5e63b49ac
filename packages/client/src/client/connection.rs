//! Connection Manager: owns the single socket to the chat server.
//!
//! Every state transition is serialized under one mutex. Socket I/O runs in a
//! per-session task that owns the [`Transport`] and multiplexes outbound
//! frames, heartbeat ticks and inbound frames. Open attempts and sessions
//! carry the generation they were started under; callbacks from a superseded
//! generation are ignored, so `disconnect()` racing an in-flight open never
//! resurrects the connection.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};

use super::config::ClientConfig;
use super::events::ConnectionEvent;
use super::heartbeat::Heartbeat;
use super::pending::PendingRequests;
use super::reconnect::ReconnectPolicy;
use super::router::{HandlerId, HandlerResult, MessageRouter};
use super::task::TaskGuard;
use crate::domain::{AtomicConnectionState, ConnectionState, MsgType};
use crate::error::{ConnectError, RequestError, SendError};
use crate::infrastructure::dto::{Envelope, HEARTBEAT_FRAME};
use crate::infrastructure::error::TransportError;
use crate::infrastructure::transport::{Connector, OfflineConnector, Transport, WsConnector};

/// Upper bound on the close handshake after `disconnect()`.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

const CLIENT_CLOSE_REASON: &str = "closed by client";

enum Command {
    Text(String),
    Close,
}

struct Session {
    commands: mpsc::UnboundedSender<Command>,
    task: TaskGuard,
}

struct Inner {
    state: ConnectionState,
    attempts: u32,
    generation: u64,
    waiters: Vec<oneshot::Sender<Result<(), ConnectError>>>,
    session: Option<Session>,
    /// In-flight open, or a reconnect waiting for its delay.
    attempt: Option<TaskGuard>,
}

struct Opened {
    transport: Box<dyn Transport>,
    offline: bool,
}

struct Shared {
    config: ClientConfig,
    policy: ReconnectPolicy,
    connector: Arc<dyn Connector>,
    state: AtomicConnectionState,
    router: MessageRouter,
    pending: PendingRequests,
    events: broadcast::Sender<ConnectionEvent>,
    inner: Mutex<Inner>,
}

/// Handle to the connection. Clones share the same connection.
#[derive(Clone)]
pub struct Connection {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("url", &self.shared.config.url)
            .field("state", &self.state())
            .finish()
    }
}

impl Connection {
    /// Create a disconnected WebSocket connection.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_connector(config, Arc::new(WsConnector))
    }

    /// Create a disconnected connection that opens sockets with `connector`.
    pub fn with_connector(config: ClientConfig, connector: Arc<dyn Connector>) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let shared = Shared {
            policy: ReconnectPolicy::from_config(&config),
            config,
            connector,
            state: AtomicConnectionState::default(),
            router: MessageRouter::new(),
            pending: PendingRequests::new(),
            events,
            inner: Mutex::new(Inner {
                state: ConnectionState::Disconnected,
                attempts: 0,
                generation: 0,
                waiters: Vec::new(),
                session: None,
                attempt: None,
            }),
        };
        Self {
            shared: Arc::new(shared),
        }
    }

    /// Open the connection.
    ///
    /// Resolves immediately when already connected. While an open is in
    /// flight the caller joins it instead of opening a second socket. From
    /// the disconnected state the reconnect budget is reset and a new open
    /// starts; failures go through the reconnect policy before this future
    /// resolves.
    ///
    /// # Errors
    ///
    /// - `ConnectError::Transport` when the open failed and no reconnects are allowed
    /// - `ConnectError::ReconnectExhausted` when every reconnect failed
    /// - `ConnectError::Disconnected` when `disconnect()` was called meanwhile
    pub async fn connect(&self) -> Result<(), ConnectError> {
        let rx = {
            let mut inner = self.shared.lock();
            match inner.state {
                ConnectionState::Connected => return Ok(()),
                ConnectionState::Connecting => {
                    tracing::debug!("joining in-flight connect");
                }
                ConnectionState::Disconnected => {
                    inner.attempts = 0;
                    self.shared.start_attempt(&mut inner, None);
                }
            }
            let (tx, rx) = oneshot::channel();
            inner.waiters.push(tx);
            rx
        };
        rx.await.unwrap_or(Err(ConnectError::Disconnected))
    }

    /// Queue an envelope for writing. Does not wait for any acknowledgement.
    ///
    /// # Errors
    ///
    /// `SendError::NotConnected` when the connection is not open; nothing is
    /// written and the state is unchanged.
    pub fn send(&self, envelope: &Envelope) -> Result<(), SendError> {
        let inner = self.shared.lock();
        if inner.state != ConnectionState::Connected {
            return Err(SendError::NotConnected { state: inner.state });
        }
        let session = inner.session.as_ref().ok_or(SendError::ChannelClosed)?;
        let frame = envelope
            .to_frame()
            .map_err(|e| SendError::Serialize(e.to_string()))?;
        session
            .commands
            .send(Command::Text(frame))
            .map_err(|_| SendError::ChannelClosed)?;
        tracing::debug!(msg_type = %envelope.msg_type, msg_id = ?envelope.msg_id, "frame queued");
        Ok(())
    }

    /// Send a request and wait for the server's acknowledgement.
    ///
    /// Acknowledgements carry no `msgid`, so they are matched to requests by
    /// type, oldest first. An acknowledgement that arrives after its request
    /// timed out resolves the next request of the same type. Dropping the
    /// returned future withdraws the request from the pending table.
    ///
    /// # Errors
    ///
    /// Send failures, `RequestError::Timeout` after the configured request
    /// timeout, or `RequestError::Disconnected` if the connection closes first.
    pub async fn request(&self, envelope: &Envelope) -> Result<Envelope, RequestError> {
        let response_type = envelope
            .msg_type
            .response_type()
            .ok_or(RequestError::NoAcknowledgement(envelope.msg_type))?;
        let ticket = self.shared.pending.register(response_type);
        if let Err(e) = self.send(envelope) {
            self.shared.pending.cancel(&ticket);
            return Err(e.into());
        }
        self.shared
            .pending
            .wait(ticket, self.shared.config.request_timeout)
            .await
    }

    /// Close the connection.
    ///
    /// Stops the heartbeat and any scheduled reconnect, resets the attempt
    /// counter, clears every handler and fails pending requests and connects.
    /// Idempotent.
    pub fn disconnect(&self) {
        let shared = &self.shared;
        let mut inner = shared.lock();
        let previous = inner.state;

        inner.generation += 1;
        inner.attempt = None;
        if let Some(Session { commands, task }) = inner.session.take() {
            let _ = commands.send(Command::Close);
            task.detach();
        }
        inner.attempts = 0;
        shared.set_state(&mut inner, ConnectionState::Disconnected);
        for waiter in inner.waiters.drain(..) {
            let _ = waiter.send(Err(ConnectError::Disconnected));
        }
        shared.router.clear();
        shared.pending.fail_all();

        if previous != ConnectionState::Disconnected {
            shared.emit(ConnectionEvent::Disconnected {
                reason: CLIENT_CLOSE_REASON.to_string(),
            });
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state.load()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Consecutive automatic reconnects since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.lock().attempts
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    pub fn router(&self) -> &MessageRouter {
        &self.shared.router
    }

    /// Number of requests waiting for an acknowledgement.
    pub fn pending_requests(&self) -> usize {
        self.shared.pending.len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.shared.events.subscribe()
    }

    pub fn register_handler<F>(&self, msg_type: MsgType, handler: F)
    where
        F: Fn(&Envelope) -> HandlerResult + Send + Sync + 'static,
    {
        self.shared.router.register_handler(msg_type, handler);
    }

    pub fn unregister_handler(&self, msg_type: MsgType) {
        self.shared.router.unregister_handler(msg_type);
    }

    pub fn register_global_handler<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&Envelope) -> HandlerResult + Send + Sync + 'static,
    {
        self.shared.router.register_global_handler(handler)
    }

    pub fn unregister_global_handler(&self, id: HandlerId) -> bool {
        self.shared.router.unregister_global_handler(id)
    }

    pub fn unregister_all_global_handlers(&self) {
        self.shared.router.unregister_all_global_handlers();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: ConnectionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn set_state(&self, inner: &mut Inner, state: ConnectionState) {
        if inner.state != state {
            tracing::info!(from = %inner.state, to = %state, "connection state changed");
        }
        inner.state = state;
        self.state.store(state);
    }

    /// Start a new generation with one open attempt, after `delay` if given.
    fn start_attempt(self: &Arc<Self>, inner: &mut Inner, delay: Option<Duration>) {
        inner.generation += 1;
        let generation = inner.generation;
        if delay.is_none() {
            self.set_state(inner, ConnectionState::Connecting);
            self.emit(ConnectionEvent::Connecting);
        }

        let weak = Arc::downgrade(self);
        let connector = self.connector.clone();
        let url = self.config.url.clone();
        let offline_fallback = self.config.offline_fallback;
        inner.attempt = Some(TaskGuard::spawn(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
                match weak.upgrade() {
                    Some(shared) if shared.begin_attempt(generation) => {}
                    _ => return,
                }
            }
            let result = open(connector.as_ref(), &url, offline_fallback).await;
            if let Some(shared) = weak.upgrade() {
                shared.on_open_result(generation, result);
            }
        }));
    }

    /// A delayed reconnect is due. Returns false when it was superseded.
    fn begin_attempt(&self, generation: u64) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        self.set_state(&mut inner, ConnectionState::Connecting);
        self.emit(ConnectionEvent::Connecting);
        true
    }

    fn on_open_result(self: &Arc<Self>, generation: u64, result: Result<Opened, TransportError>) {
        let mut inner = self.lock();
        if inner.generation != generation {
            if let Ok(mut opened) = result {
                tracing::debug!("closing socket of a superseded connect");
                tokio::spawn(async move {
                    let _ = opened.transport.close().await;
                });
            }
            return;
        }

        match result {
            Ok(Opened { transport, offline }) => {
                inner.attempts = 0;
                inner.attempt = None;
                let (commands, rx) = mpsc::unbounded_channel();
                let task = TaskGuard::spawn(run_session(
                    Arc::downgrade(self),
                    generation,
                    transport,
                    rx,
                    self.config.heartbeat_interval,
                ));
                inner.session = Some(Session { commands, task });
                self.set_state(&mut inner, ConnectionState::Connected);
                if offline {
                    self.emit(ConnectionEvent::OfflineMode);
                }
                self.emit(ConnectionEvent::Connected);
                for waiter in inner.waiters.drain(..) {
                    let _ = waiter.send(Ok(()));
                }
            }
            Err(e) => {
                tracing::warn!(url = %self.config.url, error = %e, "failed to open connection");
                self.set_state(&mut inner, ConnectionState::Disconnected);
                self.schedule_reconnect(&mut inner, e.to_string());
            }
        }
    }

    fn schedule_reconnect(self: &Arc<Self>, inner: &mut Inner, reason: String) {
        match self.policy.next_delay(inner.attempts) {
            Some(delay) => {
                inner.attempts += 1;
                let attempt = inner.attempts;
                tracing::info!(
                    attempt,
                    max_attempts = self.policy.max_attempts,
                    ?delay,
                    "scheduling reconnect"
                );
                self.emit(ConnectionEvent::Reconnecting { attempt, delay });
                self.start_attempt(inner, Some(delay));
            }
            None => {
                let attempts = inner.attempts;
                tracing::error!(attempts, %reason, "reconnect attempts exhausted");
                inner.attempt = None;
                self.emit(ConnectionEvent::ReconnectExhausted { attempts });
                let error = if attempts == 0 {
                    ConnectError::Transport(reason)
                } else {
                    ConnectError::ReconnectExhausted { attempts }
                };
                for waiter in inner.waiters.drain(..) {
                    let _ = waiter.send(Err(error.clone()));
                }
            }
        }
    }

    fn on_session_closed(self: &Arc<Self>, generation: u64, reason: String) {
        let mut inner = self.lock();
        if inner.generation != generation || inner.session.is_none() {
            return;
        }
        tracing::warn!(%reason, "connection lost");
        inner.session = None;
        self.set_state(&mut inner, ConnectionState::Disconnected);
        self.emit(ConnectionEvent::Disconnected {
            reason: reason.clone(),
        });
        self.pending.fail_all();
        self.schedule_reconnect(&mut inner, reason);
    }

    /// Route one inbound frame. Pending requests are completed before
    /// handlers run.
    fn handle_frame(&self, generation: u64, frame: &str) {
        if self.lock().generation != generation {
            return;
        }
        match Envelope::parse(frame) {
            Ok(envelope) => {
                tracing::debug!(msg_type = %envelope.msg_type, msg_id = ?envelope.msg_id, "frame received");
                self.pending.complete(&envelope);
                self.router.deliver(&envelope);
            }
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed frame");
                self.emit(ConnectionEvent::FrameDropped {
                    reason: e.to_string(),
                });
            }
        }
    }
}

async fn open(
    connector: &dyn Connector,
    url: &str,
    offline_fallback: bool,
) -> Result<Opened, TransportError> {
    match connector.connect(url).await {
        Ok(transport) => Ok(Opened {
            transport,
            offline: false,
        }),
        Err(e) if offline_fallback => {
            tracing::warn!(url, error = %e, "chat server unreachable, falling back to offline responder");
            let transport = OfflineConnector.connect(url).await?;
            Ok(Opened {
                transport,
                offline: true,
            })
        }
        Err(e) => Err(e),
    }
}

async fn run_session(
    shared: Weak<Shared>,
    generation: u64,
    mut transport: Box<dyn Transport>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    heartbeat_interval: Duration,
) {
    let mut heartbeat = Heartbeat::new(heartbeat_interval);
    tracing::debug!(generation, period = ?heartbeat.period(), "session started");

    let reason = loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Text(frame)) => {
                    if let Err(e) = transport.send_text(frame).await {
                        break e.to_string();
                    }
                }
                Some(Command::Close) => {
                    if tokio::time::timeout(CLOSE_TIMEOUT, transport.close()).await.is_err() {
                        tracing::debug!("close handshake timed out");
                    }
                    return;
                }
                None => return,
            },
            _ = heartbeat.tick() => {
                tracing::debug!("sending heartbeat");
                if let Err(e) = transport.send_text(HEARTBEAT_FRAME.to_string()).await {
                    break format!("heartbeat failed: {e}");
                }
            }
            frame = transport.recv() => match frame {
                Some(Ok(text)) => {
                    let Some(owner) = shared.upgrade() else {
                        return;
                    };
                    owner.handle_frame(generation, &text);
                }
                Some(Err(e)) => break e.to_string(),
                None => break "closed by server".to_string(),
            },
        }
    };

    if let Some(owner) = shared.upgrade() {
        owner.on_session_closed(generation, reason);
    }
}
