//! Connection configuration supplied by the embedding application.

use std::time::Duration;

/// Default chat server endpoint.
pub const DEFAULT_URL: &str = "ws://localhost:6000";
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(3000);
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(30000);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(10000);
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Settings of a [`Connection`](super::Connection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket endpoint of the chat server.
    pub url: String,
    /// Consecutive automatic reconnects before giving up.
    pub max_reconnect_attempts: u32,
    /// Fixed delay before each automatic reconnect.
    pub reconnect_interval: Duration,
    /// Period of the `"ping"` keepalive while connected.
    pub heartbeat_interval: Duration,
    /// How long [`Connection::request`](super::Connection::request) waits for an acknowledgement.
    pub request_timeout: Duration,
    /// Substitute the offline responder when the server cannot be reached.
    pub offline_fallback: bool,
    /// Buffer size of the connection event channel.
    pub event_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            offline_fallback: false,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// A zero period is bumped to one millisecond since `tokio` intervals
    /// reject it.
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_offline_fallback(mut self, enabled: bool) -> Self {
        self.offline_fallback = enabled;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}
