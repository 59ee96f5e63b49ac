//! Connection lifecycle events.

use std::time::Duration;

/// Events broadcast by a [`Connection`](super::Connection).
///
/// Subscribers that fall behind lose the oldest events; the connection never
/// waits for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A socket open is starting.
    Connecting,
    /// The socket is open and the heartbeat is running.
    Connected,
    /// The connection was lost or closed.
    Disconnected { reason: String },
    /// An automatic reconnect is scheduled.
    Reconnecting { attempt: u32, delay: Duration },
    /// The reconnect budget is spent; no further automatic attempts.
    ReconnectExhausted { attempts: u32 },
    /// An inbound frame could not be parsed and was dropped.
    FrameDropped { reason: String },
    /// The server was unreachable and the offline responder took its place.
    OfflineMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_variants_carry_details() {
        // テスト項目: イベントが詳細情報を保持する
        let event = ConnectionEvent::Reconnecting {
            attempt: 2,
            delay: Duration::from_millis(3000),
        };
        let ConnectionEvent::Reconnecting { attempt, delay } = event.clone() else {
            panic!("expected Reconnecting");
        };
        assert_eq!(attempt, 2);
        assert_eq!(delay, Duration::from_millis(3000));
        assert_eq!(
            event,
            ConnectionEvent::Reconnecting {
                attempt: 2,
                delay: Duration::from_millis(3000)
            }
        );
    }
}
