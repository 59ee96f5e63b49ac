//! Keepalive timer for an open connection.

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Periodic `"ping"` schedule of one session.
///
/// The first tick fires one full period after creation, not immediately.
#[derive(Debug)]
pub struct Heartbeat {
    interval: Interval,
}

impl Heartbeat {
    pub fn new(period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }

    /// Wait for the next probe to be due. Cancellation-safe.
    pub async fn tick(&mut self) -> Instant {
        self.interval.tick().await
    }
}
