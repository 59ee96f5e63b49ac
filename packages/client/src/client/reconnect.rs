//! Fixed-delay, attempt-bounded reconnection policy.

use std::time::Duration;

use super::config::ClientConfig;

/// Decides whether and when to retry after an unexpected close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl ReconnectPolicy {
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.max_reconnect_attempts, config.reconnect_interval)
    }

    /// Delay before the next attempt, given the attempts made so far.
    ///
    /// The count is incremented before the check, so `None` is returned once
    /// the incremented count exceeds `max_attempts`. The delay does not grow.
    pub fn next_delay(&self, attempts_so_far: u32) -> Option<Duration> {
        let attempt = attempts_so_far.saturating_add(1);
        (attempt <= self.max_attempts).then_some(self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_delay_is_fixed_until_exhausted() {
        // テスト項目: 上限までは固定間隔を返し、上限を超えると None を返す
        // given (前提条件):
        let policy = ReconnectPolicy::new(3, Duration::from_millis(3000));

        // when (操作) / then (期待する結果):
        assert_eq!(policy.next_delay(0), Some(Duration::from_millis(3000)));
        assert_eq!(policy.next_delay(1), Some(Duration::from_millis(3000)));
        assert_eq!(policy.next_delay(2), Some(Duration::from_millis(3000)));
        assert_eq!(policy.next_delay(3), None);
        assert_eq!(policy.next_delay(u32::MAX), None);
    }

    #[test]
    fn test_zero_attempts_never_retries() {
        // テスト項目: 上限 0 の場合は一度も再接続しない
        let policy = ReconnectPolicy::new(0, Duration::from_millis(10));
        assert_eq!(policy.next_delay(0), None);
    }

    #[test]
    fn test_from_config() {
        // テスト項目: 設定値からポリシーが作られる
        let policy = ReconnectPolicy::from_config(&ClientConfig::default());
        assert_eq!(policy, ReconnectPolicy::new(5, Duration::from_millis(3000)));
    }
}
