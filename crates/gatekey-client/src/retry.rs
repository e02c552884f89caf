//! Exponential backoff policy for retried device API requests.

use gatekey_core::constants::{
    DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_RETRY_MAX_DELAY_MS, DEFAULT_RETRY_MULTIPLIER,
};
use std::time::Duration;

/// Backoff configuration for the retrying sender.
///
/// The delay for a given attempt is a pure function of the attempt index and
/// this policy; there is no mutable counter shared between attempts or
/// between concurrent requests.
///
/// # Example
///
/// ```
/// use gatekey_client::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.delay_for(0), Duration::from_millis(100));
/// assert_eq!(policy.delay_for(3), Duration::from_millis(800));
/// assert_eq!(policy.delay_for(10), Duration::from_millis(1000)); // capped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay inserted before the first retry.
    pub base_delay: Duration,

    /// Growth factor applied per failed attempt.
    pub multiplier: u32,

    /// Ceiling on the inter-retry delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
            multiplier: DEFAULT_RETRY_MULTIPLIER,
            max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with explicit values.
    #[must_use]
    pub fn new(base_delay: Duration, multiplier: u32, max_delay: Duration) -> Self {
        Self {
            base_delay,
            multiplier,
            max_delay,
        }
    }

    /// Delay inserted after failed attempt `attempt` (0-based).
    ///
    /// `base_delay * multiplier^attempt`, saturating, capped at `max_delay`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backoff_sequence() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = (0..6)
            .map(|attempt| policy.delay_for(attempt).as_millis() as u64)
            .collect();

        assert_eq!(delays, vec![100, 200, 400, 800, 1000, 1000]);
    }

    #[test]
    fn test_delays_are_non_decreasing_and_capped() {
        let policy = RetryPolicy::default();
        let mut previous = Duration::ZERO;

        for attempt in 0..64 {
            let delay = policy.delay_for(attempt);
            assert!(delay >= previous);
            assert!(delay <= policy.max_delay);
            previous = delay;
        }
    }

    #[test]
    fn test_custom_policy() {
        let policy = RetryPolicy::new(Duration::from_millis(50), 3, Duration::from_millis(400));

        assert_eq!(policy.delay_for(0), Duration::from_millis(50));
        assert_eq!(policy.delay_for(1), Duration::from_millis(150));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400)); // 450 capped
    }

    #[test]
    fn test_large_attempt_index_saturates() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(u32::MAX), policy.max_delay);
    }
}
