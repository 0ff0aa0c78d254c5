//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

/// Delay before attempt `attempt` (1-based): `base * 2^(attempt-1)` plus up
/// to 10% jitter, never more than `max`.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis((capped_delay + jitter).min(max_ms))
}

/// Delay schedule of the retry fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl BackoffPolicy {
    pub fn delay(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_delay_ms, self.max_delay_ms)
    }
}

impl From<&RetryConfig> for BackoffPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let b1 = calculate_backoff(1, 100, 2000);
        assert!(b1.as_millis() >= 100 && b1.as_millis() < 110);

        let b2 = calculate_backoff(2, 100, 2000);
        assert!(b2.as_millis() >= 200 && b2.as_millis() < 220);

        for _ in 0..200 {
            let max = calculate_backoff(10, 100, 1000);
            assert_eq!(max, Duration::from_millis(1000));
        }
    }

    #[test]
    fn test_default_policy_is_one_second_capped_at_ten() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert!(policy.delay(1) >= Duration::from_secs(1));
        assert!(policy.delay(1) < Duration::from_millis(1100));
        assert!(policy.delay(3) >= Duration::from_secs(4));
        for _ in 0..200 {
            assert!(policy.delay(8) <= Duration::from_secs(10));
        }
    }

    #[test]
    fn test_jitter_never_pushes_past_the_cap() {
        // 2^3 * 900 = 7200, so jitter of up to 720ms straddles the 7500 cap
        for _ in 0..200 {
            let delay = calculate_backoff(4, 900, 7500);
            assert!(delay >= Duration::from_millis(7200));
            assert!(delay <= Duration::from_millis(7500));
        }
    }

    #[test]
    fn test_zero_attempt_has_no_delay() {
        assert_eq!(calculate_backoff(0, 1000, 10_000), Duration::ZERO);
    }
}
