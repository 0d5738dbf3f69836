//! Jittered exponential backoff between ISS retries.

use rand::Rng;
use std::time::Duration;

use crate::resilience::retries::RetryPolicy;

/// Delay before retry number `retry` (1-based) under `policy`.
///
/// Doubles from `iss.retry_base_delay_ms`, is capped at
/// `iss.retry_max_delay_ms`, then gets up to 10% jitter on top.
pub fn retry_delay(policy: &RetryPolicy, retry: u32) -> Duration {
    if retry == 0 {
        return Duration::ZERO;
    }

    let doubled = policy
        .base_delay_ms
        .saturating_mul(1u64 << (retry - 1).min(63));
    let capped = doubled.min(policy.max_delay_ms);

    let jitter = match capped / 10 {
        0 => 0,
        spread => rand::thread_rng().gen_range(0..=spread),
    };
    Duration::from_millis(capped.saturating_add(jitter))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(base_delay_ms: u64, max_delay_ms: u64) -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay_ms,
            max_delay_ms,
        }
    }

    #[test]
    fn test_delay_doubles_then_caps() {
        let policy = policy(200, 5_000);
        assert_eq!(retry_delay(&policy, 0), Duration::ZERO);

        let first = retry_delay(&policy, 1);
        assert!(first >= Duration::from_millis(200) && first <= Duration::from_millis(220));

        let third = retry_delay(&policy, 3);
        assert!(third >= Duration::from_millis(800) && third <= Duration::from_millis(880));

        let late = retry_delay(&policy, 200);
        assert!(late >= Duration::from_millis(5_000) && late <= Duration::from_millis(5_500));
    }

    #[test]
    fn test_small_delays_have_no_jitter() {
        assert_eq!(retry_delay(&policy(1, 5), 1), Duration::from_millis(1));
        assert_eq!(retry_delay(&policy(1, 5), 10), Duration::from_millis(5));
    }
}
