use std::time::Duration;

use crate::types::FetchAttemptResult;

/// What the attempt loop does after classifying an attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Got a 200; stop and return.
    Succeeded,
    /// Sleep for the backoff, then try again without re-queueing on the rate limiter.
    Retry { after: Duration },
    /// Attempts exhausted; surface the last attempt.
    GiveUp,
}

/// Fixed exponential backoff: the failure of attempt `n` waits `2^(n-1)` units.
///
/// ```
/// use fetchline_http::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(4, Duration::from_secs(1));
/// assert_eq!(policy.backoff(1), Duration::from_secs(1));
/// assert_eq!(policy.backoff(2), Duration::from_secs(2));
/// assert_eq!(policy.backoff(3), Duration::from_secs(4));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_unit: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            max_attempts,
            backoff_unit,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after the failure of `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.backoff_unit.saturating_mul(factor)
    }

    pub fn decide(&self, attempt: &FetchAttemptResult) -> RetryDecision {
        if attempt.is_success() {
            RetryDecision::Succeeded
        } else if attempt.attempt_number < self.max_attempts {
            RetryDecision::Retry {
                after: self.backoff(attempt.attempt_number),
            }
        } else {
            RetryDecision::GiveUp
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::types::TransportResponse;

    fn http(status: u16, attempt: u32) -> FetchAttemptResult {
        FetchAttemptResult::from_response(
            TransportResponse {
                status,
                ..Default::default()
            },
            attempt,
        )
    }

    #[test]
    fn backoff_doubles_from_one_unit() {
        let policy = RetryPolicy::new(10, Duration::from_millis(100));
        let delays: Vec<_> = (1..=4).map(|n| policy.backoff(n)).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(800),
            ]
        );
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        let policy = RetryPolicy::new(100, Duration::from_secs(1));
        assert!(policy.backoff(64) >= policy.backoff(32));
    }

    #[test]
    fn success_stops_even_on_last_attempt() {
        let policy = RetryPolicy::new(2, Duration::from_secs(1));
        assert_eq!(policy.decide(&http(200, 2)), RetryDecision::Succeeded);
    }

    #[test]
    fn failures_retry_until_last_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        assert_eq!(
            policy.decide(&http(500, 1)),
            RetryDecision::Retry {
                after: Duration::from_secs(1)
            }
        );
        assert_eq!(
            policy.decide(&http(404, 2)),
            RetryDecision::Retry {
                after: Duration::from_secs(2)
            }
        );
        assert_eq!(policy.decide(&http(500, 3)), RetryDecision::GiveUp);
    }

    #[test]
    fn transport_failures_follow_the_same_schedule() {
        let policy = RetryPolicy::new(2, Duration::from_secs(1));
        let timeout = TransportError::Timeout("deadline".into());
        assert_eq!(
            policy.decide(&FetchAttemptResult::from_transport_error(&timeout, 1)),
            RetryDecision::Retry {
                after: Duration::from_secs(1)
            }
        );
        assert_eq!(
            policy.decide(&FetchAttemptResult::from_transport_error(&timeout, 2)),
            RetryDecision::GiveUp
        );
    }

    #[test]
    fn single_attempt_policy_never_retries() {
        let policy = RetryPolicy::new(1, Duration::from_secs(1));
        assert_eq!(policy.decide(&http(500, 1)), RetryDecision::GiveUp);
    }
}
