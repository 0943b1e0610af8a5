use std::time::Duration;

use tracing::warn;

/// Attempts made per gateway call, including the first.
pub const MAX_ATTEMPTS: u32 = 3;
/// Cooldown after a rate-limit error when the provider gives no hint.
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_secs(60);
/// Provider hints are capped at this multiple of `rate_limit_delay`.
pub const COOLDOWN_HINT_CAP_FACTOR: u32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub rate_limit_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            rate_limit_delay: DEFAULT_RATE_LIMIT_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn with_rate_limit_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = delay;
        self
    }

    /// Delay before attempt index `attempt` (0-based): `2^attempt` seconds plus
    /// `jitter`, which is clamped into `[0, 1)`. Attempt 0 never waits.
    pub fn backoff_delay(&self, attempt: u32, jitter: f64) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let jitter = if jitter.is_finite() {
            jitter.clamp(0.0, 0.999)
        } else {
            0.0
        };
        let base = 2_f64.powi(attempt.min(16) as i32);
        Duration::from_secs_f64(base + jitter)
    }

    /// Longest cooldown a provider hint can impose.
    pub fn max_cooldown(&self) -> Duration {
        self.rate_limit_delay * COOLDOWN_HINT_CAP_FACTOR
    }

    /// Cooldown before retrying after a rate-limit error: the provider's hint
    /// up to `max_cooldown`, else `rate_limit_delay`.
    pub fn rate_limit_cooldown(&self, hint: Option<Duration>) -> Duration {
        let cap = self.max_cooldown();
        match hint {
            Some(hint) if hint > cap => {
                warn!(
                    "Provider asked for a {}s cooldown, capping at {}s",
                    hint.as_secs(),
                    cap.as_secs()
                );
                cap
            }
            Some(hint) => hint,
            None => self.rate_limit_delay,
        }
    }

    /// Longest time one call can spend sleeping: every retry preceded by the
    /// larger of the backoff and the capped cooldown.
    pub fn worst_case_wait(&self) -> Duration {
        (1..self.max_attempts)
            .map(|attempt| self.backoff_delay(attempt, 0.999).max(self.max_cooldown()))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_attempt_has_no_delay() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(0, 0.7), Duration::ZERO);
    }

    #[test]
    fn test_backoff_lies_in_half_open_interval() {
        let policy = RetryPolicy::default();
        for attempt in 1..policy.max_attempts {
            let low = Duration::from_secs(1 << attempt);
            let high = Duration::from_secs((1 << attempt) + 1);
            for jitter in [0.0, 0.25, 0.5, 0.999_999, 1.0, 7.0, -3.0] {
                let delay = policy.backoff_delay(attempt, jitter);
                assert!(
                    delay >= low && delay < high,
                    "attempt {attempt}, jitter {jitter}: {delay:?}"
                );
            }
        }
    }

    #[test]
    fn test_nan_jitter_is_ignored() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(1, f64::NAN), Duration::from_secs(2));
    }

    #[test]
    fn test_rate_limit_cooldown_uses_hint_then_default() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.rate_limit_cooldown(Some(Duration::from_secs(5))),
            Duration::from_secs(5)
        );
        assert_eq!(policy.rate_limit_cooldown(None), DEFAULT_RATE_LIMIT_DELAY);
    }

    #[test]
    fn test_long_hint_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.rate_limit_cooldown(Some(Duration::from_secs(86_400))),
            Duration::from_secs(120)
        );
        assert_eq!(
            policy.rate_limit_cooldown(Some(Duration::from_secs(120))),
            Duration::from_secs(120)
        );

        let quick = RetryPolicy::default().with_rate_limit_delay(Duration::from_secs(5));
        assert_eq!(
            quick.rate_limit_cooldown(Some(Duration::from_secs(30))),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_worst_case_wait_is_bounded() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.worst_case_wait(), Duration::from_secs(240));

        let quick = RetryPolicy::default().with_rate_limit_delay(Duration::from_secs(1));
        let wait = quick.worst_case_wait();
        assert!(wait > Duration::from_secs(6) && wait < Duration::from_secs(8));
    }
}
