use std::time::Duration;

use crate::error::JiraApiError;

/// Bounded exponential backoff with jitter, applied uniformly to transient
/// transport failures (429 and 5xx) on every fetch path.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: Duration,
    pub max: Duration,
    pub jitter_frac: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base: Duration::from_millis(500),
            max: Duration::from_secs(10),
            jitter_frac: 0.2,
        }
    }
}

impl RetryPolicy {
    /// Delay before the given retry attempt (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let capped_attempt = attempt.min(8);
        let factor = 1u64.checked_shl(capped_attempt).unwrap_or(1 << 8);
        let raw = self.base.saturating_mul(factor as u32);
        let capped = if raw > self.max { self.max } else { raw };
        let nanos = capped.as_nanos() as i128;
        let jitter = ((nanos as f64) * (self.jitter_frac as f64)).round() as i128;
        let delta = if jitter == 0 {
            0
        } else {
            fastrand::i128(-jitter..=jitter)
        };
        let result = (nanos + delta).max(0) as u128;
        Duration::from_nanos(result as u64)
    }

    pub fn exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }

    /// The single retry decision: a transient failure with attempts remaining
    /// yields the wait before the next try, anything else ends the request.
    pub fn next_delay(&self, attempt: u32, error: &JiraApiError) -> Option<Duration> {
        if error.is_transient() && !self.exhausted(attempt) {
            Some(self.delay(attempt))
        } else {
            None
        }
    }
}
