//! Exponential backoff with jitter for transient generation failures.

use std::time::Duration;

use rand::Rng;

/// Retry policy: `base * 2^n`, plus up to [`JITTER_FRACTION`] random jitter,
/// clamped to `max_delay`, for at most `max_retries` retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Retries after the first attempt. Zero disables retrying.
    pub max_retries: u32,
}

/// Upper bound of the random jitter, as a fraction of the computed delay.
pub const JITTER_FRACTION: f64 = 0.25;

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            max_retries: 3,
        }
    }
}

impl BackoffPolicy {
    /// Policy without any waiting; for tests and the placeholder backend.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            max_retries,
        }
    }

    /// Whether another retry is allowed after `retries_done` retries.
    pub fn should_retry(&self, retries_done: u32) -> bool {
        retries_done < self.max_retries
    }

    /// Deterministic delay before retry number `retry` (0-based), without
    /// jitter.
    pub fn base_delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Delay before retry number `retry` (0-based), jitter included.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let delay = self.base_delay_for(retry);
        let max_jitter_ms = (delay.as_millis() as f64 * JITTER_FRACTION) as u64;
        let jitter_ms = if max_jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=max_jitter_ms)
        };
        (delay + Duration::from_millis(jitter_ms)).min(self.max_delay)
    }
}
