use std::time::Duration;

use boardwright_core::backoff::BackoffPolicy;
use boardwright_core::build::BuildDefaults;

/// Tunables of the generation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Size of the process-wide worker pool.
    pub max_concurrent_generations: usize,
    /// Retry policy for transient generation failures.
    pub backoff: BackoffPolicy,
    /// Sampling interval of the poll progress stream.
    pub poll_interval: Duration,
    /// Style and aspect ratio used when a request leaves them out.
    pub defaults: BuildDefaults,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_generations: 8,
            backoff: BackoffPolicy::default(),
            poll_interval: Duration::from_millis(500),
            defaults: BuildDefaults::default(),
        }
    }
}
