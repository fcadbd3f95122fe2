use std::time::Duration;

use boardwright_core::backoff::BackoffPolicy;
use boardwright_core::build::{self, BuildDefaults};
use boardwright_pipeline::PipelineConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// Timeout for non-streaming responses, in seconds.
    pub request_timeout_secs: u64,
    /// Interval of SSE keep-alive comments, in seconds.
    pub stream_keepalive_secs: u64,
    /// Age after which finished storyboards are evicted, in seconds.
    pub storyboard_ttl_secs: u64,
    /// Remote image service; `None` selects the placeholder generator.
    pub image_generator_url: Option<String>,
    pub image_generator_timeout_secs: u64,
    /// Remote scene metadata extractor; `None` leaves parsed scenes as-is.
    pub scene_enricher_url: Option<String>,
    /// Emit JSON log lines instead of human-readable ones.
    pub log_json: bool,
    pub pipeline: PipelineConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                 |
    /// |--------------------------------|-------------------------|
    /// | `HOST`                         | `0.0.0.0`               |
    /// | `PORT`                         | `3000`                  |
    /// | `CORS_ORIGINS`                 | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`         | `30`                    |
    /// | `STREAM_KEEPALIVE_SECS`        | `15`                    |
    /// | `STORYBOARD_TTL_SECS`          | `3600`                  |
    /// | `IMAGE_GENERATOR_URL`          | unset                   |
    /// | `IMAGE_GENERATOR_TIMEOUT_SECS` | `60`                    |
    /// | `SCENE_ENRICHER_URL`           | unset                   |
    /// | `LOG_FORMAT`                   | `text` (`json`)         |
    /// | `MAX_CONCURRENT_GENERATIONS`   | `8`                     |
    /// | `GENERATION_MAX_RETRIES`       | `3`                     |
    /// | `GENERATION_BASE_DELAY_MS`     | `500`                   |
    /// | `GENERATION_MAX_DELAY_MS`      | `8000`                  |
    /// | `LEGACY_POLL_INTERVAL_MS`      | `500`                   |
    /// | `DEFAULT_STYLE`                | `Photorealistic`        |
    /// | `DEFAULT_ASPECT_RATIO`         | `16:9`                  |
    ///
    /// Panics on unparsable values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = env_or("PORT", "3000")
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", "30")
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let stream_keepalive_secs: u64 = env_or("STREAM_KEEPALIVE_SECS", "15")
            .parse()
            .expect("STREAM_KEEPALIVE_SECS must be a valid u64");

        let storyboard_ttl_secs: u64 = env_or("STORYBOARD_TTL_SECS", "3600")
            .parse()
            .expect("STORYBOARD_TTL_SECS must be a valid u64");

        let image_generator_url = env_opt("IMAGE_GENERATOR_URL");
        let scene_enricher_url = env_opt("SCENE_ENRICHER_URL");

        let image_generator_timeout_secs: u64 = env_or("IMAGE_GENERATOR_TIMEOUT_SECS", "60")
            .parse()
            .expect("IMAGE_GENERATOR_TIMEOUT_SECS must be a valid u64");

        let log_json = env_or("LOG_FORMAT", "text").eq_ignore_ascii_case("json");

        let max_concurrent_generations: usize = env_or("MAX_CONCURRENT_GENERATIONS", "8")
            .parse()
            .expect("MAX_CONCURRENT_GENERATIONS must be a valid usize");

        let max_retries: u32 = env_or("GENERATION_MAX_RETRIES", "3")
            .parse()
            .expect("GENERATION_MAX_RETRIES must be a valid u32");

        let base_delay_ms: u64 = env_or("GENERATION_BASE_DELAY_MS", "500")
            .parse()
            .expect("GENERATION_BASE_DELAY_MS must be a valid u64");

        let max_delay_ms: u64 = env_or("GENERATION_MAX_DELAY_MS", "8000")
            .parse()
            .expect("GENERATION_MAX_DELAY_MS must be a valid u64");

        let poll_interval_ms: u64 = env_or("LEGACY_POLL_INTERVAL_MS", "500")
            .parse()
            .expect("LEGACY_POLL_INTERVAL_MS must be a valid u64");

        let default_aspect_ratio = env_or("DEFAULT_ASPECT_RATIO", build::DEFAULT_ASPECT_RATIO);
        assert!(
            build::ASPECT_RATIOS.contains(&default_aspect_ratio.as_str()),
            "DEFAULT_ASPECT_RATIO must be one of {:?}",
            build::ASPECT_RATIOS
        );

        let pipeline = PipelineConfig {
            max_concurrent_generations,
            backoff: BackoffPolicy {
                base_delay: Duration::from_millis(base_delay_ms),
                max_delay: Duration::from_millis(max_delay_ms),
                max_retries,
            },
            poll_interval: Duration::from_millis(poll_interval_ms),
            defaults: BuildDefaults {
                style: env_or("DEFAULT_STYLE", build::DEFAULT_STYLE),
                aspect_ratio: default_aspect_ratio,
            },
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            stream_keepalive_secs,
            storyboard_ttl_secs,
            image_generator_url,
            image_generator_timeout_secs,
            scene_enricher_url,
            log_json,
            pipeline,
        }
    }

    pub fn stream_keepalive(&self) -> Duration {
        Duration::from_secs(self.stream_keepalive_secs)
    }

    pub fn storyboard_ttl(&self) -> Duration {
        Duration::from_secs(self.storyboard_ttl_secs)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
