//! Seams to the external generation services and their failure taxonomy.
//!
//! The pipeline only ever talks to an [`ImageGenerator`], a
//! [`PromptEnhancer`] and a [`SceneEnricher`]; concrete adapters (HTTP, placeholder, test doubles)
//! live outside this crate.

use async_trait::async_trait;

use crate::prompt;
use crate::script::{SceneMetadata, ScriptScene};

// ---------------------------------------------------------------------------
// Failure taxonomy
// ---------------------------------------------------------------------------

/// Why a single image generation call failed.
///
/// The `Display` output is what a failed frame shows as its `errorMessage`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationFailure {
    /// HTTP 429 or an equivalent backend throttle.
    #[error("Image service rate limit reached: {0}")]
    RateLimited(String),

    /// HTTP 5xx from the backend.
    #[error("Image service error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Image generation timed out: {0}")]
    Timeout(String),

    /// Connection refused, reset or DNS failure.
    #[error("Image service unreachable: {0}")]
    Network(String),

    /// The prompt or parameters were rejected as malformed.
    #[error("Invalid generation input: {0}")]
    InvalidInput(String),

    #[error("Image generation quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("Unsupported style: {0}")]
    UnsupportedStyle(String),

    /// Any other client-side rejection (content policy, auth, ...).
    #[error("Image generation rejected: {0}")]
    Rejected(String),
}

impl GenerationFailure {
    /// Transient failures are retried with backoff; everything else fails
    /// the frame immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_) | Self::ServerError { .. } | Self::Timeout(_) | Self::Network(_)
        )
    }

    /// Short machine-readable kind, used as a tracing field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RateLimited(_) => "rate_limited",
            Self::ServerError { .. } => "server_error",
            Self::Timeout(_) => "timeout",
            Self::Network(_) => "network",
            Self::InvalidInput(_) => "invalid_input",
            Self::QuotaExhausted(_) => "quota_exhausted",
            Self::UnsupportedStyle(_) => "unsupported_style",
            Self::Rejected(_) => "rejected",
        }
    }
}

// ---------------------------------------------------------------------------
// Image generation
// ---------------------------------------------------------------------------

/// Parameters of one image generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub style: String,
    pub aspect_ratio: String,
}

/// External "produce image for prompt" capability.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate one image and return its URL.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationFailure>;
}

// ---------------------------------------------------------------------------
// Prompt enhancement
// ---------------------------------------------------------------------------

/// Rewrites scene text into a richer image prompt subject.
#[async_trait]
pub trait PromptEnhancer: Send + Sync {
    async fn enhance(&self, base: &str, style: &str) -> Result<String, GenerationFailure>;
}

/// Deterministic enhancer backed by [`prompt::template_enhance`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateEnhancer;

#[async_trait]
impl PromptEnhancer for TemplateEnhancer {
    async fn enhance(&self, base: &str, style: &str) -> Result<String, GenerationFailure> {
        Ok(prompt::template_enhance(base, style))
    }
}

// ---------------------------------------------------------------------------
// Scene enrichment
// ---------------------------------------------------------------------------

/// Extracts missing scene fields from a block the label parser could not
/// fully read. Failures are never fatal; the parsed scene is kept.
#[async_trait]
pub trait SceneEnricher: Send + Sync {
    async fn enrich(
        &self,
        scene: &ScriptScene,
        style: &str,
        aspect_ratio: &str,
    ) -> Result<SceneMetadata, GenerationFailure>;
}

/// Enricher that supplies nothing, leaving parsed scenes unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEnricher;

#[async_trait]
impl SceneEnricher for NoopEnricher {
    async fn enrich(
        &self,
        _scene: &ScriptScene,
        _style: &str,
        _aspect_ratio: &str,
    ) -> Result<SceneMetadata, GenerationFailure> {
        Ok(SceneMetadata::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        let transient = [
            GenerationFailure::RateLimited("slow down".into()),
            GenerationFailure::ServerError { status: 503, message: "busy".into() },
            GenerationFailure::Timeout("60s".into()),
            GenerationFailure::Network("connection reset".into()),
        ];
        let permanent = [
            GenerationFailure::InvalidInput("empty prompt".into()),
            GenerationFailure::QuotaExhausted("monthly".into()),
            GenerationFailure::UnsupportedStyle("Claymation".into()),
            GenerationFailure::Rejected("policy".into()),
        ];
        assert!(transient.iter().all(GenerationFailure::is_transient));
        assert!(!permanent.iter().any(GenerationFailure::is_transient));
    }

    #[test]
    fn display_is_human_readable() {
        let failure = GenerationFailure::ServerError { status: 502, message: "bad gateway".into() };
        assert_eq!(failure.to_string(), "Image service error (502): bad gateway");
        assert_eq!(failure.kind(), "server_error");
    }
}
