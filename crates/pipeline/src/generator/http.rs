//! HTTP image service client.
//!
//! Sends `POST {endpoint}` with `{prompt, style, aspectRatio}` and expects
//! `{url}` back. HTTP status codes and transport errors are mapped onto the
//! [`GenerationFailure`] taxonomy so the worker can decide whether to retry.

use std::time::Duration;

use async_trait::async_trait;
use boardwright_core::generation::{GenerationFailure, GenerationRequest, ImageGenerator};
use serde::{Deserialize, Serialize};

/// Longest response body excerpt kept in an error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody<'a> {
    prompt: &'a str,
    style: &'a str,
    aspect_ratio: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(alias = "imageUrl")]
    url: String,
}

/// [`ImageGenerator`] backed by a remote HTTP endpoint.
pub struct HttpImageGenerator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpImageGenerator {
    /// Create a client whose every call is bounded by `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, endpoint))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationFailure> {
        let body = GenerateBody {
            prompt: &request.prompt,
            style: &request.style,
            aspect_ratio: &request.aspect_ratio,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), excerpt(&text)));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            GenerationFailure::ServerError {
                status: status.as_u16(),
                message: format!("malformed response body: {e}"),
            }
        })?;

        if parsed.url.trim().is_empty() {
            return Err(GenerationFailure::Rejected(
                "image service returned an empty url".into(),
            ));
        }
        Ok(parsed.url)
    }
}

/// Map a non-success HTTP status onto the failure taxonomy.
pub fn classify_status(status: u16, message: String) -> GenerationFailure {
    match status {
        429 => GenerationFailure::RateLimited(message),
        402 => GenerationFailure::QuotaExhausted(message),
        400 | 422 => GenerationFailure::InvalidInput(message),
        408 => GenerationFailure::Timeout(message),
        500..=599 => GenerationFailure::ServerError { status, message },
        _ => GenerationFailure::Rejected(format!("HTTP {status}: {message}")),
    }
}

pub(crate) fn classify_transport(error: reqwest::Error) -> GenerationFailure {
    if error.is_timeout() {
        GenerationFailure::Timeout(error.to_string())
    } else if error.is_connect() || error.is_request() {
        GenerationFailure::Network(error.to_string())
    } else if error.is_builder() {
        GenerationFailure::InvalidInput(error.to_string())
    } else {
        GenerationFailure::Network(error.to_string())
    }
}

pub(crate) fn excerpt(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return "no response body".to_string();
    }
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn status_mapping() {
        let m = || "msg".to_string();
        assert_matches!(classify_status(429, m()), GenerationFailure::RateLimited(_));
        assert_matches!(classify_status(402, m()), GenerationFailure::QuotaExhausted(_));
        assert_matches!(classify_status(400, m()), GenerationFailure::InvalidInput(_));
        assert_matches!(classify_status(422, m()), GenerationFailure::InvalidInput(_));
        assert_matches!(classify_status(408, m()), GenerationFailure::Timeout(_));
        assert_matches!(
            classify_status(503, m()),
            GenerationFailure::ServerError { status: 503, .. }
        );
        assert_matches!(classify_status(403, m()), GenerationFailure::Rejected(msg) if msg.contains("403"));
    }

    #[test]
    fn mapped_failures_have_expected_retry_class() {
        assert!(classify_status(429, String::new()).is_transient());
        assert!(classify_status(500, String::new()).is_transient());
        assert!(!classify_status(402, String::new()).is_transient());
        assert!(!classify_status(404, String::new()).is_transient());
    }

    #[test]
    fn excerpt_truncates_and_labels_empty_bodies() {
        assert_eq!(excerpt("   "), "no response body");
        assert_eq!(excerpt(&"x".repeat(500)).len(), MAX_ERROR_BODY_CHARS);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_network_failure() {
        let generator =
            HttpImageGenerator::new("http://127.0.0.1:1/generate", Duration::from_secs(2)).unwrap();
        let request = GenerationRequest {
            prompt: "p".into(),
            style: "s".into(),
            aspect_ratio: "1:1".into(),
        };
        let failure = generator.generate(&request).await.unwrap_err();
        assert!(failure.is_transient(), "{failure:?}");
    }
}
