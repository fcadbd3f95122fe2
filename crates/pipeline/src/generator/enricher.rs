//! HTTP scene metadata extractor.
//!
//! Sends `POST {endpoint}` with `{text, style, aspectRatio}` and expects
//! `{shotDescription, shotType, dialogue, sound}` back, any of which may be
//! missing or empty.

use std::time::Duration;

use async_trait::async_trait;
use boardwright_core::generation::{GenerationFailure, SceneEnricher};
use boardwright_core::script::{SceneMetadata, ScriptScene};
use serde::Serialize;

use super::http::{classify_status, classify_transport, excerpt};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnrichBody<'a> {
    text: &'a str,
    style: &'a str,
    aspect_ratio: &'a str,
}

/// [`SceneEnricher`] backed by a remote HTTP endpoint.
pub struct HttpSceneEnricher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSceneEnricher {
    /// Create a client whose every call is bounded by `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SceneEnricher for HttpSceneEnricher {
    async fn enrich(
        &self,
        scene: &ScriptScene,
        style: &str,
        aspect_ratio: &str,
    ) -> Result<SceneMetadata, GenerationFailure> {
        let text = if scene.raw_block.trim().is_empty() {
            &scene.shot_description
        } else {
            &scene.raw_block
        };
        let body = EnrichBody {
            text,
            style,
            aspect_ratio,
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

        response
            .json::<SceneMetadata>()
            .await
            .map_err(|e| GenerationFailure::ServerError {
                status: status.as_u16(),
                message: format!("malformed response body: {e}"),
            })
    }
}
