#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use boardwright_core::backoff::BackoffPolicy;
use boardwright_core::build::BuildDefaults;
use boardwright_core::generation::{
    GenerationFailure, GenerationRequest, ImageGenerator, NoopEnricher, TemplateEnhancer,
};
use boardwright_pipeline::PipelineConfig;
use http_body_util::BodyExt;
use tokio::sync::Semaphore;
use tower::ServiceExt;

use boardwright_api::config::ServerConfig;
use boardwright_api::router::build_app_router;
use boardwright_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// immediate retries and a short poll interval.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        stream_keepalive_secs: 15,
        storyboard_ttl_secs: 3600,
        image_generator_url: None,
        image_generator_timeout_secs: 5,
        scene_enricher_url: None,
        log_json: false,
        pipeline: PipelineConfig {
            max_concurrent_generations: 4,
            backoff: BackoffPolicy::immediate(1),
            poll_interval: Duration::from_millis(20),
            defaults: BuildDefaults::default(),
        },
    }
}

/// Image generator that waits for a permit on `gate` before answering.
///
/// Prompts containing `FAIL` are rejected permanently; everything else gets
/// a URL derived from the prompt length.
pub struct GatedGenerator {
    pub gate: Semaphore,
}

impl GatedGenerator {
    /// Generator that answers immediately.
    pub fn open() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(Semaphore::MAX_PERMITS),
        })
    }

    /// Generator that blocks until [`GatedGenerator::release`] is called.
    pub fn closed() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
        })
    }

    pub fn release(&self) {
        self.gate.add_permits(1024);
    }
}

#[async_trait]
impl ImageGenerator for GatedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationFailure> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| GenerationFailure::Network("gate closed".into()))?;
        if request.prompt.contains("FAIL") {
            return Err(GenerationFailure::InvalidInput("prompt rejected".into()));
        }
        Ok(format!("https://img.test/{}.png", request.prompt.len()))
    }
}

/// Build the application state around `generator`.
pub fn test_state(generator: Arc<GatedGenerator>) -> AppState {
    AppState::new(
        test_config(),
        generator,
        Arc::new(TemplateEnhancer),
        Arc::new(NoopEnricher),
    )
}

/// Build the full application router with all middleware layers and an
/// immediately answering generator.
pub fn build_test_app() -> Router {
    build_app_router(test_state(GatedGenerator::open()))
}

/// Read the whole body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Read the whole body as text, failing the test if it does not end in time.
pub async fn body_text(response: Response<Body>) -> String {
    let collected = tokio::time::timeout(Duration::from_secs(10), response.into_body().collect())
        .await
        .expect("body did not finish in time")
        .unwrap();
    String::from_utf8(collected.to_bytes().to_vec()).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Percent-encode a value for use in a query string.
pub fn encode_query(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

/// A three-scene script with a title line.
pub fn sample_script() -> String {
    "**[Title: Morning Routine]**\n\n\
     **Scene 1:**\nShot Description: Alarm clock rings on a nightstand.\nShot: Close-up\n\n\
     **Scene 2:**\nShot Description: A hand reaches for the clock.\nShot: Insert\n\n\
     **Scene 3:**\nShot Description: Sunlight fills the kitchen.\nShot: Wide\n"
        .to_string()
}
