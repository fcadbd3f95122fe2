use std::sync::Arc;
use std::time::Duration;

use boardwright_core::generation::{ImageGenerator, NoopEnricher, PromptEnhancer, SceneEnricher};
use boardwright_events::EventBus;
use boardwright_pipeline::generator::{
    HttpImageGenerator, HttpSceneEnricher, PlaceholderGenerator,
};
use boardwright_pipeline::{
    BuildOrchestrator, GenerationWorker, InMemoryStore, ProgressBroadcaster, StoryboardStore,
};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Storyboard records.
    pub store: Arc<dyn StoryboardStore>,
    /// Starts builds and owns the worker pool.
    pub orchestrator: Arc<BuildOrchestrator>,
    /// Opens push and poll progress streams.
    pub broadcaster: Arc<ProgressBroadcaster>,
    /// Store change notifications.
    pub event_bus: Arc<EventBus>,
}

impl AppState {
    /// Wire the pipeline together around the given generation backends.
    pub fn new(
        config: ServerConfig,
        generator: Arc<dyn ImageGenerator>,
        enhancer: Arc<dyn PromptEnhancer>,
        enricher: Arc<dyn SceneEnricher>,
    ) -> Self {
        let event_bus = Arc::new(EventBus::default());
        let store: Arc<dyn StoryboardStore> = Arc::new(InMemoryStore::new(Arc::clone(&event_bus)));

        let worker = Arc::new(GenerationWorker::new(
            Arc::clone(&store),
            generator,
            enhancer,
            config.pipeline.backoff,
        ));
        let orchestrator = Arc::new(BuildOrchestrator::new(
            Arc::clone(&store),
            worker,
            config.pipeline.max_concurrent_generations,
            config.pipeline.defaults.clone(),
        )
        .with_enricher(enricher));
        let broadcaster = Arc::new(ProgressBroadcaster::new(
            Arc::clone(&store),
            Arc::clone(&event_bus),
            config.pipeline.poll_interval,
        ));

        Self {
            config: Arc::new(config),
            store,
            orchestrator,
            broadcaster,
            event_bus,
        }
    }
}

/// Pick the image backend from configuration: the HTTP service when
/// `IMAGE_GENERATOR_URL` is set, placeholders otherwise.
///
/// Panics if the HTTP client cannot be constructed.
pub fn image_generator_from_config(config: &ServerConfig) -> Arc<dyn ImageGenerator> {
    match &config.image_generator_url {
        Some(url) => {
            let timeout = Duration::from_secs(config.image_generator_timeout_secs);
            let generator = HttpImageGenerator::new(url.clone(), timeout)
                .expect("Failed to build image generator HTTP client");
            tracing::info!(endpoint = %generator.endpoint(), "Using HTTP image generator");
            Arc::new(generator)
        }
        None => {
            tracing::warn!("IMAGE_GENERATOR_URL not set, using placeholder images");
            Arc::new(PlaceholderGenerator)
        }
    }
}

/// Pick the scene enricher from configuration: the HTTP extractor when
/// `SCENE_ENRICHER_URL` is set, a no-op otherwise.
///
/// Panics if the HTTP client cannot be constructed.
pub fn scene_enricher_from_config(config: &ServerConfig) -> Arc<dyn SceneEnricher> {
    match &config.scene_enricher_url {
        Some(url) => {
            let timeout = Duration::from_secs(config.image_generator_timeout_secs);
            let enricher = HttpSceneEnricher::new(url.clone(), timeout)
                .expect("Failed to build scene enricher HTTP client");
            tracing::info!(endpoint = %enricher.endpoint(), "Using HTTP scene enricher");
            Arc::new(enricher)
        }
        None => Arc::new(NoopEnricher),
    }
}
