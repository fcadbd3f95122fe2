//! Build orchestration.
//!
//! [`BuildOrchestrator::build`] validates a request, parses the script,
//! fills in scene fields the parser missed through a [`SceneEnricher`],
//! inserts the skeleton record and returns immediately. Generation runs in a
//! detached supervisor task that schedules one worker per frame, bounded by
//! a process-wide semaphore, and finalises the record once every frame is
//! terminal.

use std::collections::HashMap;
use std::sync::Arc;

use boardwright_core::build::{BuildDefaults, BuildRequest, ProcessMode};
use boardwright_core::error::CoreError;
use boardwright_core::frame::{Frame, StoryboardRecord, StoryboardStatus};
use boardwright_core::generation::{NoopEnricher, SceneEnricher};
use boardwright_core::script::{parse_script, ScriptScene};
use boardwright_core::types::{self, FrameId};
use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle, JoinSet};

use crate::store::StoryboardStore;
use crate::worker::{self, FrameJob, GenerationWorker};

/// `errorMessage` of a frame whose worker died before reporting a result.
pub const FRAME_ABORTED_MESSAGE: &str = "Image generation failed";

/// Result of a successful build call.
#[derive(Debug)]
pub struct BuildHandle {
    /// The skeleton record as inserted (all frames `pending`).
    pub record: StoryboardRecord,
    pub process_mode: ProcessMode,
    /// Resolves to the final aggregate status once generation is done.
    /// Dropping it does not cancel generation.
    pub completion: JoinHandle<Option<StoryboardStatus>>,
}

/// Creates storyboard records and schedules their generation.
#[derive(Clone)]
pub struct BuildOrchestrator {
    store: Arc<dyn StoryboardStore>,
    worker: Arc<GenerationWorker>,
    enricher: Arc<dyn SceneEnricher>,
    pool: Arc<Semaphore>,
    defaults: BuildDefaults,
}

impl BuildOrchestrator {
    pub fn new(
        store: Arc<dyn StoryboardStore>,
        worker: Arc<GenerationWorker>,
        max_concurrent_generations: usize,
        defaults: BuildDefaults,
    ) -> Self {
        Self {
            store,
            worker,
            enricher: Arc::new(NoopEnricher),
            pool: Arc::new(Semaphore::new(max_concurrent_generations.max(1))),
            defaults,
        }
    }

    /// Use `enricher` for scenes with missing fields.
    pub fn with_enricher(mut self, enricher: Arc<dyn SceneEnricher>) -> Self {
        self.enricher = enricher;
        self
    }

    /// Permits currently free in the shared worker pool.
    pub fn available_workers(&self) -> usize {
        self.pool.available_permits()
    }

    /// Validate `request`, insert the skeleton record and start generation.
    pub async fn build(&self, request: BuildRequest) -> Result<BuildHandle, CoreError> {
        let plan = request.resolve(&self.defaults)?;
        let id = types::new_storyboard_id();

        let mut scenes = parse_script(&plan.script);
        self.enrich(&id, &mut scenes, &plan.style, &plan.aspect_ratio)
            .await;

        let frames: Vec<Frame> = scenes
            .iter()
            .map(|scene| Frame::from_scene(&id, scene))
            .collect();

        let record = StoryboardRecord {
            id: id.clone(),
            title: plan.title,
            project_id: plan.project_id,
            aspect_ratio: plan.aspect_ratio,
            style: plan.style,
            frames,
            status: StoryboardStatus::Building,
            created_at: Utc::now(),
            completed_at: None,
        };
        self.store.upsert(record.clone()).await;

        tracing::info!(
            storyboard_id = %id,
            frames = record.frames.len(),
            process_mode = %plan.process_mode,
            aspect_ratio = %record.aspect_ratio,
            style = %record.style,
            "Storyboard build started"
        );

        let completion = tokio::spawn(self.clone().supervise(record.clone(), plan.process_mode));

        Ok(BuildHandle {
            record,
            process_mode: plan.process_mode,
            completion,
        })
    }

    /// Ask the enricher for every scene missing a field. A failed call keeps
    /// the parsed scene as it is.
    async fn enrich(
        &self,
        id: &str,
        scenes: &mut [ScriptScene],
        style: &str,
        aspect_ratio: &str,
    ) {
        for scene in scenes.iter_mut().filter(|s| s.needs_metadata()) {
            let enriched = self.enricher.enrich(scene, style, aspect_ratio).await;
            match enriched {
                Ok(metadata) => scene.fill_missing(metadata),
                Err(e) => tracing::warn!(
                    storyboard_id = %id,
                    scene = scene.order,
                    kind = e.kind(),
                    error = %e,
                    "Scene enrichment failed, keeping parsed fields"
                ),
            }
        }
    }

    /// Run every frame of `record` to completion, then finalise it.
    async fn supervise(self, record: StoryboardRecord, mode: ProcessMode) -> Option<StoryboardStatus> {
        let jobs: Vec<FrameJob> = record
            .frames
            .iter()
            .map(|frame| FrameJob {
                storyboard_id: record.id.clone(),
                frame: frame.clone(),
                style: record.style.clone(),
                aspect_ratio: record.aspect_ratio.clone(),
            })
            .collect();

        match mode {
            ProcessMode::Async => self.run_concurrent(jobs).await,
            ProcessMode::Sequential => self.run_sequential(jobs).await,
        }

        match self.store.finalize(&record.id).await {
            Ok(Some(status)) => {
                tracing::info!(storyboard_id = %record.id, status = %status, "Storyboard finished");
                Some(status)
            }
            Ok(None) => {
                tracing::warn!(
                    storyboard_id = %record.id,
                    "Storyboard not finalised, frames still in flight"
                );
                None
            }
            Err(e) => {
                tracing::warn!(storyboard_id = %record.id, error = %e, "Storyboard finalise failed");
                None
            }
        }
    }

    async fn run_concurrent(&self, jobs: Vec<FrameJob>) {
        let mut set = JoinSet::new();
        let mut owners: HashMap<tokio::task::Id, (String, FrameId)> = HashMap::new();

        for job in jobs {
            let owner = (job.storyboard_id.clone(), job.frame.id.clone());
            let handle = set.spawn(self.clone().run_frame(job));
            owners.insert(handle.id(), owner);
        }

        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                if let Some((storyboard_id, frame_id)) = owners.get(&e.id()) {
                    self.recover(storyboard_id, frame_id, &e).await;
                }
            }
        }
    }

    async fn run_sequential(&self, jobs: Vec<FrameJob>) {
        for job in jobs {
            let storyboard_id = job.storyboard_id.clone();
            let frame_id = job.frame.id.clone();
            let joined = tokio::spawn(self.clone().run_frame(job)).await;
            if let Err(e) = joined {
                self.recover(&storyboard_id, &frame_id, &e).await;
            }
        }
    }

    /// One frame task: wait for a pool permit, then run the worker.
    async fn run_frame(self, job: FrameJob) {
        let outcome = match self.pool.clone().acquire_owned().await {
            Ok(_permit) => self.worker.run(&job).await.map(|_| ()),
            Err(e) => Err(CoreError::Internal(e.to_string())),
        };

        if let Err(e) = outcome {
            tracing::error!(
                storyboard_id = %job.storyboard_id,
                frame_id = %job.frame.id,
                error = %e,
                "Generation worker aborted"
            );
            self.settle(&job.storyboard_id, &job.frame.id).await;
        }
    }

    /// Put the frame of a crashed task into `error` so the record can finish.
    async fn recover(&self, storyboard_id: &str, frame_id: &str, cause: &JoinError) {
        tracing::error!(storyboard_id, frame_id, error = %cause, "Generation task crashed");
        self.settle(storyboard_id, frame_id).await;
    }

    async fn settle(&self, storyboard_id: &str, frame_id: &str) {
        if let Err(e) =
            worker::fail_frame(self.store.as_ref(), storyboard_id, frame_id, FRAME_ABORTED_MESSAGE)
                .await
        {
            tracing::warn!(storyboard_id, frame_id, error = %e, "Could not settle aborted frame");
        }
    }
}
