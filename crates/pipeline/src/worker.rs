//! Per-frame generation worker.
//!
//! A [`GenerationWorker`] owns exactly one frame while it runs: it moves the
//! frame to `generating`, builds the image prompt, calls the
//! [`ImageGenerator`] and retries transient failures with backoff until the
//! frame is `ready` or `error`. Failures never escape the frame.

use std::sync::Arc;

use boardwright_core::backoff::BackoffPolicy;
use boardwright_core::error::CoreError;
use boardwright_core::frame::{Frame, FrameStatus, FrameTransition};
use boardwright_core::generation::{GenerationRequest, ImageGenerator, PromptEnhancer};
use boardwright_core::prompt;
use boardwright_core::types::StoryboardId;

use crate::store::StoryboardStore;

/// One unit of work: a frame snapshot plus the record-level settings it is
/// rendered with.
#[derive(Debug, Clone)]
pub struct FrameJob {
    pub storyboard_id: StoryboardId,
    pub frame: Frame,
    pub style: String,
    pub aspect_ratio: String,
}

/// Generates images for frames and writes results back into the store.
pub struct GenerationWorker {
    store: Arc<dyn StoryboardStore>,
    generator: Arc<dyn ImageGenerator>,
    enhancer: Arc<dyn PromptEnhancer>,
    backoff: BackoffPolicy,
}

impl GenerationWorker {
    pub fn new(
        store: Arc<dyn StoryboardStore>,
        generator: Arc<dyn ImageGenerator>,
        enhancer: Arc<dyn PromptEnhancer>,
        backoff: BackoffPolicy,
    ) -> Self {
        Self {
            store,
            generator,
            enhancer,
            backoff,
        }
    }

    /// Drive one frame to a terminal state and return that state.
    ///
    /// An `Err` means the store rejected a transition (record evicted,
    /// frame already terminal); generation failures are reported as
    /// `Ok(FrameStatus::Error)`.
    pub async fn run(&self, job: &FrameJob) -> Result<FrameStatus, CoreError> {
        let storyboard_id = job.storyboard_id.as_str();
        let frame_id = job.frame.id.as_str();

        self.store
            .mutate_frame(storyboard_id, frame_id, FrameTransition::Start)
            .await?;

        let image_prompt = self.image_prompt(job).await;
        self.store
            .mutate_frame(
                storyboard_id,
                frame_id,
                FrameTransition::Prompt {
                    prompt: image_prompt.clone(),
                },
            )
            .await?;

        let request = GenerationRequest {
            prompt: image_prompt,
            style: job.style.clone(),
            aspect_ratio: job.aspect_ratio.clone(),
        };

        let mut retries = 0u32;
        loop {
            match self.generator.generate(&request).await {
                Ok(image_url) => {
                    self.store
                        .mutate_frame(storyboard_id, frame_id, FrameTransition::Succeed { image_url })
                        .await?;
                    tracing::info!(
                        storyboard_id,
                        frame_id,
                        attempt = retries + 1,
                        "Frame generated"
                    );
                    return Ok(FrameStatus::Ready);
                }
                Err(failure) if failure.is_transient() && self.backoff.should_retry(retries) => {
                    let delay = self.backoff.delay_for(retries);
                    tracing::warn!(
                        storyboard_id,
                        frame_id,
                        attempt = retries + 1,
                        kind = failure.kind(),
                        delay_ms = delay.as_millis() as u64,
                        error = %failure,
                        "Transient generation failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retries += 1;
                    self.store
                        .mutate_frame(
                            storyboard_id,
                            frame_id,
                            FrameTransition::Retry {
                                reason: failure.to_string(),
                            },
                        )
                        .await?;
                }
                Err(failure) => {
                    tracing::error!(
                        storyboard_id,
                        frame_id,
                        attempt = retries + 1,
                        kind = failure.kind(),
                        transient = failure.is_transient(),
                        error = %failure,
                        "Frame generation failed"
                    );
                    self.store
                        .mutate_frame(
                            storyboard_id,
                            frame_id,
                            FrameTransition::Fail {
                                message: failure.to_string(),
                            },
                        )
                        .await?;
                    return Ok(FrameStatus::Error);
                }
            }
        }
    }

    /// Enhance the frame text and assemble the final prompt. Enhancer
    /// failures fall back to the template enhancement.
    async fn image_prompt(&self, job: &FrameJob) -> String {
        let base = prompt::prompt_base(&job.frame);
        let enhanced = match self.enhancer.enhance(base, &job.style).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => prompt::template_enhance(base, &job.style),
            Err(e) => {
                tracing::warn!(
                    storyboard_id = %job.storyboard_id,
                    frame_id = %job.frame.id,
                    error = %e,
                    "Prompt enhancement failed, using template"
                );
                prompt::template_enhance(base, &job.style)
            }
        };
        prompt::build_image_prompt(
            &enhanced,
            job.frame.shot_type.as_deref(),
            &job.style,
            &job.aspect_ratio,
        )
    }
}

/// Force a frame into `error` after its worker died or bailed out.
///
/// A still-pending frame is started first so the transition stays legal;
/// frames that are already terminal are left alone.
pub async fn fail_frame(
    store: &dyn StoryboardStore,
    storyboard_id: &str,
    frame_id: &str,
    message: &str,
) -> Result<(), CoreError> {
    let record = store
        .get(storyboard_id)
        .await
        .ok_or_else(|| CoreError::storyboard_not_found(storyboard_id))?;
    let status = record
        .frame(frame_id)
        .map(|f| f.status)
        .ok_or_else(|| CoreError::frame_not_found(frame_id))?;

    if status.is_terminal() {
        return Ok(());
    }
    if status == FrameStatus::Pending {
        store
            .mutate_frame(storyboard_id, frame_id, FrameTransition::Start)
            .await?;
    }
    store
        .mutate_frame(
            storyboard_id,
            frame_id,
            FrameTransition::Fail {
                message: message.to_string(),
            },
        )
        .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use boardwright_core::frame::{StoryboardRecord, StoryboardStatus};
    use boardwright_core::generation::{GenerationFailure, TemplateEnhancer};
    use boardwright_core::script::parse_script;
    use boardwright_events::EventBus;

    use super::*;
    use crate::store::InMemoryStore;

    /// Replays a fixed list of outcomes, then succeeds.
    struct Scripted {
        outcomes: Mutex<VecDeque<Result<String, GenerationFailure>>>,
        calls: Mutex<Vec<GenerationRequest>>,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<String, GenerationFailure>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ImageGenerator for Scripted {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationFailure> {
            self.calls.lock().unwrap().push(request.clone());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("https://img/default".into()))
        }
    }

    struct BrokenEnhancer;

    #[async_trait]
    impl PromptEnhancer for BrokenEnhancer {
        async fn enhance(&self, _base: &str, _style: &str) -> Result<String, GenerationFailure> {
            Err(GenerationFailure::Network("llm down".into()))
        }
    }

    async fn setup(
        generator: Arc<Scripted>,
        enhancer: Arc<dyn PromptEnhancer>,
        max_retries: u32,
    ) -> (GenerationWorker, Arc<InMemoryStore>, FrameJob) {
        let store = Arc::new(InMemoryStore::new(Arc::new(EventBus::default())));
        let frame = Frame::from_scene(
            "sb_w",
            &parse_script("Scene 1:\nShot Description: A lighthouse.\nShot: Wide")[0],
        );
        store
            .upsert(StoryboardRecord {
                id: "sb_w".into(),
                title: None,
                project_id: None,
                aspect_ratio: "16:9".into(),
                style: "Noir".into(),
                frames: vec![frame.clone()],
                status: StoryboardStatus::Building,
                created_at: chrono::Utc::now(),
                completed_at: None,
            })
            .await;

        let policy = BackoffPolicy {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
            max_retries,
        };
        let worker = GenerationWorker::new(store.clone(), generator, enhancer, policy);
        let job = FrameJob {
            storyboard_id: "sb_w".into(),
            frame,
            style: "Noir".into(),
            aspect_ratio: "16:9".into(),
        };
        (worker, store, job)
    }

    async fn frame(store: &InMemoryStore) -> Frame {
        store.get("sb_w").await.unwrap().frames[0].clone()
    }

    // -- success -------------------------------------------------------------

    #[tokio::test]
    async fn success_sets_url_and_prompt() {
        let generator = Scripted::new(vec![Ok("https://img/1".into())]);
        let (worker, store, job) = setup(generator.clone(), Arc::new(TemplateEnhancer), 3).await;

        assert_eq!(worker.run(&job).await.unwrap(), FrameStatus::Ready);

        let frame = frame(&store).await;
        assert_eq!(frame.status, FrameStatus::Ready);
        assert_eq!(frame.image_url.as_deref(), Some("https://img/1"));
        assert_eq!(
            frame.image_prompt.as_deref(),
            Some("A lighthouse. – detailed Noir cinematic focus, Wide, Noir, aspect 16:9")
        );
        assert_eq!(generator.call_count(), 1);
        assert_eq!(generator.calls.lock().unwrap()[0].aspect_ratio, "16:9");
    }

    #[tokio::test]
    async fn enhancer_failure_falls_back_to_template() {
        let generator = Scripted::new(vec![]);
        let (worker, store, job) = setup(generator, Arc::new(BrokenEnhancer), 0).await;

        worker.run(&job).await.unwrap();
        let prompt = frame(&store).await.image_prompt.unwrap();
        assert!(prompt.starts_with("A lighthouse. – detailed Noir cinematic focus"));
    }

    // -- retry ---------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried() {
        let generator = Scripted::new(vec![
            Err(GenerationFailure::RateLimited("429".into())),
            Err(GenerationFailure::Timeout("slow".into())),
            Ok("https://img/3".into()),
        ]);
        let (worker, store, job) = setup(generator.clone(), Arc::new(TemplateEnhancer), 3).await;

        assert_eq!(worker.run(&job).await.unwrap(), FrameStatus::Ready);
        assert_eq!(generator.call_count(), 3);
        let frame = frame(&store).await;
        assert_eq!(frame.attempt, 3);
        assert_eq!(frame.image_url.as_deref(), Some("https://img/3"));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_budget_is_bounded() {
        let generator = Scripted::new(vec![
            Err(GenerationFailure::ServerError { status: 503, message: "busy".into() }),
            Err(GenerationFailure::ServerError { status: 503, message: "busy".into() }),
            Err(GenerationFailure::ServerError { status: 503, message: "busy".into() }),
        ]);
        let (worker, store, job) = setup(generator.clone(), Arc::new(TemplateEnhancer), 2).await;

        assert_eq!(worker.run(&job).await.unwrap(), FrameStatus::Error);
        assert_eq!(generator.call_count(), 3);
        let frame = frame(&store).await;
        assert_eq!(
            frame.error_message.as_deref(),
            Some("Image service error (503): busy")
        );
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let generator = Scripted::new(vec![Err(GenerationFailure::QuotaExhausted(
            "monthly limit".into(),
        ))]);
        let (worker, store, job) = setup(generator.clone(), Arc::new(TemplateEnhancer), 3).await;

        assert_eq!(worker.run(&job).await.unwrap(), FrameStatus::Error);
        assert_eq!(generator.call_count(), 1);
        let frame = frame(&store).await;
        assert_eq!(frame.status, FrameStatus::Error);
        assert_eq!(frame.attempt, 1);
    }

    // -- ownership -----------------------------------------------------------

    #[tokio::test]
    async fn terminal_frame_cannot_be_rerun() {
        let generator = Scripted::new(vec![]);
        let (worker, _store, job) = setup(generator, Arc::new(TemplateEnhancer), 0).await;
        worker.run(&job).await.unwrap();
        assert_matches!(
            worker.run(&job).await,
            Err(CoreError::InvalidTransition { .. })
        );
    }

    #[tokio::test]
    async fn fail_frame_handles_pending_and_terminal() {
        let generator = Scripted::new(vec![]);
        let (_worker, store, _job) = setup(generator, Arc::new(TemplateEnhancer), 0).await;

        fail_frame(store.as_ref(), "sb_w", "f_sb_w_0", "worker panicked")
            .await
            .unwrap();
        let failed = frame(&store).await;
        assert_eq!(failed.status, FrameStatus::Error);
        assert_eq!(failed.error_message.as_deref(), Some("worker panicked"));

        // Already terminal: no-op.
        fail_frame(store.as_ref(), "sb_w", "f_sb_w_0", "again")
            .await
            .unwrap();
        assert_eq!(
            frame(&store).await.error_message.as_deref(),
            Some("worker panicked")
        );
    }
}
