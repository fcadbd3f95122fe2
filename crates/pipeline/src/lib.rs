//! Boardwright storyboard generation pipeline.
//!
//! - [`store`]: the [`StoryboardStore`] seam and its in-memory,
//!   bus-publishing implementation.
//! - [`worker`]: per-frame generation with retry and backoff.
//! - [`orchestrator`]: turns a build request into a record and schedules
//!   its workers on a bounded pool.
//! - [`broadcaster`]: push and poll progress streams over the store.
//! - [`generator`]: concrete [`ImageGenerator`](boardwright_core::generation::ImageGenerator)
//!   adapters.

pub mod broadcaster;
pub mod config;
pub mod generator;
pub mod orchestrator;
pub mod store;
pub mod worker;

pub use broadcaster::ProgressBroadcaster;
pub use config::PipelineConfig;
pub use orchestrator::{BuildHandle, BuildOrchestrator};
pub use store::{InMemoryStore, StoryboardStore};
pub use worker::{FrameJob, GenerationWorker};
