//! Durable frame persistence hook.
//!
//! [`EventPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and hands every terminal frame and every completed record to a
//! [`FrameSink`]. It runs as a long-lived background task and shuts down
//! when the bus sender is dropped.

use std::sync::Arc;

use async_trait::async_trait;
use boardwright_core::error::CoreError;
use boardwright_core::trim::{TrimmedFrame, TrimmedRecord};
use tokio::sync::broadcast;

use crate::bus::{StoryboardEvent, StoryboardEventKind};

/// Destination for finished storyboard data (database, object store, ...).
#[async_trait]
pub trait FrameSink: Send + Sync {
    /// Called once per frame when it reaches `ready` or `error`.
    async fn frame_finished(&self, storyboard_id: &str, frame: &TrimmedFrame)
        -> Result<(), CoreError>;

    /// Called once per record when its aggregate status becomes terminal.
    async fn storyboard_completed(&self, record: &TrimmedRecord) -> Result<(), CoreError>;
}

/// Default sink: logs what would have been persisted.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

#[async_trait]
impl FrameSink for TracingSink {
    async fn frame_finished(
        &self,
        storyboard_id: &str,
        frame: &TrimmedFrame,
    ) -> Result<(), CoreError> {
        tracing::debug!(
            storyboard_id,
            frame_id = %frame.id,
            status = %frame.status,
            image_url = frame.image_url.as_deref().unwrap_or(""),
            "Frame finished"
        );
        Ok(())
    }

    async fn storyboard_completed(&self, record: &TrimmedRecord) -> Result<(), CoreError> {
        tracing::info!(
            storyboard_id = %record.id,
            status = %record.status,
            frames = record.frames.len(),
            "Storyboard completed"
        );
        Ok(())
    }
}

/// Background service that forwards finished frames to a [`FrameSink`].
pub struct EventPersistence;

impl EventPersistence {
    /// Run the persistence loop until the bus is closed.
    ///
    /// Sink failures are logged and never stop the loop.
    pub async fn run(sink: Arc<dyn FrameSink>, mut receiver: broadcast::Receiver<StoryboardEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::persist(sink.as_ref(), &event).await {
                        tracing::error!(
                            error = %e,
                            storyboard_id = %event.storyboard_id,
                            "Failed to persist storyboard event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Event persistence lagged, some frames were not persisted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, persistence shutting down");
                    break;
                }
            }
        }
    }

    async fn persist(sink: &dyn FrameSink, event: &StoryboardEvent) -> Result<(), CoreError> {
        match &event.kind {
            StoryboardEventKind::FrameUpdated { frame } if frame.status.is_terminal() => {
                sink.frame_finished(&event.storyboard_id, frame).await
            }
            StoryboardEventKind::Completed { record } => sink.storyboard_completed(record).await,
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
