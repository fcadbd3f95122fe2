//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` between the record store
//! (publisher) and the stream drivers and persistence service
//! (subscribers).

use boardwright_core::frame::{FrameStatus, StoryboardStatus};
use boardwright_core::trim::{TrimmedFrame, TrimmedRecord};
use boardwright_core::types::{StoryboardId, Timestamp};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// StoryboardEvent
// ---------------------------------------------------------------------------

/// What happened to a storyboard record.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoryboardEventKind {
    /// A skeleton record was inserted.
    Created { frames: usize },
    /// One frame changed status (including retry self-loops).
    FrameUpdated { frame: TrimmedFrame },
    /// Every frame is terminal and the aggregate status is fixed.
    Completed { record: TrimmedRecord },
    /// The record was removed from the store.
    Evicted,
}

/// A store mutation notification.
#[derive(Debug, Clone, Serialize)]
pub struct StoryboardEvent {
    pub storyboard_id: StoryboardId,
    pub kind: StoryboardEventKind,
    pub timestamp: Timestamp,
}

impl StoryboardEvent {
    pub fn new(storyboard_id: impl Into<StoryboardId>, kind: StoryboardEventKind) -> Self {
        Self {
            storyboard_id: storyboard_id.into(),
            kind,
            timestamp: Utc::now(),
        }
    }

    /// Status of the updated frame, if this is a frame event.
    pub fn frame_status(&self) -> Option<FrameStatus> {
        match &self.kind {
            StoryboardEventKind::FrameUpdated { frame } => Some(frame.status),
            _ => None,
        }
    }

    /// Final record status, if this is a completion event.
    pub fn completed_status(&self) -> Option<StoryboardStatus> {
        match &self.kind {
            StoryboardEventKind::Completed { record } => Some(record.status),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
pub const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// When the buffer is full the oldest un-consumed messages are dropped and
/// slow receivers observe `RecvError::Lagged`. Stream drivers treat a lag as
/// "something changed" and re-read the store, so no update is lost for them.
pub struct EventBus {
    sender: broadcast::Sender<StoryboardEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: StoryboardEvent) {
        // Ignore the SendError; it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoryboardEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
