//! Snapshot-diffing progress tracker.
//!
//! A [`ProgressTracker`] is owned by one client connection. Each call to
//! [`ProgressTracker::observe`] compares a fresh record snapshot with what
//! the connection has already been told and returns the events still owed:
//!
//! 1. `init` exactly once, first, with the full trimmed frame list;
//! 2. one `frame` per frame that reached a terminal state since the last
//!    observation (never twice for the same frame);
//! 3. `complete` then `end` once the record is terminal, after which the
//!    tracker is finished and yields nothing more.
//!
//! Because the tracker works on snapshots it does not matter whether they
//! are taken on every store notification (push) or on a timer (poll).

use std::collections::HashSet;

use boardwright_core::frame::{StoryboardRecord, StoryboardStatus};
use boardwright_core::trim::{trim_frames, TrimmedFrame};
use boardwright_core::types::{FrameId, StoryboardId};
use serde_json::json;

// ---------------------------------------------------------------------------
// ProgressEvent
// ---------------------------------------------------------------------------

/// A client-facing progress event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Init {
        storyboard_id: StoryboardId,
        status: StoryboardStatus,
        title: String,
        frames: Vec<TrimmedFrame>,
    },
    Frame {
        frame: TrimmedFrame,
    },
    Complete {
        storyboard_id: StoryboardId,
        status: StoryboardStatus,
        title: String,
        frames: Vec<TrimmedFrame>,
    },
    End {
        storyboard_id: StoryboardId,
    },
}

impl ProgressEvent {
    /// Event name used on named-event transports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::Frame { .. } => "frame",
            Self::Complete { .. } => "complete",
            Self::End { .. } => "end",
        }
    }

    /// JSON data carried by the event.
    pub fn payload(&self) -> serde_json::Value {
        match self {
            Self::Init {
                storyboard_id,
                status,
                title,
                frames,
            } => json!({
                "init": true,
                "storyboardId": storyboard_id,
                "status": status,
                "title": title,
                "frames": frames,
            }),
            Self::Frame { frame } => json!({ "frame": frame }),
            Self::Complete {
                storyboard_id,
                status,
                title,
                frames,
            } => json!({
                "complete": true,
                "storyboardId": storyboard_id,
                "status": status,
                "title": title,
                "frames": frames,
            }),
            Self::End { storyboard_id } => json!({ "storyboardId": storyboard_id }),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End { .. })
    }
}

// ---------------------------------------------------------------------------
// ProgressTracker
// ---------------------------------------------------------------------------

/// Per-connection delivery state.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    initialized: bool,
    finished: bool,
    delivered: HashSet<FrameId>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once `end` has been emitted.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of frames already reported as terminal.
    pub fn delivered_count(&self) -> usize {
        self.delivered.len()
    }

    /// Compare `record` with what has been delivered and return the events
    /// still owed, in emission order.
    pub fn observe(&mut self, record: &StoryboardRecord) -> Vec<ProgressEvent> {
        if self.finished {
            return Vec::new();
        }

        let mut events = Vec::new();

        if !self.initialized {
            self.initialized = true;
            // The snapshot already shows terminal frames; don't repeat them.
            self.delivered.extend(
                record
                    .frames
                    .iter()
                    .filter(|f| f.status.is_terminal())
                    .map(|f| f.id.clone()),
            );
            events.push(ProgressEvent::Init {
                storyboard_id: record.id.clone(),
                status: record.status,
                title: record.display_title(),
                frames: trim_frames(&record.frames),
            });
        } else {
            for frame in &record.frames {
                if frame.status.is_terminal() && self.delivered.insert(frame.id.clone()) {
                    events.push(ProgressEvent::Frame {
                        frame: TrimmedFrame::from(frame),
                    });
                }
            }
        }

        if record.status.is_terminal() {
            self.finished = true;
            events.push(ProgressEvent::Complete {
                storyboard_id: record.id.clone(),
                status: record.status,
                title: record.display_title(),
                frames: trim_frames(&record.frames),
            });
            events.push(ProgressEvent::End {
                storyboard_id: record.id.clone(),
            });
        }

        events
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
