//! Outbound projections of frames and records.
//!
//! Everything that leaves the process (HTTP bodies, stream events, the
//! persistence hook) goes through these types. Internal bookkeeping such as
//! the attempt counter, retry reasons and the scene's source text is never
//! serialised.

use serde::Serialize;

use crate::frame::{Frame, FrameStatus, StoryboardRecord, StoryboardStatus};
use crate::types::{FrameId, StoryboardId, Timestamp};

/// External view of a [`Frame`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimmedFrame {
    pub id: FrameId,
    pub index: usize,
    pub scene: u32,
    pub title: String,
    pub shot_description: String,
    pub shot: Option<String>,
    pub angle: Option<String>,
    pub dialogue: Option<String>,
    pub sound: Option<String>,
    pub status: FrameStatus,
    pub image_url: Option<String>,
    pub image_prompt: Option<String>,
    pub error_message: Option<String>,
}

impl From<&Frame> for TrimmedFrame {
    fn from(frame: &Frame) -> Self {
        Self {
            id: frame.id.clone(),
            index: frame.index,
            scene: frame.display_scene(),
            title: frame.title.clone(),
            shot_description: frame.shot_description.clone(),
            shot: frame.shot_type.clone(),
            angle: frame.angle.clone(),
            dialogue: frame.dialogue.clone(),
            sound: frame.sound.clone(),
            status: frame.status,
            image_url: frame.image_url.clone(),
            image_prompt: frame.image_prompt.clone(),
            error_message: frame.error_message.clone(),
        }
    }
}

/// Trim every frame of a record, preserving index order.
pub fn trim_frames(frames: &[Frame]) -> Vec<TrimmedFrame> {
    frames.iter().map(TrimmedFrame::from).collect()
}

/// External view of a [`StoryboardRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimmedRecord {
    pub id: StoryboardId,
    pub project_id: Option<String>,
    pub status: StoryboardStatus,
    pub title: String,
    pub aspect_ratio: String,
    pub style: String,
    pub frames: Vec<TrimmedFrame>,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl From<&StoryboardRecord> for TrimmedRecord {
    fn from(record: &StoryboardRecord) -> Self {
        Self {
            id: record.id.clone(),
            project_id: record.project_id.clone(),
            status: record.status,
            title: record.display_title(),
            aspect_ratio: record.aspect_ratio.clone(),
            style: record.style.clone(),
            frames: trim_frames(&record.frames),
            created_at: record.created_at,
            completed_at: record.completed_at,
        }
    }
}

/// Fallback record title when neither a title nor any frame is available.
pub const DEFAULT_STORYBOARD_TITLE: &str = "Storyboard";

impl StoryboardRecord {
    /// Title shown to clients: the stored title, else the first frame's
    /// derived title, else [`DEFAULT_STORYBOARD_TITLE`].
    pub fn display_title(&self) -> String {
        self.title
            .clone()
            .or_else(|| self.frames.first().map(|f| f.title.clone()))
            .unwrap_or_else(|| DEFAULT_STORYBOARD_TITLE.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
