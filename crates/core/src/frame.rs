//! Storyboard data model and the frame/record state machines.
//!
//! Frame lifecycle:
//!
//! ```text
//! pending -> generating -> ready
//!                  |  \-> error
//!                  \-- generating (prompt recorded, retry)
//! ```
//!
//! Record lifecycle: `building -> {ready, partial, error}`. Both terminal
//! sets are absorbing: no transition ever leaves `ready` or `error`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::script::ScriptScene;
use crate::types::{self, FrameId, StoryboardId, Timestamp};

// ---------------------------------------------------------------------------
// Frame status
// ---------------------------------------------------------------------------

/// Per-frame generation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameStatus {
    Pending,
    Generating,
    Ready,
    Error,
}

impl FrameStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Generating => "generating",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }

    /// `ready` and `error` are final.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }

    /// Statuses reachable from `self`. Terminal states return an empty slice.
    pub fn valid_transitions(self) -> &'static [FrameStatus] {
        match self {
            Self::Pending => &[Self::Generating],
            Self::Generating => &[Self::Generating, Self::Ready, Self::Error],
            Self::Ready | Self::Error => &[],
        }
    }

    pub fn can_transition_to(self, next: FrameStatus) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl fmt::Display for FrameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Storyboard status
// ---------------------------------------------------------------------------

/// Aggregate status of a storyboard record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryboardStatus {
    Building,
    Partial,
    Ready,
    Error,
}

impl StoryboardStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Partial => "partial",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Building)
    }

    /// Aggregate status for a set of terminal frames.
    ///
    /// `ready` iff every frame is ready, `error` iff none succeeded,
    /// `partial` otherwise. Returns `None` while any frame is still in flight.
    pub fn aggregate(frames: &[Frame]) -> Option<Self> {
        if frames.iter().any(|f| !f.status.is_terminal()) {
            return None;
        }
        let ready = frames
            .iter()
            .filter(|f| f.status == FrameStatus::Ready)
            .count();
        Some(match ready {
            0 => Self::Error,
            n if n == frames.len() => Self::Ready,
            _ => Self::Partial,
        })
    }
}

impl fmt::Display for StoryboardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// Maximum length of a derived frame title before it is elided.
pub const MAX_FRAME_TITLE_CHARS: usize = 80;

/// A state change requested by the worker that owns a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameTransition {
    /// `pending -> generating`.
    Start,
    /// `generating -> generating`, recording the prompt sent to the generator.
    Prompt { prompt: String },
    /// `generating -> generating` after a transient failure.
    Retry { reason: String },
    /// `generating -> ready`.
    Succeed { image_url: String },
    /// `generating -> error`.
    Fail { message: String },
}

impl FrameTransition {
    pub fn target(&self) -> FrameStatus {
        match self {
            Self::Start | Self::Prompt { .. } | Self::Retry { .. } => FrameStatus::Generating,
            Self::Succeed { .. } => FrameStatus::Ready,
            Self::Fail { .. } => FrameStatus::Error,
        }
    }
}

/// One scene's generation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub id: FrameId,
    pub index: usize,
    pub scene_number: Option<u32>,
    pub title: String,
    pub shot_description: String,
    pub shot_type: Option<String>,
    pub angle: Option<String>,
    pub dialogue: Option<String>,
    pub sound: Option<String>,
    /// Source text of the scene; internal only.
    pub raw_block: String,
    pub status: FrameStatus,
    pub image_url: Option<String>,
    pub image_prompt: Option<String>,
    pub error_message: Option<String>,
    /// Generation attempts made so far; internal only.
    pub attempt: u32,
    /// Last transient failure seen while retrying; internal only.
    pub last_retry_reason: Option<String>,
}

impl Frame {
    /// Build a `pending` frame for a parsed scene.
    pub fn from_scene(storyboard_id: &str, scene: &ScriptScene) -> Self {
        Self {
            id: types::frame_id(storyboard_id, scene.order),
            index: scene.order,
            scene_number: scene.scene_number,
            title: derive_title(&scene.shot_description, &scene.raw_block),
            shot_description: scene.shot_description.clone(),
            shot_type: scene.shot_type.clone(),
            angle: scene.angle.clone(),
            dialogue: scene.dialogue.clone(),
            sound: scene.sound.clone(),
            raw_block: scene.raw_block.clone(),
            status: FrameStatus::Pending,
            image_url: None,
            image_prompt: None,
            error_message: None,
            attempt: 0,
            last_retry_reason: None,
        }
    }

    /// Scene number shown to clients: the header number, else `index + 1`.
    pub fn display_scene(&self) -> u32 {
        self.scene_number.unwrap_or(self.index as u32 + 1)
    }

    /// Apply a worker transition, enforcing the frame state machine.
    pub fn apply(&mut self, transition: FrameTransition) -> Result<(), CoreError> {
        let to = transition.target();
        if !self.status.can_transition_to(to) {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to,
            });
        }

        match transition {
            FrameTransition::Start => {
                self.attempt = 1;
            }
            FrameTransition::Prompt { prompt } => {
                self.image_prompt = Some(prompt);
            }
            FrameTransition::Retry { reason } => {
                self.attempt += 1;
                self.last_retry_reason = Some(reason);
            }
            FrameTransition::Succeed { image_url } => {
                self.image_url = Some(image_url);
                self.error_message = None;
            }
            FrameTransition::Fail { message } => {
                self.error_message = Some(message);
            }
        }
        self.status = to;
        Ok(())
    }
}

/// Derive a short display title from a scene's description (or raw text).
///
/// Uses the first line, elided to [`MAX_FRAME_TITLE_CHARS`]; `"Untitled"`
/// when there is nothing to show.
pub fn derive_title(shot_description: &str, raw_block: &str) -> String {
    let source = if shot_description.trim().is_empty() {
        raw_block
    } else {
        shot_description
    };
    let first = source.trim().lines().next().unwrap_or("").trim();
    if first.is_empty() {
        return "Untitled".to_string();
    }
    if first.chars().count() > MAX_FRAME_TITLE_CHARS {
        let head: String = first.chars().take(MAX_FRAME_TITLE_CHARS - 3).collect();
        return format!("{head}…");
    }
    first.to_string()
}

// ---------------------------------------------------------------------------
// Storyboard record
// ---------------------------------------------------------------------------

/// Per-status frame counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub generating: usize,
    pub ready: usize,
    pub error: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.generating + self.ready + self.error
    }
}

/// The aggregate of all frames for one build request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryboardRecord {
    pub id: StoryboardId,
    pub title: Option<String>,
    pub project_id: Option<String>,
    pub aspect_ratio: String,
    pub style: String,
    /// Ordered by `index`.
    pub frames: Vec<Frame>,
    pub status: StoryboardStatus,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl StoryboardRecord {
    pub fn frame(&self, frame_id: &str) -> Option<&Frame> {
        self.frames.iter().find(|f| f.id == frame_id)
    }

    pub fn frame_mut(&mut self, frame_id: &str) -> Option<&mut Frame> {
        self.frames.iter_mut().find(|f| f.id == frame_id)
    }

    pub fn counts(&self) -> StatusCounts {
        self.frames
            .iter()
            .fold(StatusCounts::default(), |mut counts, frame| {
                match frame.status {
                    FrameStatus::Pending => counts.pending += 1,
                    FrameStatus::Generating => counts.generating += 1,
                    FrameStatus::Ready => counts.ready += 1,
                    FrameStatus::Error => counts.error += 1,
                }
                counts
            })
    }

    /// Move the record to its terminal status once every frame is terminal.
    ///
    /// Returns the new status, or `None` if frames are still in flight or
    /// the record was already finalised.
    pub fn finalize(&mut self, now: Timestamp) -> Option<StoryboardStatus> {
        if self.status.is_terminal() {
            return None;
        }
        let status = StoryboardStatus::aggregate(&self.frames)?;
        self.status = status;
        self.completed_at = Some(now);
        Some(status)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
