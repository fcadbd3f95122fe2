//! Script-to-scenes parser.
//!
//! Turns a free-form video script into an ordered list of [`ScriptScene`]s.
//! Parsing never fails: a script without any recognisable scene header
//! degrades to a single scene holding the whole (normalised) text.
//!
//! The work is split into three independently testable passes:
//!
//! 1. [`normalize`] strips carriage returns and markdown emphasis.
//! 2. [`boundary`] finds scene header lines using escalating tiers
//!    (primary, legacy, loose, generic).
//! 3. [`fields`] pulls labelled values (`Shot Description:`, `Dialogue:` ...)
//!    out of each scene's text span.
//!
//! Top-level title helpers live in [`title`].

pub mod boundary;
pub mod fields;
pub mod normalize;
pub mod title;

use serde::{Deserialize, Serialize};

pub use title::{extract_title, strip_title};

/// One scene block extracted from a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptScene {
    /// Dense 0-based position; equals the final frame index.
    pub order: usize,
    /// Number written in the scene header (`Scene 3:` -> 3), if any.
    pub scene_number: Option<u32>,
    /// The scene's full text span, trimmed.
    pub raw_block: String,
    /// Empty when the block carries no description label.
    pub shot_description: String,
    pub shot_type: Option<String>,
    pub angle: Option<String>,
    pub dialogue: Option<String>,
    pub sound: Option<String>,
}

/// Scene fields supplied by an external extractor for blocks the label
/// parser could not fully read. Blank values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneMetadata {
    pub shot_description: Option<String>,
    pub shot_type: Option<String>,
    pub dialogue: Option<String>,
    pub sound: Option<String>,
}

impl ScriptScene {
    /// `true` if any field shown on a frame card is missing.
    pub fn needs_metadata(&self) -> bool {
        self.shot_description.trim().is_empty()
            || self.shot_type.is_none()
            || self.dialogue.is_none()
            || self.sound.is_none()
    }

    /// Fill only the fields the parser left empty. Parsed values always win.
    pub fn fill_missing(&mut self, metadata: SceneMetadata) {
        if self.shot_description.trim().is_empty() {
            if let Some(description) = non_blank(metadata.shot_description) {
                self.shot_description = description;
            }
        }
        fill(&mut self.shot_type, metadata.shot_type);
        fill(&mut self.dialogue, metadata.dialogue);
        fill(&mut self.sound, metadata.sound);
    }

    /// The synthetic scene returned when no header is found anywhere.
    fn whole_script(text: String) -> Self {
        Self {
            order: 0,
            scene_number: None,
            raw_block: text,
            shot_description: String::new(),
            shot_type: None,
            angle: None,
            dialogue: None,
            sound: None,
        }
    }

    /// Build a scene from a header-delimited block.
    fn from_block(order: usize, scene_number: Option<u32>, block: &str) -> Self {
        let extracted = fields::SceneFields::extract(block);
        Self {
            order,
            scene_number,
            raw_block: block.to_string(),
            shot_description: extracted.shot_description.unwrap_or_default(),
            shot_type: extracted.shot_type,
            angle: extracted.angle,
            dialogue: extracted.dialogue,
            sound: extracted.sound,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = non_blank(value);
    }
}

/// Parse a raw script into ordered scenes.
///
/// Each scene spans from its header line up to the next header (or the end
/// of the text). Scenes never overlap and `order` is always `0..n`.
pub fn parse_script(raw: &str) -> Vec<ScriptScene> {
    let normalized = normalize::normalize(raw);
    let boundaries = boundary::detect(&normalized);

    if boundaries.is_empty() {
        return vec![ScriptScene::whole_script(normalized)];
    }

    boundaries
        .iter()
        .enumerate()
        .map(|(order, b)| {
            let end = boundaries
                .get(order + 1)
                .map_or(normalized.len(), |next| next.offset);
            let block = normalized[b.offset..end].trim();
            ScriptScene::from_block(order, b.scene_number, block)
        })
        .collect()
}
