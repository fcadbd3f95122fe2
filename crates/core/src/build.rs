//! Build request validation and resolution.
//!
//! A [`BuildRequest`] is what a client sends; [`BuildRequest::resolve`]
//! validates it, applies defaults and splits the top-level title off the
//! script, producing the [`BuildPlan`] the orchestrator works from.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::CoreError;
use crate::script::{extract_title, strip_title};

/// Aspect ratios accepted by the image backends.
pub const ASPECT_RATIOS: &[&str] = &["16:9", "4:3", "3:2", "2:3", "3:4", "9:16", "1:1"];

pub const DEFAULT_ASPECT_RATIO: &str = "16:9";
pub const DEFAULT_STYLE: &str = "Photorealistic";

// ---------------------------------------------------------------------------
// Process mode
// ---------------------------------------------------------------------------

/// How a storyboard's frames are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessMode {
    /// All frames run concurrently, bounded by the shared worker pool.
    #[default]
    Async,
    /// Frames run strictly one at a time in index order.
    Sequential,
}

impl ProcessMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Async => "async",
            Self::Sequential => "sequential",
        }
    }

    /// Parse a client-supplied mode. `sync` is accepted as an alias of
    /// `sequential`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "async" => Some(Self::Async),
            "sequential" | "sync" => Some(Self::Sequential),
            _ => None,
        }
    }
}

impl fmt::Display for ProcessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Client input for a storyboard build.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank"))]
    pub script: String,
    #[validate(custom(function = "validate_aspect_ratio"))]
    pub aspect_ratio: Option<String>,
    pub style: Option<String>,
    #[validate(custom(function = "validate_process_mode"))]
    pub process_mode: Option<String>,
    pub top_title: Option<String>,
    pub project_id: Option<String>,
}

/// Defaults applied to fields the client left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDefaults {
    pub style: String,
    pub aspect_ratio: String,
}

impl Default for BuildDefaults {
    fn default() -> Self {
        Self {
            style: DEFAULT_STYLE.to_string(),
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
        }
    }
}

/// A validated build with every default applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    /// Script body with the top-level title line removed.
    pub script: String,
    pub aspect_ratio: String,
    pub style: String,
    pub process_mode: ProcessMode,
    /// Explicit `topTitle`, else the title found in the script.
    pub title: Option<String>,
    pub project_id: Option<String>,
}

impl BuildRequest {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            ..Self::default()
        }
    }

    /// Validate the request and fill in defaults.
    pub fn resolve(self, defaults: &BuildDefaults) -> Result<BuildPlan, CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;

        let aspect_ratio = non_blank(self.aspect_ratio).unwrap_or_else(|| defaults.aspect_ratio.clone());
        validate_aspect_ratio(&aspect_ratio).map_err(|e| CoreError::Validation(e.to_string()))?;

        let process_mode = non_blank(self.process_mode)
            .and_then(|m| ProcessMode::parse(&m))
            .unwrap_or_default();

        let title = non_blank(self.top_title).or_else(|| extract_title(&self.script));

        Ok(BuildPlan {
            script: strip_title(&self.script),
            aspect_ratio,
            style: non_blank(self.style).unwrap_or_else(|| defaults.style.clone()),
            process_mode,
            title,
            project_id: non_blank(self.project_id),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Field validators
// ---------------------------------------------------------------------------

fn invalid(code: &'static str, message: String) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Owned(message))
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("blank", "script must not be empty".into()));
    }
    Ok(())
}

/// Accepts any entry of [`ASPECT_RATIOS`]; a blank value means "use default".
pub fn validate_aspect_ratio(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() || ASPECT_RATIOS.contains(&value) {
        return Ok(());
    }
    Err(invalid(
        "aspect_ratio",
        format!(
            "unsupported aspect ratio '{value}', expected one of: {}",
            ASPECT_RATIOS.join(", ")
        ),
    ))
}

fn validate_process_mode(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() || ProcessMode::parse(value).is_some() {
        return Ok(());
    }
    Err(invalid(
        "process_mode",
        format!("unknown process mode '{value}', expected 'async' or 'sequential'"),
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
