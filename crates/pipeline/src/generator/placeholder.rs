//! Offline generator that returns placeholder image URLs.
//!
//! Used when no image service is configured. The URL's size follows the
//! requested aspect ratio and its caption is the start of the prompt.

use async_trait::async_trait;
use boardwright_core::generation::{GenerationFailure, GenerationRequest, ImageGenerator};

const PLACEHOLDER_BASE_URL: &str = "https://placehold.co";

/// Length of the longer image side.
const LONG_SIDE_PX: u32 = 1280;

/// Prompt characters shown on the placeholder.
const CAPTION_CHARS: usize = 40;

#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderGenerator;

impl PlaceholderGenerator {
    /// Placeholder dimensions for an `W:H` ratio; unparsable ratios fall
    /// back to 16:9.
    pub fn dimensions(aspect_ratio: &str) -> (u32, u32) {
        let parsed = aspect_ratio
            .split_once(':')
            .and_then(|(w, h)| Some((w.trim().parse::<u32>().ok()?, h.trim().parse::<u32>().ok()?)))
            .filter(|(w, h)| *w > 0 && *h > 0);
        let (w, h) = parsed.unwrap_or((16, 9));
        if w >= h {
            (LONG_SIDE_PX, LONG_SIDE_PX * h / w)
        } else {
            (LONG_SIDE_PX * w / h, LONG_SIDE_PX)
        }
    }
}

#[async_trait]
impl ImageGenerator for PlaceholderGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationFailure> {
        let (width, height) = Self::dimensions(&request.aspect_ratio);
        let caption: String = request.prompt.chars().take(CAPTION_CHARS).collect();
        let url = reqwest::Url::parse_with_params(
            &format!("{PLACEHOLDER_BASE_URL}/{width}x{height}"),
            &[("text", caption.trim())],
        )
        .map_err(|e| GenerationFailure::InvalidInput(e.to_string()))?;
        Ok(url.into())
    }
}
