//! Image prompt construction.
//!
//! A frame's prompt is built in two steps: the scene text is *enhanced*
//! (by an external [`PromptEnhancer`](crate::generation::PromptEnhancer) or
//! by [`template_enhance`]) and then combined with the shot type, style and
//! aspect ratio by [`build_image_prompt`].

use crate::frame::Frame;

/// Subject used when a frame carries no usable text at all.
pub const FALLBACK_PROMPT: &str = "cinematic frame";

/// Base texts shorter than this get the "detailed" template.
const SHORT_BASE_CHARS: usize = 20;

/// Text a prompt is derived from: the shot description, else the raw block.
pub fn prompt_base(frame: &Frame) -> &str {
    let description = frame.shot_description.trim();
    if description.is_empty() {
        frame.raw_block.trim()
    } else {
        description
    }
}

/// Deterministic enhancement used when no external enhancer is configured
/// or the enhancer fails.
pub fn template_enhance(base: &str, style: &str) -> String {
    let base = base.trim();
    if base.chars().count() < SHORT_BASE_CHARS {
        format!("{base} – detailed {style} cinematic focus")
    } else {
        format!("{base} – refined {style} mood lighting")
    }
}

/// Join enhanced text, shot type, style and aspect ratio into the final
/// prompt sent to the image generator. Blank parts are skipped and a blank
/// subject becomes [`FALLBACK_PROMPT`].
pub fn build_image_prompt(
    enhanced: &str,
    shot_type: Option<&str>,
    style: &str,
    aspect_ratio: &str,
) -> String {
    let subject = match enhanced.trim() {
        "" => FALLBACK_PROMPT,
        text => text,
    };
    let aspect = match aspect_ratio.trim() {
        "" => String::new(),
        ratio => format!("aspect {ratio}"),
    };
    [Some(subject), shot_type, Some(style), Some(aspect.as_str())]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parse_script;

    #[test]
    fn short_and_long_templates() {
        assert_eq!(
            template_enhance("A cat", "Anime"),
            "A cat – detailed Anime cinematic focus"
        );
        assert_eq!(
            template_enhance("A long shot of the harbour at dawn", "Noir"),
            "A long shot of the harbour at dawn – refined Noir mood lighting"
        );
    }

    #[test]
    fn prompt_joins_parts_in_order() {
        assert_eq!(
            build_image_prompt("a pier", Some("Wide"), "Photorealistic", "16:9"),
            "a pier, Wide, Photorealistic, aspect 16:9"
        );
        assert_eq!(
            build_image_prompt("a pier", None, "Photorealistic", "1:1"),
            "a pier, Photorealistic, aspect 1:1"
        );
    }

    #[test]
    fn blank_parts_are_skipped() {
        assert_eq!(
            build_image_prompt("  ", Some(""), "Sketch", "4:3"),
            "cinematic frame, Sketch, aspect 4:3"
        );
    }

    #[test]
    fn prompt_base_falls_back_to_raw_block() {
        let scenes = parse_script("Scene 1:\nJust some words");
        let frame = Frame::from_scene("sb", &scenes[0]);
        assert_eq!(prompt_base(&frame), "Scene 1:\nJust some words");
    }
}
