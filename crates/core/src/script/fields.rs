//! Label-anchored field extraction within one scene block.
//!
//! A field starts at a line of the form `<Label>: value` (optionally
//! bulleted) and continues over following lines until the next line that
//! looks like a new label: an uppercase letter, at most 40 more characters
//! without a colon, then `:`.

/// Labels tried, in order, for the shot description.
pub const DESCRIPTION_LABELS: &[&str] = &["Shot Description", "Description"];

/// Labels tried, in order, for dialogue / voice-over.
pub const DIALOGUE_LABELS: &[&str] = &["Dialogue/VO", "Dialogue", "VO"];

pub const SHOT_LABEL: &str = "Shot";
pub const ANGLE_LABEL: &str = "Angle";
pub const SOUND_LABEL: &str = "Sound";

/// Longest label prefix (after the first letter) that still counts as a label line.
const MAX_LABEL_TAIL_CHARS: usize = 40;

/// The structured fields of a scene block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneFields {
    pub shot_description: Option<String>,
    pub shot_type: Option<String>,
    pub angle: Option<String>,
    pub dialogue: Option<String>,
    pub sound: Option<String>,
}

impl SceneFields {
    /// Extract every known field from `block`.
    pub fn extract(block: &str) -> Self {
        Self {
            shot_description: extract_first(DESCRIPTION_LABELS, block),
            shot_type: extract_field(SHOT_LABEL, block),
            angle: extract_field(ANGLE_LABEL, block),
            dialogue: extract_first(DIALOGUE_LABELS, block),
            sound: extract_field(SOUND_LABEL, block),
        }
    }
}

/// Try each label in order; the first non-empty hit wins.
pub fn extract_first(labels: &[&str], block: &str) -> Option<String> {
    labels.iter().find_map(|label| extract_field(label, block))
}

/// Extract the value of `label` from `block` (label match is case-insensitive).
///
/// Returns `None` when the label is absent or its value is blank.
pub fn extract_field(label: &str, block: &str) -> Option<String> {
    let lines: Vec<&str> = block.split('\n').collect();
    let (start, first) = lines
        .iter()
        .enumerate()
        .find_map(|(i, line)| value_after_label(label, line).map(|v| (i, v)))?;

    let mut value = String::from(first);
    for line in lines.iter().skip(start + 1) {
        if is_label_line(line) {
            break;
        }
        value.push('\n');
        value.push_str(line);
    }

    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// If `line` is `<label>:` (bullet and surrounding blanks allowed), return
/// the text after the colon.
fn value_after_label<'a>(label: &str, line: &'a str) -> Option<&'a str> {
    let line = strip_bullet(line);
    let head = line.get(..label.len())?;
    if !head.eq_ignore_ascii_case(label) {
        return None;
    }
    line[label.len()..].trim_start().strip_prefix(':')
}

/// Does this line open a new `Word:` label?
pub fn is_label_line(line: &str) -> bool {
    let line = strip_bullet(line);
    let mut chars = line.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_uppercase()) {
        return false;
    }
    chars.take(MAX_LABEL_TAIL_CHARS + 1).any(|c| c == ':')
}

fn strip_bullet(line: &str) -> &str {
    let line = line.trim_start();
    line.strip_prefix(['-', '*', '•'])
        .map_or(line, str::trim_start)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: &str = "Scene 2:\nShot Description: A hand places a bag.\nSunlight streams in.\nShot: Close-up\nAngle: Eye Level\nDialogue/VO: \"Not yet.\"\nSound: Piano";

    #[test]
    fn multi_line_value_stops_at_next_label() {
        assert_eq!(
            extract_field("Shot Description", BLOCK).as_deref(),
            Some("A hand places a bag.\nSunlight streams in.")
        );
    }

    #[test]
    fn shot_does_not_match_shot_description() {
        assert_eq!(extract_field("Shot", BLOCK).as_deref(), Some("Close-up"));
    }

    #[test]
    fn description_label_precedence() {
        let block = "Description: fallback\nShot Description: preferred";
        assert_eq!(
            extract_first(DESCRIPTION_LABELS, block).as_deref(),
            Some("preferred")
        );
        assert_eq!(
            extract_first(DESCRIPTION_LABELS, "Description: only one").as_deref(),
            Some("only one")
        );
    }

    #[test]
    fn dialogue_label_precedence() {
        assert_eq!(
            extract_first(DIALOGUE_LABELS, "VO: narrator\nDialogue: hero").as_deref(),
            Some("hero")
        );
        assert_eq!(
            extract_first(DIALOGUE_LABELS, "VO: narrator").as_deref(),
            Some("narrator")
        );
    }

    #[test]
    fn labels_are_case_insensitive_and_bullets_allowed() {
        assert_eq!(extract_field("Angle", "- angle : low").as_deref(), Some("low"));
    }

    #[test]
    fn blank_value_is_none() {
        assert_eq!(extract_field("Shot", "Shot:\nAngle: High"), None);
        assert_eq!(extract_field("Sound", "Shot: Wide"), None);
    }

    #[test]
    fn lowercase_lines_continue_the_value() {
        let block = "Sound: wind\nthen: silence\nAngle: Low";
        assert_eq!(extract_field("Sound", block).as_deref(), Some("wind\nthen: silence"));
    }

    #[test]
    fn long_prefixed_colon_line_is_not_a_label() {
        assert!(!is_label_line(
            "A very long sentence that goes on and on and on: with a colon"
        ));
        assert!(is_label_line("Camera Notes: handheld"));
    }

    #[test]
    fn extract_collects_all_fields() {
        let fields = SceneFields::extract(BLOCK);
        assert_eq!(fields.angle.as_deref(), Some("Eye Level"));
        assert_eq!(fields.dialogue.as_deref(), Some("\"Not yet.\""));
        assert_eq!(fields.sound.as_deref(), Some("Piano"));
    }
}
