//! Top-level script title helpers.
//!
//! A script may open with a title line (`Title: X`, `**Title: X**`,
//! `**[Title: X]**`, `[Title]: X`). The title is global to the storyboard,
//! so it is pulled out before scene parsing and never attached to a scene.
//! Only the preamble (lines before the first scene header) is searched.

use std::sync::LazyLock;

use regex::Regex;

use super::boundary::is_scene_header;
use super::normalize::normalize;

/// `[Title: X]`: the closing bracket belongs to the markup.
static BRACKETED_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[ \t]*\[[ \t]*Title[ \t]*:[ \t]*(.*?)[ \t]*\][ \t]*$").expect("valid regex")
});

/// `Title: X` or `[Title]: X`: everything after the colon is the title.
static LABEL_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[ \t]*(?:\[Title\]|Title)[ \t]*:[ \t]*(.*?)[ \t]*$").expect("valid regex")
});

/// Find the script's top-level title, if any.
pub fn extract_title(raw: &str) -> Option<String> {
    let normalized = normalize(raw);
    let title = preamble(&normalized).find_map(title_of_line);
    title
}

/// Remove the first title line from the preamble, plus any blank lines it
/// leaves at the top of the script.
pub fn strip_title(raw: &str) -> String {
    let lines: Vec<&str> = raw.split('\n').collect();
    let title_at = lines
        .iter()
        .take_while(|line| !is_scene_header(&clean_line(line)))
        .position(|line| title_of_line(&clean_line(line)).is_some());

    let Some(title_at) = title_at else {
        return raw.to_string();
    };

    let kept: Vec<&str> = lines
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != title_at)
        .map(|(_, line)| *line)
        .collect();
    kept.join("\n")
        .trim_start_matches(['\n', '\r'])
        .to_string()
}

fn preamble(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').take_while(|line| !is_scene_header(line))
}

fn title_of_line(line: &str) -> Option<String> {
    let caps = BRACKETED_TITLE_RE
        .captures(line)
        .or_else(|| LABEL_TITLE_RE.captures(line))?;
    let title = caps[1].trim();
    (!title.is_empty()).then(|| title.to_string())
}

fn clean_line(line: &str) -> String {
    line.replace('\r', "").replace("**", "")
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- extract_title -------------------------------------------------------

    #[test]
    fn title_variants() {
        assert_eq!(extract_title("Title: Plain").as_deref(), Some("Plain"));
        assert_eq!(extract_title("**Title: Bold**").as_deref(), Some("Bold"));
        assert_eq!(extract_title("**[Title: Bracketed]**").as_deref(), Some("Bracketed"));
        assert_eq!(extract_title("[Title]: Label").as_deref(), Some("Label"));
        assert_eq!(extract_title("title:   lower  ").as_deref(), Some("lower"));
    }

    #[test]
    fn trailing_bracket_in_title_is_kept() {
        let raw = "Title: Episode [Part 1]\n\nScene 1:\nDescription: a";
        assert_eq!(extract_title(raw).as_deref(), Some("Episode [Part 1]"));
        assert_eq!(extract_title("[Title: Pilot [Cut 2]]").as_deref(), Some("Pilot [Cut 2]"));
        assert_eq!(strip_title(raw), "Scene 1:\nDescription: a");
    }

    #[test]
    fn no_title_is_none() {
        assert_eq!(extract_title("Scene 1:\nDescription: x"), None);
        assert_eq!(extract_title("Title:   "), None);
    }

    #[test]
    fn scene_level_title_fields_are_ignored() {
        let raw = "Scene 1:\nTitle: Opening\nDescription: x\n\nScene 2:\nDescription: y";
        assert_eq!(extract_title(raw), None);
    }

    // -- strip_title ---------------------------------------------------------

    #[test]
    fn strips_bracket_title_and_leading_blank_lines() {
        let raw = "**[Title: Story]**\n\n**Scene 1:**\nDescription: x";
        assert_eq!(strip_title(raw), "**Scene 1:**\nDescription: x");
    }

    #[test]
    fn strip_without_title_is_identity() {
        let raw = "Scene 1:\nDescription: x";
        assert_eq!(strip_title(raw), raw);
    }

    #[test]
    fn strip_keeps_scene_level_title_lines() {
        let raw = "Scene 1:\nTitle: Opening";
        assert_eq!(strip_title(raw), raw);
    }
}
