//! Markdown clean-up applied before any scene detection.

use std::sync::LazyLock;

use regex::Regex;

/// A bold, bracketed title line: `**[Title: Something]**`.
static BRACKET_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^[ \t]*\*\*\[Title:[ \t]*([^\]\n]+)\][ \t]*\*\*[ \t]*$").expect("valid regex")
});

/// Normalise a raw script.
///
/// - strips carriage returns,
/// - rewrites the first `**[Title: X]**` line as `Title: X`,
/// - removes every remaining `**` emphasis marker.
pub fn normalize(raw: &str) -> String {
    let text = raw.replace('\r', "");
    let text = BRACKET_TITLE_RE.replace(&text, |caps: &regex::Captures<'_>| {
        format!("Title: {}", caps[1].trim())
    });
    text.replace("**", "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_carriage_returns() {
        assert_eq!(normalize("a\r\nb\r\n"), "a\nb\n");
    }

    #[test]
    fn collapses_bracket_title() {
        assert_eq!(
            normalize("**[Title:  My Story ]**\n\nScene 1"),
            "Title: My Story\n\nScene 1"
        );
    }

    #[test]
    fn only_first_bracket_title_is_collapsed() {
        let out = normalize("**[Title: A]**\n**[Title: B]**");
        assert_eq!(out, "Title: A\n[Title: B]");
    }

    #[test]
    fn removes_bold_markers() {
        assert_eq!(normalize("**Scene 1:** **Shot:** Wide"), "Scene 1: Shot: Wide");
    }

    #[test]
    fn leaves_single_asterisks() {
        assert_eq!(normalize("* bullet *"), "* bullet *");
    }
}
