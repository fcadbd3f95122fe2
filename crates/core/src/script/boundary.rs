//! Scene-boundary detection.
//!
//! A line scanner that classifies each line of a normalised script against
//! four escalating tiers. The first tier is strict; the later ones only run
//! when the stricter tiers found at most one header, and their hits are
//! merged into the existing set by line offset.
//!
//! | Tier      | Accepts                                                        |
//! |-----------|----------------------------------------------------------------|
//! | Primary   | `Scene`, `SCENE` or `씬` at line start, optional `:#-` + number |
//! | Legacy    | `scene<ws>*<digits>` at column 0, any case                      |
//! | Loose     | keyword + number up to 30 chars into the line, any case         |
//! | Generic   | keyword as a whole word at line start, any case                 |

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Latin keyword, matched exactly by the primary tier (`Scene` / `SCENE`).
const LATIN_KEYWORD: &str = "Scene";

/// Korean keyword for "scene".
const KOREAN_KEYWORD: &str = "씬";

/// Maximum number of characters of leading junk tolerated by the loose tier.
pub const LOOSE_PREFIX_MAX_CHARS: usize = 30;

/// Header separators accepted between the keyword and the number.
const SEPARATORS: [char; 3] = [':', '#', '-'];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which detection tier produced a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Primary,
    Legacy,
    Loose,
    Generic,
}

/// The start of a scene: byte offset of its header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    pub offset: usize,
    pub scene_number: Option<u32>,
    pub tier: Tier,
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Detect scene boundaries, escalating through the tiers.
///
/// Returned boundaries are sorted by offset and unique per offset.
pub fn detect(text: &str) -> Vec<Boundary> {
    let mut found = primary(text);
    if found.is_empty() {
        found = legacy(text);
    }
    if found.len() <= 1 {
        let loose_hits = loose(text);
        if loose_hits.len() > 1 {
            merge(&mut found, loose_hits);
        }
    }
    if found.len() <= 1 {
        let generic_hits = generic(text);
        if generic_hits.len() > 1 {
            merge(&mut found, generic_hits);
        }
    }
    found
}

/// Strict headers: `Scene 1:`, `SCENE #2`, `Scene-3 Title`, `씬 4`.
pub fn primary(text: &str) -> Vec<Boundary> {
    scan(text, Tier::Primary, is_primary_header)
}

/// `scene 12 ...` at the very start of a line, any case.
pub fn legacy(text: &str) -> Vec<Boundary> {
    scan(text, Tier::Legacy, is_legacy_header)
}

/// A numbered keyword anywhere within the first 30 characters of a line.
pub fn loose(text: &str) -> Vec<Boundary> {
    scan(text, Tier::Loose, is_loose_header)
}

/// The keyword as a whole word at line start, number optional.
pub fn generic(text: &str) -> Vec<Boundary> {
    scan(text, Tier::Generic, is_generic_header)
}

/// Whether a single line would be taken as a scene header by any tier that
/// anchors at line start.
pub fn is_scene_header(line: &str) -> bool {
    is_primary_header(line) || is_legacy_header(line) || is_generic_header(line)
}

/// Merge `extra` into `found`, skipping offsets already present, then re-sort.
fn merge(found: &mut Vec<Boundary>, extra: Vec<Boundary>) {
    for boundary in extra {
        if !found.iter().any(|b| b.offset == boundary.offset) {
            found.push(boundary);
        }
    }
    found.sort_by_key(|b| b.offset);
}

fn scan(text: &str, tier: Tier, accepts: fn(&str) -> bool) -> Vec<Boundary> {
    let mut offset = 0;
    let mut out = Vec::new();
    for line in text.split('\n') {
        if accepts(line) {
            out.push(Boundary {
                offset,
                scene_number: scene_number(line),
                tier,
            });
        }
        offset += line.len() + 1;
    }
    out
}

// ---------------------------------------------------------------------------
// Line predicates
// ---------------------------------------------------------------------------

fn is_primary_header(line: &str) -> bool {
    let line = line.trim_start();
    if let Some(rest) = line
        .strip_prefix(LATIN_KEYWORD)
        .or_else(|| line.strip_prefix("SCENE"))
    {
        return latin_tail_ok(rest);
    }
    line.strip_prefix(KOREAN_KEYWORD).is_some_and(korean_tail_ok)
}

fn is_legacy_header(line: &str) -> bool {
    strip_latin_keyword_ci(line)
        .map(|rest| rest.trim_start())
        .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
}

fn is_loose_header(line: &str) -> bool {
    let line = line.trim_start();
    line.char_indices()
        .take(LOOSE_PREFIX_MAX_CHARS + 1)
        .any(|(at, _)| strip_keyword_ci(&line[at..]).is_some_and(numbered_tail))
}

fn is_generic_header(line: &str) -> bool {
    let line = line.trim_start();
    if let Some(rest) = strip_latin_keyword_ci(line) {
        return rest.chars().next().map_or(true, |c| !is_word_char(c));
    }
    line.strip_prefix(KOREAN_KEYWORD).is_some_and(korean_tail_ok)
}

/// Tail rule after `Scene`: a word boundary must follow, either directly or
/// after a run of digits (`Scene1` is a header, `Scenery` is not).
fn latin_tail_ok(rest: &str) -> bool {
    match rest.chars().next() {
        None => true,
        Some(c) if !is_word_char(c) => true,
        Some(_) => {
            let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            digits > 0 && rest[digits..].chars().next().map_or(true, |c| !is_word_char(c))
        }
    }
}

/// Tail rule after `씬`: something word-like must follow the optional
/// separator (`씬 1`, `씬#2`).
fn korean_tail_ok(rest: &str) -> bool {
    let rest = rest.trim_start();
    let rest = rest.strip_prefix(SEPARATORS).unwrap_or(rest).trim_start();
    rest.chars().next().is_some_and(is_word_char)
}

/// `<ws>* #? <ws>* <digit>` right after the keyword.
fn numbered_tail(rest: &str) -> bool {
    header_number_digits(rest).is_some()
}

// ---------------------------------------------------------------------------
// Scene numbers
// ---------------------------------------------------------------------------

/// Extract the number following the first keyword on a header line.
///
/// Accepts `Scene 3`, `scene #3`, `씬3`; separators other than `#` between
/// keyword and number are not part of the number pattern.
pub fn scene_number(line: &str) -> Option<u32> {
    line.char_indices()
        .filter_map(|(at, _)| strip_keyword_ci(&line[at..]))
        .find_map(header_number_digits)
        .and_then(|digits| digits.parse().ok())
}

fn header_number_digits(rest: &str) -> Option<&str> {
    let rest = rest.trim_start();
    let rest = rest.strip_prefix('#').unwrap_or(rest).trim_start();
    let len = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    (len > 0).then(|| &rest[..len])
}

// ---------------------------------------------------------------------------
// Keyword helpers
// ---------------------------------------------------------------------------

fn strip_latin_keyword_ci(s: &str) -> Option<&str> {
    let head = s.get(..LATIN_KEYWORD.len())?;
    head.eq_ignore_ascii_case(LATIN_KEYWORD)
        .then(|| &s[LATIN_KEYWORD.len()..])
}

fn strip_keyword_ci(s: &str) -> Option<&str> {
    strip_latin_keyword_ci(s).or_else(|| s.strip_prefix(KOREAN_KEYWORD))
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
