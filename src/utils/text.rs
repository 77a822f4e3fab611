//! Small text helpers shared by the adapters.

use regex::Regex;
use std::sync::OnceLock;

static MARKUP: OnceLock<Regex> = OnceLock::new();

/// Display string for an author list: the first three names joined by ", ",
/// followed by " et al." only when more than three authors exist.
pub fn author_list(authors: &[String]) -> String {
    let mut list = authors
        .iter()
        .take(3)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if authors.len() > 3 {
        list.push_str(" et al.");
    }
    list
}

/// Truncate to `max` characters, appending "..." when anything was cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Collapse runs of whitespace (including newlines) into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove XML/HTML tags (CrossRef abstracts are JATS fragments).
pub fn strip_markup(text: &str) -> String {
    let re = MARKUP.get_or_init(|| Regex::new(r"<[^>]+>").expect("static regex"));
    collapse_whitespace(&re.replace_all(text, " "))
}
