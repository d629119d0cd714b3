//! `[METAID:<id>]` marker parsing.
//!
//! The agent embeds out-of-band references in its reply text. [`strip`]
//! removes them (together with any bullet or dash run that introduced them)
//! and returns the referenced ids in order. It is pure and holds no state
//! between calls: streaming callers re-run it over the whole cumulative
//! buffer, which also handles markers split across chunks.

use std::sync::OnceLock;

use regex::Regex;

/// Opening of every marker.
pub const MARKER_OPEN: &str = "[METAID:";

static MARKER_REGEX: OnceLock<Regex> = OnceLock::new();

/// Characters allowed in the run directly before a marker, removed with it.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '*' | '•' | '·' | '‣' | '◦' | '▪' | '–' | '—')
}

fn marker_regex() -> &'static Regex {
    MARKER_REGEX.get_or_init(|| {
        Regex::new(r"[\s\-*•·‣◦▪–—]*\[METAID:([^\[\]]+)\]").expect("marker pattern is valid")
    })
}

/// Result of stripping markers from a piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stripped {
    pub display_text: String,
    /// Marker ids in order of appearance, duplicates kept.
    pub reference_ids: Vec<String>,
}

/// Remove every complete marker from `raw` and collect the ids.
///
/// An incomplete marker at the end of `raw` is left in place; it is
/// removed by a later call once the rest of it has arrived.
pub fn strip(raw: &str) -> Stripped {
    let re = marker_regex();
    let reference_ids = re
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect();
    let display_text = re.replace_all(raw, "").into_owned();

    Stripped {
        display_text,
        reference_ids,
    }
}

/// Length of the prefix of `display_text` that no later chunk can change.
///
/// Excludes a trailing partial marker (e.g. `"[MET"`) and the separator run
/// before it, since both disappear if the marker completes. Used by
/// renderers that can only append.
pub fn stable_prefix_len(display_text: &str) -> usize {
    let mut end = display_text.len();
    if let Some(start) = display_text.rfind('[') {
        if is_partial_marker(&display_text[start..]) {
            end = start;
        }
    }
    display_text[..end].trim_end_matches(is_separator).len()
}

fn is_partial_marker(tail: &str) -> bool {
    if tail.len() <= MARKER_OPEN.len() {
        MARKER_OPEN.starts_with(tail)
    } else {
        tail.starts_with(MARKER_OPEN) && !tail.contains(']')
    }
}
