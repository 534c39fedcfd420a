//! Extraction of `<think>...</think>` reasoning segments from model output.

use regex::Regex;
use std::sync::LazyLock;

static THINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>(.*?)</think>").expect("Invalid reasoning regex"));

/// Model output split into the part shown to the user and the hidden reasoning.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub visible: String,
    pub reasoning: Option<String>,
}

/// Split reasoning segments out of raw model output.
///
/// When at least one marker pair is present, every segment is removed and
/// the remainder is trimmed; the first segment's trimmed body is returned as
/// the reasoning (`None` if it is blank). Removal repeats until no pair is
/// left, since cutting one segment can splice its neighbours into another.
/// Without markers the raw text is returned untouched.
pub fn extract_reasoning(raw: &str) -> Extracted {
    let Some(caps) = THINK_RE.captures(raw) else {
        return Extracted {
            visible: raw.to_string(),
            reasoning: None,
        };
    };

    let reasoning = caps
        .get(1)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty());
    let mut visible = THINK_RE.replace_all(raw, "").into_owned();
    while THINK_RE.is_match(&visible) {
        visible = THINK_RE.replace_all(&visible, "").into_owned();
    }
    let visible = visible.trim().to_string();

    Extracted { visible, reasoning }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_leading_segment() {
        let out = extract_reasoning(
            "<think>checking policy</think>Float requests require manager approval.",
        );
        assert_eq!(out.visible, "Float requests require manager approval.");
        assert_eq!(out.reasoning.as_deref(), Some("checking policy"));
    }

    #[test]
    fn test_no_markers_returns_raw_unchanged() {
        let raw = "  Plain answer with padding  ";
        let out = extract_reasoning(raw);
        assert_eq!(out.visible, raw);
        assert!(out.reasoning.is_none());
    }

    #[test]
    fn test_idempotent_on_stripped_output() {
        let once = extract_reasoning("<think>a</think>\nAnswer here.");
        let twice = extract_reasoning(&once.visible);
        assert_eq!(once.visible, twice.visible);
        assert!(twice.reasoning.is_none());
    }

    #[test]
    fn test_spliced_markers_are_stripped_too() {
        let once = extract_reasoning("<thi<think>x</think>nk>secret</think>Answer");
        assert_eq!(once.visible, "Answer");
        assert_eq!(once.reasoning.as_deref(), Some("x"));

        let twice = extract_reasoning(&once.visible);
        assert_eq!(once.visible, twice.visible);
        assert!(twice.reasoning.is_none());
    }

    #[test]
    fn test_multiline_reasoning() {
        let out = extract_reasoning("<think>\nline one\nline two\n</think>\n\nDone.");
        assert_eq!(out.reasoning.as_deref(), Some("line one\nline two"));
        assert_eq!(out.visible, "Done.");
    }

    #[test]
    fn test_multiple_segments_all_removed_first_kept() {
        let out = extract_reasoning("<think>one</think>Hello <think>two</think>world");
        assert_eq!(out.reasoning.as_deref(), Some("one"));
        assert_eq!(out.visible, "Hello world");
    }

    #[test]
    fn test_empty_segment_is_removed_without_reasoning() {
        let out = extract_reasoning("<think></think>Answer");
        assert_eq!(out.visible, "Answer");
        assert!(out.reasoning.is_none());
    }

    #[test]
    fn test_unclosed_marker_left_alone() {
        let raw = "<think>never closed. Answer";
        let out = extract_reasoning(raw);
        assert_eq!(out.visible, raw);
        assert!(out.reasoning.is_none());
    }
}
