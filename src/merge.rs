//! Reintegration of partial model output into the full document.
//!
//! Policy, in priority order:
//! 1. Selection scope: replace the first literal occurrence of the selection.
//! 2. Selection scope, no literal match: match the selection line by line
//!    ignoring indentation and trailing whitespace, and replace that range.
//! 3. Window scope: replace exactly the window's line range. This also covers
//!    a selection too large for the budget, since the model only saw the window.
//! 4. Otherwise the output becomes the whole document (`Unanchored`).
//!
//! Merging never fails. Callers treat `Unanchored` results as high risk.

use crate::context::{CodeContext, ContextScope, ContextWindow};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, warn};

static WINDOW_HEADER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\[lipcoder: partial view, lines \d+-\d+ of \d+ total lines\]\s*$").unwrap()
});

/// How a model response was placed into the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeOutcome {
    /// The response was already the complete document.
    #[default]
    FullDocument,
    /// Literal selection match.
    Selection,
    /// Whitespace-tolerant selection match.
    SelectionRelaxed,
    /// Window line range replaced.
    Window,
    /// No anchor found; the response replaced the whole document.
    Unanchored,
}

impl MergeOutcome {
    /// Whether unrelated parts of the document may have been lost.
    pub fn is_high_risk(&self) -> bool {
        matches!(self, Self::Unanchored)
    }
}

impl fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::FullDocument => "full document",
            Self::Selection => "selection",
            Self::SelectionRelaxed => "selection (relaxed match)",
            Self::Window => "line window",
            Self::Unanchored => "unanchored",
        };
        write!(f, "{}", s)
    }
}

/// A merged document and how it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    pub text: String,
    pub outcome: MergeOutcome,
}

/// Places partial model output back into the original document.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialMergeEngine;

impl PartialMergeEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn merge(
        &self,
        original: &str,
        output: &str,
        context: &CodeContext,
        window: &ContextWindow,
    ) -> MergeResult {
        if window.scope == ContextScope::Selection && context.has_selection() {
            let selection = context.selected_text.as_str();
            let replacement = match_trailing_newline(selection, output);

            if let Some(pos) = original.find(selection) {
                debug!(offset = pos, "selection found verbatim");
                let mut text = String::with_capacity(original.len() + replacement.len());
                text.push_str(&original[..pos]);
                text.push_str(&replacement);
                text.push_str(&original[pos + selection.len()..]);
                return MergeResult {
                    text,
                    outcome: MergeOutcome::Selection,
                };
            }

            if let Some((start, end)) = find_relaxed(original, selection) {
                debug!(start_line = start, end_line = end, "selection found with relaxed matching");
                return MergeResult {
                    text: splice_lines(original, start, end, output),
                    outcome: MergeOutcome::SelectionRelaxed,
                };
            }
        }

        if let ContextScope::Window {
            start_line,
            end_line,
            total_lines,
        } = window.scope
        {
            let line_count = original.split_inclusive('\n').count();
            if line_count == total_lines && end_line < line_count {
                let body = strip_window_header(output);
                return MergeResult {
                    text: splice_lines(original, start_line, end_line, body),
                    outcome: MergeOutcome::Window,
                };
            }
        }

        warn!(
            scope = ?window.scope,
            "partial output could not be anchored; using it as the whole document"
        );
        MergeResult {
            text: output.to_string(),
            outcome: MergeOutcome::Unanchored,
        }
    }
}

/// Give `text` the same run of trailing line breaks as `reference`.
pub fn match_trailing_newline(reference: &str, text: &str) -> String {
    let trimmed = text.trim_end_matches(['\n', '\r']);
    let tail = &reference[reference.trim_end_matches(['\n', '\r']).len()..];
    let breaks = tail.matches('\n').count();
    let line_break = if tail.ends_with("\r\n") { "\r\n" } else { "\n" };
    format!("{}{}", trimmed, line_break.repeat(breaks))
}

fn strip_window_header(output: &str) -> &str {
    match output.split_once('\n') {
        Some((first, rest)) if WINDOW_HEADER_REGEX.is_match(first) => rest,
        None if WINDOW_HEADER_REGEX.is_match(output) => "",
        _ => output,
    }
}

/// Replace lines `start..=end` (0-based) of `original` with `replacement`.
fn splice_lines(original: &str, start: usize, end: usize, replacement: &str) -> String {
    let segments: Vec<&str> = original.split_inclusive('\n').collect();
    let replaced: String = segments[start..=end].concat();

    let mut text = segments[..start].concat();
    text.push_str(&match_trailing_newline(&replaced, replacement));
    text.push_str(&segments[end + 1..].concat());
    text
}

/// Locate `selection` in `original` comparing trimmed lines.
fn find_relaxed(original: &str, selection: &str) -> Option<(usize, usize)> {
    let wanted: Vec<&str> = selection.lines().map(str::trim).collect();
    let first = wanted.iter().position(|l| !l.is_empty())?;
    let last = wanted.iter().rposition(|l| !l.is_empty())?;
    let wanted = &wanted[first..=last];

    let lines: Vec<&str> = original.lines().map(str::trim).collect();
    if wanted.len() > lines.len() {
        return None;
    }
    (0..=lines.len() - wanted.len())
        .find(|&start| lines[start..start + wanted.len()] == *wanted)
        .map(|start| (start, start + wanted.len() - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{Cursor, Selection};

    fn context(original: &str, selection: &str) -> CodeContext {
        let selection = Selection {
            text: selection.to_string(),
            ..Selection::default()
        };
        CodeContext::from_document(original, &selection, Cursor::default(), 500)
    }

    fn selection_window(text: &str) -> ContextWindow {
        ContextWindow {
            text: text.to_string(),
            is_partial: false,
            scope: ContextScope::Selection,
        }
    }

    #[test]
    fn test_selection_replaced_verbatim() {
        let original = "a = 1\nb = 2\nc = 3\n";
        let ctx = context(original, "b = 2\n");
        let merged = PartialMergeEngine::new().merge(original, "b = 20", &ctx, &selection_window("b = 2\n"));
        assert_eq!(merged.text, "a = 1\nb = 20\nc = 3\n");
        assert_eq!(merged.outcome, MergeOutcome::Selection);
    }

    #[test]
    fn test_only_first_occurrence_replaced() {
        let original = "x = 1\nx = 1\n";
        let ctx = context(original, "x = 1\n");
        let merged = PartialMergeEngine::new().merge(original, "x = 2\n", &ctx, &selection_window("x = 1\n"));
        assert_eq!(merged.text, "x = 2\nx = 1\n");
    }

    #[test]
    fn test_relaxed_match_when_whitespace_differs() {
        let original = "def f():\n    a = 1\n    b = 2\n\nprint(f())\n";
        let ctx = context(original, "a = 1\n  b = 2");
        let merged = PartialMergeEngine::new().merge(
            original,
            "    a = 10\n    b = 20",
            &ctx,
            &selection_window("a = 1\n  b = 2"),
        );
        assert_eq!(merged.text, "def f():\n    a = 10\n    b = 20\n\nprint(f())\n");
        assert_eq!(merged.outcome, MergeOutcome::SelectionRelaxed);
    }

    #[test]
    fn test_window_replaces_line_range_and_drops_header() {
        let original = "l0\nl1\nl2\nl3\nl4\n";
        let window = ContextWindow {
            text: "[lipcoder: partial view, lines 2-3 of 5 total lines]\nl1\nl2\n".to_string(),
            is_partial: true,
            scope: ContextScope::Window {
                start_line: 1,
                end_line: 2,
                total_lines: 5,
            },
        };
        let ctx = context(original, "");
        let output = "[lipcoder: partial view, lines 2-3 of 5 total lines]\nL1\nL2";
        let merged = PartialMergeEngine::new().merge(original, output, &ctx, &window);
        assert_eq!(merged.text, "l0\nL1\nL2\nl3\nl4\n");
        assert_eq!(merged.outcome, MergeOutcome::Window);
    }

    #[test]
    fn test_window_stale_document_is_unanchored() {
        let original = "l0\nl1\n";
        let window = ContextWindow {
            text: String::new(),
            is_partial: true,
            scope: ContextScope::Window {
                start_line: 5,
                end_line: 8,
                total_lines: 10,
            },
        };
        let merged = PartialMergeEngine::new().merge(original, "new", &context(original, ""), &window);
        assert_eq!(merged.text, "new");
        assert!(merged.outcome.is_high_risk());
    }

    #[test]
    fn test_unfound_selection_falls_back_to_output() {
        let original = "a = 1\n";
        let ctx = context(original, "zzz");
        let merged = PartialMergeEngine::new().merge(original, "q = 9", &ctx, &selection_window("zzz"));
        assert_eq!(merged.text, "q = 9");
        assert_eq!(merged.outcome, MergeOutcome::Unanchored);
    }

    #[test]
    fn test_match_trailing_newline() {
        assert_eq!(match_trailing_newline("a\n", "b"), "b\n");
        assert_eq!(match_trailing_newline("a", "b\n\n"), "b");
        assert_eq!(match_trailing_newline("a\r\n", "b"), "b\r\n");
        assert_eq!(match_trailing_newline("x = 1\n\n\n", "x = 1\n"), "x = 1\n\n\n");
        assert_eq!(match_trailing_newline("x = 1\n", "x = 2\n\n"), "x = 2\n");
    }

    #[test]
    fn test_oversized_selection_merges_into_window_range() {
        let original: String = (0..10).map(|i| format!("l{}\n", i)).collect();
        // lines 0..=6 selected, but only lines 2..=4 were sent
        let selected: String = (0..7).map(|i| format!("l{}\n", i)).collect();
        let ctx = context(&original, &selected);
        let window = ContextWindow {
            text: "[lipcoder: partial view, lines 3-5 of 10 total lines]\nl2\nl3\nl4\n".to_string(),
            is_partial: true,
            scope: ContextScope::Window {
                start_line: 2,
                end_line: 4,
                total_lines: 10,
            },
        };
        let output = "[lipcoder: partial view, lines 3-5 of 10 total lines]\nl2\nL3\nl4\n";

        let merged = PartialMergeEngine::new().merge(&original, output, &ctx, &window);
        assert_eq!(merged.outcome, MergeOutcome::Window);
        assert_eq!(merged.text, original.replace("l3\n", "L3\n"));
        assert!(!merged.text.contains("[lipcoder:"));
    }
}
