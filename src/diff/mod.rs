//! Line diff and change classification.
//!
//! [`DiffAnalyzer::analyze`] runs an LCS line diff over the original and
//! modified texts, materializes one [`CodeChangeLine`] per added or removed
//! line, and classifies the change from the added lines plus the instruction.

mod patterns;
mod summary;

pub use patterns::{
    Declaration, DeclarationMatch, QualityMarker, is_test_instruction, match_declaration,
    match_quality,
};
pub use summary::AddedFeatures;

use crate::merge::MergeOutcome;
use serde::{Deserialize, Serialize};
use similar::{Algorithm, ChangeTag, TextDiff};
use std::fmt;
use tracing::debug;

/// Both counts must exceed this for a change to be a full rewrite.
pub const FULL_REWRITE_THRESHOLD: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeLineKind {
    Added,
    Removed,
}

/// One added or removed line.
///
/// `line_number` is 1-based, in the modified numbering for additions and the
/// original numbering for removals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChangeLine {
    pub line_number: usize,
    pub original_text: String,
    pub modified_text: String,
    pub kind: ChangeLineKind,
}

/// Coarse classification of a transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    FullRewrite,
    PartialModification,
    Addition,
    TestAddition,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::FullRewrite => "full rewrite",
            Self::PartialModification => "partial modification",
            Self::Addition => "addition",
            Self::TestAddition => "test addition",
        };
        write!(f, "{}", s)
    }
}

/// The analyzed difference between an original and a modified text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformResult {
    pub changes: Vec<CodeChangeLine>,
    pub summary: String,
    pub description: String,
    pub added_count: usize,
    pub removed_count: usize,
    pub modified_text: String,
    pub original_text: String,
    /// Function and class names declared in added lines, first appearance order.
    pub affected_names: Vec<String>,
    pub change_kind: ChangeKind,
    #[serde(default)]
    pub merge_outcome: MergeOutcome,
}

impl TransformResult {
    pub fn with_merge_outcome(mut self, outcome: MergeOutcome) -> Self {
        self.merge_outcome = outcome;
        self
    }

    /// Whether the texts are identical.
    pub fn is_no_op(&self) -> bool {
        self.changes.is_empty()
    }

    /// 1-based line of the first added line in the modified text.
    pub fn first_added_line(&self) -> Option<usize> {
        self.changes
            .iter()
            .find(|c| c.kind == ChangeLineKind::Added)
            .map(|c| c.line_number)
    }

    pub fn added_lines(&self) -> impl Iterator<Item = &str> {
        self.changes
            .iter()
            .filter(|c| c.kind == ChangeLineKind::Added)
            .map(|c| c.modified_text.as_str())
    }

    pub fn removed_lines(&self) -> impl Iterator<Item = &str> {
        self.changes
            .iter()
            .filter(|c| c.kind == ChangeLineKind::Removed)
            .map(|c| c.original_text.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiffAnalyzer;

impl DiffAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, original: &str, modified: &str, instruction: &str) -> TransformResult {
        let changes = diff_lines(original, modified);
        let added_count = changes
            .iter()
            .filter(|c| c.kind == ChangeLineKind::Added)
            .count();
        let removed_count = changes.len() - added_count;

        let features = AddedFeatures::scan(
            changes
                .iter()
                .filter(|c| c.kind == ChangeLineKind::Added)
                .map(|c| c.modified_text.as_str()),
        );
        let change_kind = classify(added_count, removed_count, &features, instruction);
        let summary = summary::summarize(added_count, removed_count, &features);
        let description =
            summary::describe(change_kind, added_count, removed_count, &features);

        debug!(
            added = added_count,
            removed = removed_count,
            kind = %change_kind,
            "diff analyzed"
        );

        TransformResult {
            changes,
            summary,
            description,
            added_count,
            removed_count,
            modified_text: modified.to_string(),
            original_text: original.to_string(),
            affected_names: features.names.clone(),
            change_kind,
            merge_outcome: MergeOutcome::default(),
        }
    }
}

/// LCS line diff. Lines keep their terminators while diffing, so a changed
/// line ending counts as a change; recorded text has the terminator trimmed.
fn diff_lines(original: &str, modified: &str) -> Vec<CodeChangeLine> {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Lcs)
        .diff_lines(original, modified);

    diff.iter_all_changes()
        .filter_map(|change| {
            let text = trim_terminator(change.value()).to_string();
            match change.tag() {
                ChangeTag::Equal => None,
                ChangeTag::Insert => Some(CodeChangeLine {
                    line_number: change.new_index().map_or(0, |i| i + 1),
                    original_text: String::new(),
                    modified_text: text,
                    kind: ChangeLineKind::Added,
                }),
                ChangeTag::Delete => Some(CodeChangeLine {
                    line_number: change.old_index().map_or(0, |i| i + 1),
                    original_text: text,
                    modified_text: String::new(),
                    kind: ChangeLineKind::Removed,
                }),
            }
        })
        .collect()
}

fn trim_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// First match wins: test addition, full rewrite, partial modification, addition.
fn classify(
    added: usize,
    removed: usize,
    features: &AddedFeatures,
    instruction: &str,
) -> ChangeKind {
    if features.test_classes > 0 && features.test_functions > 0 && is_test_instruction(instruction)
    {
        ChangeKind::TestAddition
    } else if added > FULL_REWRITE_THRESHOLD && removed > FULL_REWRITE_THRESHOLD {
        ChangeKind::FullRewrite
    } else if added > 0 && removed > 0 {
        ChangeKind::PartialModification
    } else {
        ChangeKind::Addition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(original: &str, modified: &str, instruction: &str) -> TransformResult {
        DiffAnalyzer::new().analyze(original, modified, instruction)
    }

    #[test]
    fn test_docstring_addition() {
        let original = "def f():\n    pass\n";
        let modified = "def f():\n    \"\"\"doc\"\"\"\n    pass\n";
        let result = analyze(original, modified, "add a docstring");

        assert_eq!(result.added_count, 1);
        assert_eq!(result.removed_count, 0);
        assert_eq!(result.change_kind, ChangeKind::Addition);
        assert_eq!(
            result.changes,
            vec![CodeChangeLine {
                line_number: 2,
                original_text: String::new(),
                modified_text: "    \"\"\"doc\"\"\"".to_string(),
                kind: ChangeLineKind::Added,
            }]
        );
        assert_eq!(result.first_added_line(), Some(2));
        assert!(result.summary.contains("documentation"));
    }

    #[test]
    fn test_identical_texts_yield_no_changes() {
        for text in ["", "x = 1", "a\nb\nc\n", "\n\n"] {
            let result = analyze(text, text, "anything");
            assert!(result.changes.is_empty());
            assert!(result.is_no_op());
            assert_eq!(result.added_count + result.removed_count, 0);
            assert_eq!(result.summary, "No changes");
        }
    }

    #[test]
    fn test_counts_zero_only_when_identical() {
        let pairs = [
            ("a\n", "a"),
            ("a\nb\n", "b\na\n"),
            ("x", "y"),
            ("a\r\n", "a\n"),
            ("", "\n"),
        ];
        for (original, modified) in pairs {
            let result = analyze(original, modified, "");
            assert!(
                result.added_count + result.removed_count > 0,
                "{original:?} -> {modified:?}"
            );
        }
    }

    #[test]
    fn test_removal_uses_original_numbering() {
        let result = analyze("a\nb\nc\nd\n", "a\nc\nd\nX\n", "");
        let removed: Vec<_> = result
            .changes
            .iter()
            .filter(|c| c.kind == ChangeLineKind::Removed)
            .map(|c| (c.line_number, c.original_text.as_str()))
            .collect();
        assert_eq!(removed, vec![(2, "b")]);
        assert_eq!(result.first_added_line(), Some(4));
        assert_eq!(result.change_kind, ChangeKind::PartialModification);
    }

    #[test]
    fn test_test_addition() {
        let original = "def f():\n    return 1\n";
        let modified = "def f():\n    return 1\n\n\nimport unittest\n\n\nclass TestF(unittest.TestCase):\n    def test_returns_one(self):\n        self.assertEqual(f(), 1)\n\n    def test_is_int(self):\n        self.assertIsInstance(f(), int)\n";
        let result = analyze(original, modified, "write a test for f");

        assert_eq!(result.change_kind, ChangeKind::TestAddition);
        assert!(result.summary.contains("2 test methods"), "{}", result.summary);
        assert_eq!(
            result.affected_names,
            vec!["TestF", "test_returns_one", "test_is_int"]
        );
    }

    #[test]
    fn test_tests_without_test_instruction_are_additions() {
        let original = "x = 1\n";
        let modified = "x = 1\nclass TestX:\n    def test_x(self):\n        pass\n";
        let result = analyze(original, modified, "add more code");
        assert_eq!(result.change_kind, ChangeKind::Addition);
    }

    #[test]
    fn test_full_rewrite() {
        let original: String = (0..12).map(|i| format!("old_{i} = {i}\n")).collect();
        let modified: String = (0..12).map(|i| format!("new_{i} = {i}\n")).collect();
        let result = analyze(&original, &modified, "rewrite everything");
        assert_eq!(result.added_count, 12);
        assert_eq!(result.removed_count, 12);
        assert_eq!(result.change_kind, ChangeKind::FullRewrite);
        assert_eq!(result.summary, "Modified code: +12/-12 lines");
    }

    #[test]
    fn test_affected_names_from_added_lines_only() {
        let original = "def keep():\n    pass\n";
        let modified = "def keep():\n    pass\n\ndef area(r):\n    return r\n\ndef area(r):\n    return r\n\nclass Shape:\n    pass\n";
        let result = analyze(original, modified, "add helpers");
        assert_eq!(result.affected_names, vec!["area", "Shape"]);
    }

    #[test]
    fn test_selection_merge_round_trip() {
        use crate::context::{CodeContext, ContextScope, ContextWindow};
        use crate::editor::{Cursor, Selection};
        use crate::merge::PartialMergeEngine;

        let original = "a = 1\nb = 2\nc = 3\n";
        let selection = Selection {
            start: Cursor::new(1, 0),
            end: Cursor::new(2, 0),
            text: "b = 2\n".to_string(),
        };
        let context = CodeContext::from_document(original, &selection, Cursor::new(1, 0), 500);
        let window = ContextWindow {
            text: selection.text.clone(),
            is_partial: false,
            scope: ContextScope::Selection,
        };
        let merged = PartialMergeEngine::new().merge(original, "b = 20\n", &context, &window);

        let result = analyze(original, &merged.text, "change b");
        assert_eq!(result.removed_lines().collect::<Vec<_>>(), vec!["b = 2"]);
        assert_eq!(result.added_lines().collect::<Vec<_>>(), vec!["b = 20"]);
    }

    #[test]
    fn test_merge_outcome_attached() {
        let result = analyze("a", "b", "").with_merge_outcome(MergeOutcome::Unanchored);
        assert!(result.merge_outcome.is_high_risk());
    }
}
