//! Per-instruction editing context derived from the live document.

use super::SMALL_FILE_LINES;
use crate::editor::{Cursor, Selection};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static FUNCTION_DECL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:async\s+def|def|(?:export\s+)?(?:async\s+)?function|(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?fn)\s+\w+",
    )
    .unwrap()
});

/// Coarse file-size class used in prompt hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileSizeClass {
    Small,
    Medium,
    Large,
}

impl fmt::Display for FileSizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Small => write!(f, "small"),
            Self::Medium => write!(f, "medium"),
            Self::Large => write!(f, "large"),
        }
    }
}

/// Editing context captured once per instruction. Immutable afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeContext {
    /// Selected text, empty when nothing is selected.
    pub selected_text: String,
    /// Source of the function enclosing the cursor, if any.
    pub enclosing_function_text: Option<String>,
    /// 0-based cursor line.
    pub cursor_line: usize,
    /// 0-based cursor column.
    pub cursor_column: usize,
    pub total_lines: usize,
    pub is_large_file: bool,
}

impl CodeContext {
    /// Derive the context from the document text, selection and cursor.
    pub fn from_document(
        text: &str,
        selection: &Selection,
        cursor: Cursor,
        large_file_lines: usize,
    ) -> Self {
        let lines: Vec<&str> = text.lines().collect();
        let total_lines = lines.len();

        Self {
            selected_text: selection.text.clone(),
            enclosing_function_text: enclosing_function(&lines, cursor.line),
            cursor_line: cursor.line,
            cursor_column: cursor.column,
            total_lines,
            is_large_file: total_lines > large_file_lines,
        }
    }

    pub fn has_selection(&self) -> bool {
        !self.selected_text.is_empty()
    }

    pub fn in_function(&self) -> bool {
        self.enclosing_function_text.is_some()
    }

    pub fn size_class(&self) -> FileSizeClass {
        if self.is_large_file {
            FileSizeClass::Large
        } else if self.total_lines <= SMALL_FILE_LINES {
            FileSizeClass::Small
        } else {
            FileSizeClass::Medium
        }
    }
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Find the function declaration enclosing `cursor_line`.
///
/// The body of a declaration at indent `d` runs until the first non-blank
/// line indented at `d` or less; a closing brace at that indent is included.
fn enclosing_function(lines: &[&str], cursor_line: usize) -> Option<String> {
    if cursor_line >= lines.len() {
        return None;
    }

    let cursor_indent = if lines[cursor_line].trim().is_empty() {
        usize::MAX
    } else {
        indentation(lines[cursor_line])
    };

    for start in (0..=cursor_line).rev() {
        let line = lines[start];
        if !FUNCTION_DECL_REGEX.is_match(line) {
            continue;
        }
        let decl_indent = indentation(line);
        if start != cursor_line && decl_indent >= cursor_indent {
            continue;
        }

        let mut end = start;
        for (offset, candidate) in lines[start + 1..].iter().enumerate() {
            let idx = start + 1 + offset;
            if candidate.trim().is_empty() {
                continue;
            }
            if indentation(candidate) <= decl_indent {
                if candidate.trim_start().starts_with('}') {
                    end = idx;
                }
                break;
            }
            end = idx;
        }

        if cursor_line <= end {
            return Some(lines[start..=end].join("\n"));
        }
    }

    None
}
