//! Editor collaborators consumed by the engine.
//!
//! The engine never talks to a concrete editor. It reads and swaps document
//! content through [`LiveDocument`] and narrates results through
//! [`NarrationSink`]. [`MemoryDocument`] backs the CLI and the tests.

use crate::errors::DocumentError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Cursor position, 0-based line and column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub line: usize,
    pub column: usize,
}

impl Cursor {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// The user's current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub start: Cursor,
    pub end: Cursor,
    pub text: String,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Live document accessor.
///
/// A single `replace_all` must be observed atomically by subsequent reads.
pub trait LiveDocument {
    fn text(&self) -> String;
    fn replace_all(&mut self, text: &str) -> Result<(), DocumentError>;
    fn selection(&self) -> Selection;
    fn cursor(&self) -> Cursor;
    fn line_count(&self) -> usize;
    /// Best-effort cursor placement after an apply.
    fn set_cursor(&mut self, cursor: Cursor) -> Result<(), DocumentError>;
}

/// Fire-and-forget narration output (speech synthesis lives elsewhere).
pub trait NarrationSink: Send + Sync {
    fn announce(&self, text: &str);
}

/// Narration sink that routes announcements into the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNarrator;

impl NarrationSink for TracingNarrator {
    fn announce(&self, text: &str) {
        info!(target: "lipcoder::narration", "{}", text);
    }
}

/// Narration sink that prints announcements for terminal users.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNarrator;

impl NarrationSink for ConsoleNarrator {
    fn announce(&self, text: &str) {
        println!("{} {}", console::style("🔊").dim(), text);
    }
}

/// Console narration for an interactive terminal, the tracing log otherwise.
pub fn default_narrator(interactive: bool) -> Arc<dyn NarrationSink> {
    if interactive {
        Arc::new(ConsoleNarrator)
    } else {
        Arc::new(TracingNarrator)
    }
}

/// In-memory document used by the CLI and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    text: String,
    cursor: Cursor,
    selection: Selection,
    read_only: bool,
}

impl MemoryDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_cursor(mut self, line: usize, column: usize) -> Self {
        self.cursor = Cursor::new(line, column);
        self
    }

    /// Select whole lines `start_line..=end_line` (0-based, clamped).
    pub fn with_line_selection(mut self, start_line: usize, end_line: usize) -> Self {
        let segments: Vec<&str> = self.text.split_inclusive('\n').collect();
        if segments.is_empty() {
            return self;
        }
        let last = segments.len() - 1;
        let start = start_line.min(last);
        let end = end_line.clamp(start, last);
        let text: String = segments[start..=end].concat();
        let end_column = segments[end].trim_end_matches(['\n', '\r']).chars().count();
        self.selection = Selection {
            start: Cursor::new(start, 0),
            end: Cursor::new(end, end_column),
            text,
        };
        self.cursor = Cursor::new(start, 0);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

impl LiveDocument for MemoryDocument {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn replace_all(&mut self, text: &str) -> Result<(), DocumentError> {
        if self.read_only {
            return Err(DocumentError::ReadOnly);
        }
        self.text = text.to_string();
        self.selection = Selection::default();
        Ok(())
    }

    fn selection(&self) -> Selection {
        self.selection.clone()
    }

    fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn line_count(&self) -> usize {
        self.text.lines().count()
    }

    fn set_cursor(&mut self, cursor: Cursor) -> Result<(), DocumentError> {
        let line_count = self.line_count();
        if cursor.line >= line_count.max(1) {
            return Err(DocumentError::LineOutOfRange {
                line: cursor.line,
                line_count,
            });
        }
        self.cursor = cursor;
        Ok(())
    }
}
