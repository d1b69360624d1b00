//! Budget-bounded selection of the code sent with an instruction.

use super::budget::TokenEstimator;
use super::code::CodeContext;
use super::{DEFAULT_CHARS_PER_TOKEN, WINDOW_HEADER_TOKENS};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Token budget for the combined prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextBudget {
    /// Total budget: instruction + context + system overhead + response.
    pub max_prompt_tokens: usize,
    /// Tokens held back for the model's response.
    pub reserved_response_tokens: usize,
    /// Tokens assumed for the system prompt and prompt scaffolding.
    pub system_overhead_tokens: usize,
    pub chars_per_token: usize,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self {
            max_prompt_tokens: 8_000,
            reserved_response_tokens: 2_000,
            system_overhead_tokens: 600,
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
        }
    }
}

impl ContextBudget {
    /// Tokens left for context once everything else is accounted for.
    pub fn available_for_context(&self, instruction_tokens: usize) -> usize {
        self.max_prompt_tokens
            .saturating_sub(self.reserved_response_tokens)
            .saturating_sub(self.system_overhead_tokens)
            .saturating_sub(instruction_tokens)
    }
}

/// What part of the document a [`ContextWindow`] covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContextScope {
    /// The user's explicit selection.
    Selection,
    /// The entire document.
    Document,
    /// Lines `start_line..=end_line` (0-based) of a `total_lines` document.
    Window {
        start_line: usize,
        end_line: usize,
        total_lines: usize,
    },
}

impl fmt::Display for ContextScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selection => write!(f, "selection"),
            Self::Document => write!(f, "document"),
            Self::Window {
                start_line,
                end_line,
                total_lines,
            } => write!(
                f,
                "window (lines {}-{} of {})",
                start_line + 1,
                end_line + 1,
                total_lines
            ),
        }
    }
}

/// The code sent to the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextWindow {
    pub text: String,
    /// True when the text is a bounded line window rather than the full scope.
    pub is_partial: bool,
    pub scope: ContextScope,
}

impl ContextWindow {
    /// Whether a model response must be merged back into the document.
    pub fn needs_merge(&self) -> bool {
        !matches!(self.scope, ContextScope::Document)
    }
}

/// Synthetic header prefixed to windowed context (1-based bounds).
pub fn window_header(start_line: usize, end_line: usize, total_lines: usize) -> String {
    format!(
        "[lipcoder: partial view, lines {}-{} of {} total lines]",
        start_line + 1,
        end_line + 1,
        total_lines
    )
}

/// Chooses selection, document or window context under a token budget.
#[derive(Debug, Clone)]
pub struct ContextSelector {
    budget: ContextBudget,
    estimator: TokenEstimator,
}

impl ContextSelector {
    pub fn new(budget: ContextBudget) -> Self {
        Self {
            estimator: TokenEstimator::new(budget.chars_per_token),
            budget,
        }
    }

    pub fn budget(&self) -> &ContextBudget {
        &self.budget
    }

    pub fn estimator(&self) -> TokenEstimator {
        self.estimator
    }

    /// Select the context for `instruction` against `document`.
    pub fn select(&self, document: &str, context: &CodeContext, instruction: &str) -> ContextWindow {
        let instruction_tokens = self.estimator.estimate(instruction);
        let available = self.budget.available_for_context(instruction_tokens);

        if context.has_selection() && self.estimator.estimate(&context.selected_text) <= available {
            debug!(
                tokens = self.estimator.estimate(&context.selected_text),
                available, "using selection as context"
            );
            return ContextWindow {
                text: context.selected_text.clone(),
                is_partial: false,
                scope: ContextScope::Selection,
            };
        }

        let document_tokens = self.estimator.estimate(document);
        if document.is_empty() || document_tokens < available {
            debug!(document_tokens, available, "using whole document as context");
            return ContextWindow {
                text: document.to_string(),
                is_partial: false,
                scope: ContextScope::Document,
            };
        }

        self.window_around_cursor(document, context.cursor_line, document_tokens, available)
    }

    fn window_around_cursor(
        &self,
        document: &str,
        cursor_line: usize,
        document_tokens: usize,
        available: usize,
    ) -> ContextWindow {
        let segments: Vec<&str> = document.split_inclusive('\n').collect();
        let total_lines = segments.len();
        let tokens_per_line = document_tokens.div_ceil(total_lines).max(1);
        let window_lines = (available.saturating_sub(WINDOW_HEADER_TOKENS) / tokens_per_line)
            .clamp(1, total_lines);

        let cursor = cursor_line.min(total_lines - 1);
        let mut start = cursor.saturating_sub(window_lines / 2);
        let end = (start + window_lines - 1).min(total_lines - 1);
        if end + 1 - start < window_lines {
            start = (end + 1).saturating_sub(window_lines);
        }

        debug!(
            start_line = start,
            end_line = end,
            total_lines,
            tokens_per_line,
            available,
            "using line window around cursor"
        );

        let mut text = window_header(start, end, total_lines);
        text.push('\n');
        text.push_str(&segments[start..=end].concat());

        ContextWindow {
            text,
            is_partial: true,
            scope: ContextScope::Window {
                start_line: start,
                end_line: end,
                total_lines,
            },
        }
    }
}
