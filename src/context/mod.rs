//! Context selection for instruction-driven edits.
//!
//! This module decides how much of the live document is sent to the
//! completion service alongside an instruction.
//!
//! ## Strategy
//!
//! - **Selection**: an explicit, non-empty selection is the whole scope of the request
//! - **Document**: the entire file when it fits the token budget
//! - **Window**: a line window centred on the cursor, prefixed with a synthetic
//!   header naming the total line count and the window bounds
//!
//! ## Usage
//!
//! ```ignore
//! use lipcoder::context::{CodeContext, ContextBudget, ContextSelector};
//!
//! let context = CodeContext::from_document(&text, &selection, cursor, 500);
//! let selector = ContextSelector::new(ContextBudget::default());
//! let window = selector.select(&text, &context, instruction);
//! ```

mod budget;
mod code;
mod selector;

pub use budget::{TokenEstimator, estimate_tokens};
pub use code::{CodeContext, FileSizeClass};
pub use selector::{ContextBudget, ContextScope, ContextSelector, ContextWindow, window_header};

/// Average characters per token used by the default estimator.
/// Code tokenises denser than prose, so this errs toward overestimation.
pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;

/// Tokens reserved for the synthetic window header line.
pub const WINDOW_HEADER_TOKENS: usize = 24;

/// Files up to this many lines are classed as small in prompt hints.
pub const SMALL_FILE_LINES: usize = 100;
