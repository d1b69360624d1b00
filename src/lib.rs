//! Instruction-driven code transformation for an accessibility coding
//! assistant.
//!
//! An instruction plus the current editing context becomes a bounded prompt,
//! the model response is merged back into a complete file, the difference is
//! analyzed and classified, and the result waits as a pending change until
//! it is applied or rejected, by keyboard or by voice.

pub mod config;
pub mod context;
pub mod diff;
pub mod editor;
pub mod engine;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod merge;
pub mod prompt;
pub mod store;
pub mod voice;
