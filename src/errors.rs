//! Typed error hierarchy for the lipcoder engine.
//!
//! Three enums cover the three seams of the pipeline:
//! - `VibeError`: instruction pipeline and pending-change lifecycle failures
//! - `CompletionError`: completion service (LLM provider) failures
//! - `DocumentError`: live document collaborator failures

use thiserror::Error;

/// Errors surfaced by the instruction pipeline and the pending-change store.
///
/// Every variant except `Config` is locally recoverable: the user can simply
/// issue a new instruction.
#[derive(Debug, Error)]
pub enum VibeError {
    #[error("Instruction is empty")]
    EmptyInstruction,

    #[error("No editor context is available")]
    NoEditorContext,

    #[error("Code transformation failed: {0}")]
    TransformFailure(#[source] CompletionError),

    #[error("The instruction produced no changes")]
    NoChangeDetected,

    #[error("Pending change {id} not found")]
    NotFound { id: String },

    #[error("Document update failed: {0}")]
    Document(#[from] DocumentError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl VibeError {
    /// Whether the user can recover by issuing another instruction.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

/// Errors from the external completion service.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Invalid completion endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Missing API key (expected in ${0})")]
    MissingApiKey(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}: {snippet}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
        snippet: String,
    },

    #[error("Failed to decode completion response: {0}")]
    Decode(String),

    #[error("Completion service returned an empty response")]
    EmptyResponse,
}

/// Errors from the live document collaborator.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Line {line} is outside the document ({line_count} lines)")]
    LineOutOfRange { line: usize, line_count: usize },

    #[error("Document is read-only")]
    ReadOnly,
}
