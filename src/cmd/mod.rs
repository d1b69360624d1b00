//! CLI command implementations.
//!
//! | Module    | Commands handled |
//! |-----------|------------------|
//! | `edit`    | `Edit`           |
//! | `diff`    | `Diff`           |
//! | `context` | `Context`        |
//! | `config`  | `Config`         |

pub mod config;
pub mod context;
pub mod diff;
pub mod edit;

pub use config::cmd_config;
pub use context::cmd_context;
pub use diff::cmd_diff;
pub use edit::cmd_edit;

use anyhow::{Result, bail};
use std::path::Path;

/// Read a source file, naming it in the error.
pub(crate) fn read_source(path: &Path) -> Result<String> {
    use anyhow::Context;
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Convert a 1-based CLI line number to a 0-based index within `line_count`.
pub(crate) fn zero_based_line(line: usize, line_count: usize) -> Result<usize> {
    if line == 0 || line > line_count.max(1) {
        bail!(
            "Line {} is outside the file (1-{})",
            line,
            line_count.max(1)
        );
    }
    Ok(line - 1)
}
