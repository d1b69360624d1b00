//! Markdown fence removal for model responses.

use regex::Regex;
use std::sync::LazyLock;

// A line holding only a fence marker, optionally with a language tag
static FENCE_LINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*```[\w+#.\-]*[ \t]*(?:\r?\n|$)").unwrap());

/// Strip triple-backtick fences from a model response.
///
/// Removes the opening fence (with its language tag) and the closing fence,
/// then every remaining fence line and stray fence marker, since a model may
/// emit several fenced blocks. Whitespace outside the outermost fences is
/// padding and goes too. Text inside the fences is kept as-is, including
/// its leading and trailing blank lines. Unfenced text is returned unchanged.
pub fn strip_code_fences(text: &str) -> String {
    if !text.contains("```") {
        return text.to_string();
    }

    let mut body = text;
    if body.trim_start().starts_with("```") {
        body = body.trim_start();
    }
    if body.trim_end().ends_with("```") {
        body = body.trim_end();
    }

    let without_lines = FENCE_LINE_REGEX.replace_all(body, "");
    without_lines.replace("```", "")
}
