//! Offline change analysis (`lipcoder diff`).

use anyhow::{Context, Result};
use std::path::Path;

use lipcoder::diff::{ChangeLineKind, DiffAnalyzer, TransformResult};

pub fn cmd_diff(original: &Path, modified: &Path, instruction: &str, json: bool) -> Result<()> {
    let original_text = super::read_source(original)?;
    let modified_text = super::read_source(modified)?;

    let result = DiffAnalyzer::new().analyze(&original_text, &modified_text, instruction);

    if json {
        let out = serde_json::to_string_pretty(&result).context("Failed to serialize analysis")?;
        println!("{}", out);
        return Ok(());
    }

    print_result(&result);
    Ok(())
}

/// Print a change report: summary, counts, names and the changed lines.
pub(crate) fn print_result(result: &TransformResult) {
    println!();
    println!("{}", console::style(&result.summary).bold());
    if result.is_no_op() {
        println!();
        return;
    }
    println!("{}", result.description);
    println!();
    println!("  Kind:    {}", result.change_kind);
    println!(
        "  Lines:   {} / {}",
        console::style(format!("+{}", result.added_count)).green(),
        console::style(format!("-{}", result.removed_count)).red()
    );
    if !result.affected_names.is_empty() {
        println!("  Names:   {}", result.affected_names.join(", "));
    }
    println!();

    for change in &result.changes {
        match change.kind {
            ChangeLineKind::Added => println!(
                "{}",
                console::style(format!("{:>5} + {}", change.line_number, change.modified_text))
                    .green()
            ),
            ChangeLineKind::Removed => println!(
                "{}",
                console::style(format!("{:>5} - {}", change.line_number, change.original_text))
                    .red()
            ),
        }
    }
    println!();
}
