//! Context preview (`lipcoder context`).

use anyhow::Result;
use std::path::Path;

use lipcoder::config::LipcoderConfig;
use lipcoder::context::{CodeContext, ContextSelector};
use lipcoder::editor::{Cursor, Selection};

use super::super::Cli;

pub fn cmd_context(
    cli: &Cli,
    project_dir: &Path,
    file: &Path,
    line: Option<usize>,
    instruction: &str,
) -> Result<()> {
    let config = LipcoderConfig::with_cli_args(
        project_dir.to_path_buf(),
        cli.verbose,
        cli.yes,
        cli.model.clone(),
    )?;
    let settings = config.engine_settings()?;

    let text = super::read_source(file)?;
    let line_count = text.lines().count();
    let cursor_line = match line {
        Some(line) => super::zero_based_line(line, line_count)?,
        None => 0,
    };

    let context = CodeContext::from_document(
        &text,
        &Selection::default(),
        Cursor::new(cursor_line, 0),
        settings.large_file_lines,
    );
    let selector = ContextSelector::new(settings.budget);
    let window = selector.select(&text, &context, instruction);
    let estimator = selector.estimator();

    println!();
    println!("{}", console::style("Context preview").bold().cyan());
    println!();
    println!("  File:               {}", file.display());
    println!("  Scope:              {}", window.scope);
    println!("  Partial:            {}", window.is_partial);
    println!(
        "  Context tokens:     {} (available: {})",
        estimator.estimate(&window.text),
        settings
            .budget
            .available_for_context(estimator.estimate(instruction))
    );
    println!(
        "  Lines:              {} ({})",
        context.total_lines,
        context.size_class()
    );
    println!("  Cursor line:        {}", context.cursor_line + 1);
    println!(
        "  Inside function:    {}",
        if context.in_function() { "yes" } else { "no" }
    );
    println!();
    println!("{}", console::style("---").dim());
    print!("{}", window.text);
    if !window.text.ends_with('\n') {
        println!();
    }
    println!("{}", console::style("---").dim());
    Ok(())
}
