//! Instruction-driven file editing (`lipcoder edit`).

use anyhow::{Context, Result, bail};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use lipcoder::config::LipcoderConfig;
use lipcoder::editor::{LiveDocument, MemoryDocument, default_narrator};
use lipcoder::engine::{VibeEngine, VoiceOutcome};
use lipcoder::errors::VibeError;
use lipcoder::llm::{AnyCompletionService, CompletionService};
use lipcoder::store::{AppliedChange, PendingChangeStore};

use super::super::Cli;

/// File and editor state the instruction runs against.
#[derive(Debug, Clone)]
pub struct EditTarget {
    pub file: PathBuf,
    /// 1-based cursor line
    pub line: Option<usize>,
    /// 1-based cursor column
    pub column: Option<usize>,
    /// `START:END`, 1-based inclusive
    pub select: Option<String>,
}

pub async fn cmd_edit(
    cli: &Cli,
    project_dir: &Path,
    target: &EditTarget,
    instruction: &str,
    reply: Option<&str>,
) -> Result<()> {
    let config = LipcoderConfig::with_cli_args(
        project_dir.to_path_buf(),
        cli.verbose,
        cli.yes,
        cli.model.clone(),
    )?;
    for warning in config.validate() {
        println!("  {} {}", console::style("⚠").yellow(), warning);
    }

    let mut document = open_document(target)?;
    let service = AnyCompletionService::from_config(config.llm_config())
        .context("Failed to set up the completion service")?;
    let mut engine = VibeEngine::new(
        service,
        PendingChangeStore::new(),
        default_narrator(std::io::stdout().is_terminal()),
        config.engine_settings()?,
    );

    println!(
        "{} {}",
        console::style("Transforming").bold().cyan(),
        target.file.display()
    );
    let change = match engine.propose(instruction, Some(&document)).await {
        Ok(change) => change,
        Err(VibeError::NoChangeDetected) => {
            println!("No changes were made. The file is unchanged.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    super::diff::print_result(&change.result);
    if change.result.merge_outcome.is_high_risk() {
        println!(
            "  {} The response could not be placed into the file and will replace all of it.",
            console::style("⚠").yellow()
        );
    }

    let applied = if let Some(reply) = reply {
        match engine.handle_utterance(reply, &mut document)? {
            VoiceOutcome::Applied(applied) => Some(applied),
            VoiceOutcome::Rejected(_) => None,
            VoiceOutcome::Ignored => {
                println!(
                    "Reply '{}' was not understood as apply or reject. The file is unchanged.",
                    reply
                );
                None
            }
        }
    } else if cli.yes {
        Some(engine.apply(&change.id, &mut document)?)
    } else if engine.should_auto_apply(&change) {
        let delay = config.auto_apply_delay();
        println!(
            "{}",
            console::style(format!("Auto-applying in {} ms", delay.as_millis())).dim()
        );
        tokio::time::sleep(delay).await;
        Some(engine.apply(&change.id, &mut document)?)
    } else {
        confirm_and_apply(&mut engine, &change.id, &mut document)?
    };

    match applied {
        Some(applied) => write_back(&target.file, &document, &applied),
        None => {
            println!("Change discarded. The file is unchanged.");
            Ok(())
        }
    }
}

fn confirm_and_apply<S: CompletionService>(
    engine: &mut VibeEngine<S>,
    id: &str,
    document: &mut MemoryDocument,
) -> Result<Option<AppliedChange>> {
    use dialoguer::Confirm;

    let confirm = Confirm::new()
        .with_prompt("Apply this change?")
        .default(false)
        .interact()
        .unwrap_or(false);

    if confirm {
        Ok(Some(engine.apply(id, document)?))
    } else {
        engine.reject(id)?;
        Ok(None)
    }
}

fn write_back(file: &Path, document: &MemoryDocument, applied: &AppliedChange) -> Result<()> {
    std::fs::write(file, document.text())
        .with_context(|| format!("Failed to write {}", file.display()))?;
    match applied.cursor_line {
        Some(line) => println!(
            "{} {} (cursor at line {})",
            console::style("Applied to").green().bold(),
            file.display(),
            line + 1
        ),
        None => println!(
            "{} {}",
            console::style("Applied to").green().bold(),
            file.display()
        ),
    }
    Ok(())
}

fn open_document(target: &EditTarget) -> Result<MemoryDocument> {
    let text = super::read_source(&target.file)?;
    let line_count = text.lines().count();
    let mut document = MemoryDocument::new(text);

    if let Some(select) = &target.select {
        let (start, end) = parse_line_range(select)?;
        let start = super::zero_based_line(start, line_count)?;
        let end = super::zero_based_line(end, line_count)?;
        document = document.with_line_selection(start, end);
    }

    if let Some(line) = target.line {
        let line = super::zero_based_line(line, line_count)?;
        let column = target.column.unwrap_or(1).saturating_sub(1);
        document = document.with_cursor(line, column);
    }

    Ok(document)
}

/// Parse `START:END` (1-based, inclusive).
fn parse_line_range(value: &str) -> Result<(usize, usize)> {
    let Some((start, end)) = value.split_once(':') else {
        bail!("Invalid selection '{}'. Expected START:END, e.g. 3:7", value);
    };
    let start: usize = start
        .trim()
        .parse()
        .with_context(|| format!("Invalid selection start in '{}'", value))?;
    let end: usize = end
        .trim()
        .parse()
        .with_context(|| format!("Invalid selection end in '{}'", value))?;
    if end < start {
        bail!("Invalid selection '{}': end is before start", value);
    }
    Ok((start, end))
}
