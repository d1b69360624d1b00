use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "lipcoder")]
#[command(version, about = "Edit code with natural-language instructions")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Apply proposed changes without asking
    #[arg(long, global = true)]
    pub yes: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Model name. Overrides lipcoder.toml and LIPCODER_MODEL.
    #[arg(long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transform a file with a natural-language instruction
    Edit {
        file: PathBuf,

        /// What to change, in English or Korean
        #[arg(short, long)]
        instruction: String,

        /// Cursor line (1-based)
        #[arg(long)]
        line: Option<usize>,

        /// Cursor column (1-based)
        #[arg(long)]
        column: Option<usize>,

        /// Select whole lines START:END (1-based, inclusive)
        #[arg(long)]
        select: Option<String>,

        /// Answer the review prompt with an utterance, e.g. "apply" or "취소"
        #[arg(long)]
        reply: Option<String>,
    },
    /// Analyze the difference between two files
    Diff {
        original: PathBuf,
        modified: PathBuf,

        /// Instruction the change was made for (used for classification)
        #[arg(short, long, default_value = "")]
        instruction: String,

        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the code context that would be sent for an instruction
    Context {
        file: PathBuf,

        /// Cursor line (1-based)
        #[arg(long)]
        line: Option<usize>,

        #[arg(short, long, default_value = "")]
        instruction: String,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default lipcoder.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let log_dir = project_dir.join(lipcoder::config::CONFIG_DIR).join("logs");
    let _guard = lipcoder::logging::init(cli.verbose, Some(&log_dir))?;

    match &cli.command {
        Commands::Edit {
            file,
            instruction,
            line,
            column,
            select,
            reply,
        } => {
            let target = cmd::edit::EditTarget {
                file: file.clone(),
                line: *line,
                column: *column,
                select: select.clone(),
            };
            cmd::cmd_edit(&cli, &project_dir, &target, instruction, reply.as_deref()).await?;
        }
        Commands::Diff {
            original,
            modified,
            instruction,
            json,
        } => cmd::cmd_diff(original, modified, instruction, *json)?,
        Commands::Context {
            file,
            line,
            instruction,
        } => cmd::cmd_context(&cli, &project_dir, file, *line, instruction)?,
        Commands::Config { command } => cmd::cmd_config(&project_dir, command.clone())?,
    }

    Ok(())
}
