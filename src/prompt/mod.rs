//! Prompt templates for instruction-driven code transformation.
//!
//! Two prompts are produced per instruction:
//!
//! - **System prompt**: output mode (complete file vs. modified section),
//!   editing rules, language handling and contextual hints
//! - **User prompt**: the selected context verbatim, the literal instruction
//!   and a directive to return only code
//!
//! Both are pure functions of the code context, the context window and the
//! instruction.

use crate::context::{CodeContext, ContextScope, ContextWindow};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Natural language an instruction is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionLanguage {
    English,
    Korean,
}

impl InstructionLanguage {
    /// Detect the language: any Hangul means Korean, otherwise English.
    pub fn detect(text: &str) -> Self {
        if text.chars().any(is_hangul) {
            Self::Korean
        } else {
            Self::English
        }
    }
}

impl fmt::Display for InstructionLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::English => write!(f, "English"),
            Self::Korean => write!(f, "Korean"),
        }
    }
}

fn is_hangul(c: char) -> bool {
    matches!(c, '\u{AC00}'..='\u{D7A3}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}')
}

/// Whether the model returns the whole file or only the provided section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    CompleteFile,
    ModifiedSection,
}

impl OutputMode {
    pub fn for_window(window: &ContextWindow) -> Self {
        if window.needs_merge() {
            Self::ModifiedSection
        } else {
            Self::CompleteFile
        }
    }
}

/// The rendered prompt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompts {
    pub system: String,
    pub user: String,
    pub mode: OutputMode,
}

/// Renders system and user prompts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, context: &CodeContext, window: &ContextWindow, instruction: &str) -> Prompts {
        let mode = OutputMode::for_window(window);
        Prompts {
            system: build_system_prompt(context, window, instruction, mode),
            user: build_user_prompt(window, instruction, mode),
            mode,
        }
    }
}

/// Build the system prompt.
pub fn build_system_prompt(
    context: &CodeContext,
    window: &ContextWindow,
    instruction: &str,
    mode: OutputMode,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "You are a precise code editor. You modify source code according to a \
         natural-language instruction from a developer who may be working by voice.\n\n",
    );

    prompt.push_str("## Output Mode\n\n");
    match mode {
        OutputMode::CompleteFile => prompt.push_str(
            "You are given the complete file. Return the complete file with the \
             requested change applied.\n\n",
        ),
        OutputMode::ModifiedSection => {
            prompt.push_str(
                "You are given only a section of a larger file. Return only the modified \
                 section: the whole provided section with the requested change applied, \
                 preserving the exact surrounding structure and indentation so it can be \
                 placed back where it came from.\n",
            );
            if let ContextScope::Window { .. } = window.scope {
                prompt.push_str(
                    "The first line of the section is a bracketed header describing which \
                     lines are shown. Do not include that header in your answer.\n",
                );
            }
            prompt.push('\n');
        }
    }

    prompt.push_str("## Rules\n\n");
    prompt.push_str("- Make only the change the instruction asks for.\n");
    prompt.push_str(
        "- Do not reformat, lint, reorder or restyle code beyond the requested change.\n",
    );
    prompt.push_str("- Keep existing comments, blank lines and indentation untouched.\n");
    prompt.push_str("- Do not wrap the answer in markdown code fences.\n");
    prompt.push_str("- Do not add explanations before or after the code.\n");
    prompt.push_str(
        "- Instructions may be written in English or Korean; follow both with equal fidelity.\n\n",
    );

    prompt.push_str("## Context\n\n");
    prompt.push_str(&format!(
        "- **Instruction language**: {}\n",
        InstructionLanguage::detect(instruction)
    ));
    prompt.push_str(&format!(
        "- **Cursor**: line {}, column {}\n",
        context.cursor_line + 1,
        context.cursor_column + 1
    ));
    prompt.push_str(&format!(
        "- **Inside a function**: {}\n",
        if context.in_function() { "yes" } else { "no" }
    ));
    prompt.push_str(&format!(
        "- **Selection**: {}\n",
        match window.scope {
            ContextScope::Selection => "yes, the provided code is the user's selection",
            _ if context.has_selection() => {
                "yes, but it is too large to send; the provided code is a section around the cursor"
            }
            _ => "none",
        }
    ));
    prompt.push_str(&format!(
        "- **File size**: {} ({} lines)\n",
        context.size_class(),
        context.total_lines
    ));

    prompt
}

/// Build the user prompt.
pub fn build_user_prompt(window: &ContextWindow, instruction: &str, mode: OutputMode) -> String {
    let mut prompt = String::new();

    match window.scope {
        ContextScope::Document => prompt.push_str("Current code:\n\n"),
        ContextScope::Selection => prompt.push_str("Selected code:\n\n"),
        ContextScope::Window { .. } => prompt.push_str("Code section:\n\n"),
    }
    prompt.push_str(&window.text);
    if !window.text.ends_with('\n') {
        prompt.push('\n');
    }

    prompt.push_str("\nInstruction: ");
    prompt.push_str(instruction.trim());
    prompt.push_str("\n\n");

    match mode {
        OutputMode::CompleteFile => {
            prompt.push_str("Return only the complete modified code, nothing else.")
        }
        OutputMode::ModifiedSection => {
            prompt.push_str("Return only the modified section of code, nothing else.")
        }
    }

    prompt
}
