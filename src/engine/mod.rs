//! Instruction pipeline orchestration.
//!
//! `propose` runs instruction → context → prompt → completion → merge → diff
//! and parks the result in the injected [`PendingChangeStore`]. Nothing
//! touches the document until `apply`.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::context::{CodeContext, ContextBudget, ContextSelector};
use crate::diff::DiffAnalyzer;
use crate::editor::{LiveDocument, NarrationSink};
use crate::errors::VibeError;
use crate::llm::{CompletionService, TransformClient};
use crate::prompt::PromptBuilder;
use crate::store::{AppliedChange, PendingChange, PendingChangeStore};
use crate::voice::{VoiceCommand, VoiceCommandInterpreter};

/// Runtime knobs for the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub budget: ContextBudget,
    pub max_response_tokens: u32,
    pub temperature: f32,
    pub auto_apply: bool,
    pub large_file_lines: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        let budget = ContextBudget::default();
        Self {
            max_response_tokens: budget.reserved_response_tokens as u32,
            budget,
            temperature: 0.1,
            auto_apply: false,
            large_file_lines: 500,
        }
    }
}

/// What a voice utterance did to the current change.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceOutcome {
    Applied(AppliedChange),
    Rejected(PendingChange),
    Ignored,
}

pub struct VibeEngine<S> {
    client: TransformClient<S>,
    selector: ContextSelector,
    prompts: PromptBuilder,
    analyzer: DiffAnalyzer,
    interpreter: VoiceCommandInterpreter,
    store: PendingChangeStore,
    narrator: Arc<dyn NarrationSink>,
    settings: EngineSettings,
}

impl<S: CompletionService> VibeEngine<S> {
    pub fn new(
        service: S,
        store: PendingChangeStore,
        narrator: Arc<dyn NarrationSink>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            client: TransformClient::new(service),
            selector: ContextSelector::new(settings.budget),
            prompts: PromptBuilder::new(),
            analyzer: DiffAnalyzer::new(),
            interpreter: VoiceCommandInterpreter::new(),
            store,
            narrator,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn store(&self) -> &PendingChangeStore {
        &self.store
    }

    pub fn service(&self) -> &S {
        self.client.service()
    }

    /// Snapshot of pending changes, oldest first.
    pub fn pending(&self) -> Vec<PendingChange> {
        self.store.list()
    }

    pub fn current(&self) -> Option<&PendingChange> {
        self.store.current()
    }

    /// Turn an instruction into a pending change against `document`.
    ///
    /// Fails with, in order of checking: `EmptyInstruction`,
    /// `NoEditorContext`, `TransformFailure`, `NoChangeDetected`.
    #[instrument(skip_all, fields(instruction_len = instruction.len()))]
    pub async fn propose(
        &mut self,
        instruction: &str,
        document: Option<&dyn LiveDocument>,
    ) -> Result<PendingChange, VibeError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(VibeError::EmptyInstruction);
        }
        let document = document.ok_or(VibeError::NoEditorContext)?;

        let original = document.text();
        let context = CodeContext::from_document(
            &original,
            &document.selection(),
            document.cursor(),
            self.settings.large_file_lines,
        );
        let window = self.selector.select(&original, &context, instruction);
        info!(
            scope = ?window.scope,
            context_tokens = self.selector.estimator().estimate(&window.text),
            total_lines = context.total_lines,
            "context selected"
        );

        let prompts = self.prompts.build(&context, &window, instruction);
        debug!(system_prompt = %prompts.system, user_prompt = %prompts.user, "prompts built");

        let merged = self
            .client
            .transform_document(
                &prompts,
                &original,
                &context,
                &window,
                self.settings.max_response_tokens,
                self.settings.temperature,
            )
            .await
            .map_err(VibeError::TransformFailure)?;

        if merged.outcome.is_high_risk() {
            warn!(
                outcome = %merged.outcome,
                "model output replaces the whole document; review before applying"
            );
        }

        let result = self
            .analyzer
            .analyze(&original, &merged.text, instruction)
            .with_merge_outcome(merged.outcome);
        if result.is_no_op() {
            info!("instruction produced no changes");
            return Err(VibeError::NoChangeDetected);
        }

        let change = self.store.create(result, instruction);
        info!(
            id = %change.id,
            kind = %change.result.change_kind,
            merge = %change.result.merge_outcome,
            added = change.result.added_count,
            removed = change.result.removed_count,
            "change proposed"
        );
        self.narrator.announce(&change.result.description);
        Ok(change)
    }

    pub fn apply(
        &mut self,
        id: &str,
        document: &mut dyn LiveDocument,
    ) -> Result<AppliedChange, VibeError> {
        let applied = self.store.apply(id, document)?;
        self.narrator.announce("Change applied.");
        Ok(applied)
    }

    pub fn reject(&mut self, id: &str) -> Result<PendingChange, VibeError> {
        let rejected = self.store.reject(id)?;
        self.narrator.announce("Change rejected.");
        Ok(rejected)
    }

    pub fn apply_current(
        &mut self,
        document: &mut dyn LiveDocument,
    ) -> Result<AppliedChange, VibeError> {
        let id = self.current_id()?;
        self.apply(&id, document)
    }

    pub fn reject_current(&mut self) -> Result<PendingChange, VibeError> {
        let id = self.current_id()?;
        self.reject(&id)
    }

    /// Route a confirm/cancel utterance to the current change.
    pub fn handle_utterance(
        &mut self,
        utterance: &str,
        document: &mut dyn LiveDocument,
    ) -> Result<VoiceOutcome, VibeError> {
        let command = self
            .interpreter
            .interpret(utterance, self.store.current().is_some());
        debug!(%command, "utterance interpreted");

        match command {
            VoiceCommand::Apply => self.apply_current(document).map(VoiceOutcome::Applied),
            VoiceCommand::Reject => self.reject_current().map(VoiceOutcome::Rejected),
            VoiceCommand::NoMatch => Ok(VoiceOutcome::Ignored),
        }
    }

    /// Whether `change` may be applied without an explicit decision.
    pub fn should_auto_apply(&self, change: &PendingChange) -> bool {
        self.settings.auto_apply && !change.result.merge_outcome.is_high_risk()
    }

    fn current_id(&self) -> Result<String, VibeError> {
        self.store
            .current_id()
            .map(str::to_string)
            .ok_or_else(|| VibeError::NotFound {
                id: "current".to_string(),
            })
    }
}
