//! Completion call plus response post-processing.

use super::CompletionService;
use super::fences::strip_code_fences;
use crate::context::{CodeContext, ContextWindow};
use crate::errors::CompletionError;
use crate::merge::{MergeOutcome, MergeResult, PartialMergeEngine, match_trailing_newline};
use crate::prompt::Prompts;
use tracing::{debug, error};

/// Invokes the completion service once per instruction and cleans the result.
///
/// No retries: a failed call propagates to the caller, which decides how to
/// tell the user.
pub struct TransformClient<S> {
    service: S,
    merger: PartialMergeEngine,
}

impl<S: CompletionService> TransformClient<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            merger: PartialMergeEngine::new(),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Call the service and strip markdown fences from the response.
    pub async fn transform(
        &self,
        prompts: &Prompts,
        max_response_tokens: u32,
        temperature: f32,
    ) -> Result<String, CompletionError> {
        let raw = self
            .service
            .complete(&prompts.system, &prompts.user, max_response_tokens, temperature)
            .await
            .map_err(|e| {
                error!(error = %e, "completion service call failed");
                e
            })?;
        debug!(raw_len = raw.len(), "completion received");
        Ok(strip_code_fences(&raw))
    }

    /// Transform and turn the response into a complete document.
    ///
    /// Responses to selection or window context go through the
    /// [`PartialMergeEngine`]; full-document responses are returned as-is,
    /// with the original's trailing line breaks restored.
    pub async fn transform_document(
        &self,
        prompts: &Prompts,
        original: &str,
        context: &CodeContext,
        window: &ContextWindow,
        max_response_tokens: u32,
        temperature: f32,
    ) -> Result<MergeResult, CompletionError> {
        let cleaned = self
            .transform(prompts, max_response_tokens, temperature)
            .await?;

        if window.needs_merge() {
            return Ok(self.merger.merge(original, &cleaned, context, window));
        }

        Ok(MergeResult {
            text: match_trailing_newline(original, &cleaned),
            outcome: MergeOutcome::FullDocument,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextScope;
    use crate::editor::{Cursor, Selection};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeService {
        response: Result<String, ()>,
        calls: Mutex<Vec<(String, u32)>>,
    }

    impl FakeService {
        fn ok(response: &str) -> Self {
            Self {
                response: Ok(response.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                response: Err(()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionService for FakeService {
        async fn complete(
            &self,
            _system_prompt: &str,
            user_prompt: &str,
            max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, CompletionError> {
            self.calls
                .lock()
                .unwrap()
                .push((user_prompt.to_string(), max_tokens));
            self.response.clone().map_err(|_| CompletionError::EmptyResponse)
        }
    }

    fn prompts() -> Prompts {
        Prompts {
            system: "system".to_string(),
            user: "user".to_string(),
            mode: crate::prompt::OutputMode::CompleteFile,
        }
    }

    fn context(original: &str, selection: &str) -> CodeContext {
        let selection = Selection {
            text: selection.to_string(),
            ..Selection::default()
        };
        CodeContext::from_document(original, &selection, Cursor::default(), 500)
    }

    #[tokio::test]
    async fn test_transform_strips_fences() {
        let client = TransformClient::new(FakeService::ok("```python\nx = 2\n```"));
        let out = client.transform(&prompts(), 256, 0.1).await.unwrap();
        assert_eq!(out, "x = 2\n");
        let calls = client.service().calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], ("user".to_string(), 256));
    }

    #[tokio::test]
    async fn test_full_document_keeps_trailing_newline() {
        let original = "x = 1\n";
        let window = ContextWindow {
            text: original.to_string(),
            is_partial: false,
            scope: ContextScope::Document,
        };
        let client = TransformClient::new(FakeService::ok("```\nx = 2\n```"));
        let merged = client
            .transform_document(&prompts(), original, &context(original, ""), &window, 256, 0.1)
            .await
            .unwrap();
        assert_eq!(merged.text, "x = 2\n");
        assert_eq!(merged.outcome, MergeOutcome::FullDocument);
    }

    #[tokio::test]
    async fn test_selection_response_is_merged() {
        let original = "a = 1\nb = 2\n";
        let window = ContextWindow {
            text: "b = 2\n".to_string(),
            is_partial: false,
            scope: ContextScope::Selection,
        };
        let client = TransformClient::new(FakeService::ok("b = 3"));
        let merged = client
            .transform_document(
                &prompts(),
                original,
                &context(original, "b = 2\n"),
                &window,
                256,
                0.1,
            )
            .await
            .unwrap();
        assert_eq!(merged.text, "a = 1\nb = 3\n");
        assert_eq!(merged.outcome, MergeOutcome::Selection);
    }

    #[tokio::test]
    async fn test_failure_propagates_without_retry() {
        let client = TransformClient::new(FakeService::failing());
        let err = client.transform(&prompts(), 256, 0.1).await.unwrap_err();
        assert!(matches!(err, CompletionError::EmptyResponse));
        assert_eq!(client.service().calls.lock().unwrap().len(), 1);
    }
}
