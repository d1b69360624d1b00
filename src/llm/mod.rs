//! Completion service integration.
//!
//! The engine reaches a language model only through [`CompletionService`].
//! Two HTTP providers are included:
//!
//! - [`OpenAiService`]: `POST {endpoint}/v1/chat/completions`
//! - [`OllamaService`]: `POST {endpoint}/api/chat` with `stream=false`
//!
//! [`TransformClient`] wraps a service and post-processes every response
//! (fence stripping, partial-context reintegration).

mod client;
mod fences;
mod ollama;
mod openai;

pub use client::TransformClient;
pub use fences::strip_code_fences;
pub use ollama::OllamaService;
pub use openai::OpenAiService;

use crate::errors::CompletionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default request timeout when the config does not set one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Maximum length of a response body snippet kept in errors.
pub const ERROR_SNIPPET_CHARS: usize = 240;

/// Abstraction over the completion service for testability.
/// Real implementations: `OpenAiService`, `OllamaService`.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, CompletionError>;
}

/// Supported completion providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI-compatible chat completions API.
    #[default]
    OpenAi,
    /// Local Ollama runtime.
    Ollama,
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::OpenAi => write!(f, "openai"),
            LlmProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            "ollama" => Ok(LlmProvider::Ollama),
            _ => anyhow::bail!("Invalid provider '{}'. Valid values: openai, ollama", s),
        }
    }
}

/// Resolved connection settings for a completion provider.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    pub provider: LlmProvider,
    pub model: String,
    /// Base URL, without the API path.
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Environment variable the key is read from, named in errors.
    pub api_key_env: String,
    pub timeout_secs: Option<u64>,
}

/// Validate an endpoint and return it without trailing slashes.
pub(crate) fn normalize_endpoint(endpoint: &str) -> Result<String, CompletionError> {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() || !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(CompletionError::InvalidEndpoint(endpoint.to_string()));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Truncate a response body for inclusion in an error.
pub(crate) fn make_snippet(body: &str) -> String {
    body.chars().take(ERROR_SNIPPET_CHARS).collect()
}

/// Completion service chosen at runtime from configuration.
pub enum AnyCompletionService {
    OpenAi(OpenAiService),
    Ollama(OllamaService),
}

impl AnyCompletionService {
    /// Build the provider named in `cfg`.
    pub fn from_config(cfg: LlmModelConfig) -> Result<Self, CompletionError> {
        match cfg.provider {
            LlmProvider::OpenAi => Ok(Self::OpenAi(OpenAiService::new(cfg)?)),
            LlmProvider::Ollama => Ok(Self::Ollama(OllamaService::new(cfg)?)),
        }
    }
}

#[async_trait]
impl CompletionService for AnyCompletionService {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, CompletionError> {
        match self {
            Self::OpenAi(svc) => {
                svc.complete(system_prompt, user_prompt, max_tokens, temperature)
                    .await
            }
            Self::Ollama(svc) => {
                svc.complete(system_prompt, user_prompt, max_tokens, temperature)
                    .await
            }
        }
    }
}
