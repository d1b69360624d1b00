//! Ollama chat client.
//!
//! Non-streaming `POST {endpoint}/api/chat`; `max_tokens` maps to
//! `options.num_predict`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{
    CompletionService, DEFAULT_TIMEOUT_SECS, LlmModelConfig, make_snippet, normalize_endpoint,
};
use crate::errors::CompletionError;

/// Thin client for a local Ollama runtime.
#[derive(Debug)]
pub struct OllamaService {
    client: reqwest::Client,
    model: String,
    url_chat: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - [`CompletionError::InvalidEndpoint`] if `cfg.endpoint` is invalid
    /// - [`CompletionError::Transport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, CompletionError> {
        let base = normalize_endpoint(&cfg.endpoint)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(
                cfg.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ))
            .build()?;

        Ok(Self {
            client,
            url_chat: format!("{}/api/chat", base),
            model: cfg.model,
        })
    }
}

#[async_trait]
impl CompletionService for OllamaService {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            stream: false,
            options: ChatOptions {
                temperature,
                num_predict: max_tokens,
            },
        };

        debug!("POST {}", self.url_chat);
        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let snippet = make_snippet(&resp.text().await.unwrap_or_default());
            return Err(CompletionError::HttpStatus {
                status,
                url: self.url_chat.clone(),
                snippet,
            });
        }

        let out: ChatResponse = resp.json().await.map_err(|e| {
            CompletionError::Decode(format!("serde error: {e}; ensure `stream=false` is used"))
        })?;

        if out.message.content.trim().is_empty() {
            return Err(CompletionError::EmptyResponse);
        }
        Ok(out.message.content)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}
