//! OpenAI-compatible chat completions client.
//!
//! Non-streaming `POST {endpoint}/v1/chat/completions` with a system and a
//! user message. Constructor validation:
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use super::{
    CompletionService, DEFAULT_TIMEOUT_SECS, LlmModelConfig, make_snippet, normalize_endpoint,
};
use crate::errors::CompletionError;

/// Thin client for the OpenAI chat completions API.
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    model: String,
    url_chat: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// # Errors
    /// - [`CompletionError::MissingApiKey`] naming `cfg.api_key_env` if `cfg.api_key` is `None`
    /// - [`CompletionError::InvalidEndpoint`] if `cfg.endpoint` is invalid
    /// - [`CompletionError::Transport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, CompletionError> {
        let api_key = cfg
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CompletionError::MissingApiKey(cfg.api_key_env.clone()))?;
        let base = normalize_endpoint(&cfg.endpoint)?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| CompletionError::Decode(format!("invalid API key header: {e}")))?,
        );

        let timeout_secs = cfg.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(headers)
            .build()?;

        info!(
            model = %cfg.model,
            endpoint = %base,
            timeout_secs,
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            url_chat: format!("{}/v1/chat/completions", base),
            model: cfg.model,
        })
    }
}

#[async_trait]
impl CompletionService for OpenAiService {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, CompletionError> {
        let started = Instant::now();
        let body = ChatCompletionRequest {
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
            max_tokens,
            temperature,
        };

        debug!(
            prompt_len = system_prompt.len() + user_prompt.len(),
            max_tokens, "POST {}", self.url_chat
        );
        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let snippet = make_snippet(&resp.text().await.unwrap_or_default());
            error!(
                %status,
                url = %self.url_chat,
                latency_ms = started.elapsed().as_millis(),
                "chat completion returned non-success status"
            );
            return Err(CompletionError::HttpStatus {
                status,
                url: self.url_chat.clone(),
                snippet,
            });
        }

        let out: ChatCompletionResponse = resp.json().await.map_err(|e| {
            CompletionError::Decode(format!(
                "serde error: {e}; expected `choices[0].message.content`"
            ))
        })?;

        let content = out
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(CompletionError::EmptyResponse)?;

        debug!(
            latency_ms = started.elapsed().as_millis(),
            response_len = content.len(),
            "chat completion succeeded"
        );
        Ok(content)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
