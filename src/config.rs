//! Configuration loaded from `.lipcoder/lipcoder.toml`.
//!
//! Settings are layered file → environment → CLI. Every section is optional
//! and falls back to defaults.
//!
//! # Configuration File Format
//!
//! ```toml
//! [llm]
//! provider = "openai"        # openai | ollama
//! model = "gpt-4o-mini"
//! endpoint = "https://api.openai.com"
//! api_key_env = "OPENAI_API_KEY"
//! timeout_secs = 60
//! temperature = 0.1
//!
//! [context]
//! max_prompt_tokens = 8000
//! reserved_response_tokens = 2000
//! system_overhead_tokens = 600
//! chars_per_token = 4
//! large_file_lines = 500
//!
//! [review]
//! auto_apply = false
//! auto_apply_delay_ms = 1500
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::context::ContextBudget;
use crate::engine::EngineSettings;
use crate::errors::VibeError;
use crate::llm::{LlmModelConfig, LlmProvider};

/// Directory under the project root holding config and logs.
pub const CONFIG_DIR: &str = ".lipcoder";
/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "lipcoder.toml";

pub const MODEL_ENV: &str = "LIPCODER_MODEL";
pub const ENDPOINT_ENV: &str = "LIPCODER_ENDPOINT";

/// Completion provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSection {
    #[serde(default)]
    pub provider: LlmProvider,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_endpoint() -> String {
    "https://api.openai.com".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    crate::llm::DEFAULT_TIMEOUT_SECS
}

fn default_temperature() -> f32 {
    0.1
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: default_model(),
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

/// Token budget and file-size settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSection {
    /// Combined budget: instruction + context + overhead + response.
    #[serde(default = "default_max_prompt_tokens")]
    pub max_prompt_tokens: usize,
    #[serde(default = "default_reserved_response_tokens")]
    pub reserved_response_tokens: usize,
    #[serde(default = "default_system_overhead_tokens")]
    pub system_overhead_tokens: usize,
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,
    #[serde(default = "default_large_file_lines")]
    pub large_file_lines: usize,
}

fn default_max_prompt_tokens() -> usize {
    8000
}

fn default_reserved_response_tokens() -> usize {
    2000
}

fn default_system_overhead_tokens() -> usize {
    600
}

fn default_chars_per_token() -> usize {
    crate::context::DEFAULT_CHARS_PER_TOKEN
}

fn default_large_file_lines() -> usize {
    500
}

impl Default for ContextSection {
    fn default() -> Self {
        Self {
            max_prompt_tokens: default_max_prompt_tokens(),
            reserved_response_tokens: default_reserved_response_tokens(),
            system_overhead_tokens: default_system_overhead_tokens(),
            chars_per_token: default_chars_per_token(),
            large_file_lines: default_large_file_lines(),
        }
    }
}

impl ContextSection {
    pub fn budget(&self) -> ContextBudget {
        ContextBudget {
            max_prompt_tokens: self.max_prompt_tokens,
            reserved_response_tokens: self.reserved_response_tokens,
            system_overhead_tokens: self.system_overhead_tokens,
            chars_per_token: self.chars_per_token,
        }
    }
}

/// Decision surface settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSection {
    /// Apply changes without asking after `auto_apply_delay_ms`.
    #[serde(default)]
    pub auto_apply: bool,
    #[serde(default = "default_auto_apply_delay_ms")]
    pub auto_apply_delay_ms: u64,
}

fn default_auto_apply_delay_ms() -> u64 {
    1500
}

impl Default for ReviewSection {
    fn default() -> Self {
        Self {
            auto_apply: false,
            auto_apply_delay_ms: default_auto_apply_delay_ms(),
        }
    }
}

/// The complete lipcoder.toml configuration structure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LipcoderToml {
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub context: ContextSection,
    #[serde(default)]
    pub review: ReviewSection,
}

impl LipcoderToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse lipcoder.toml")
    }

    /// Load from `<config_dir>/lipcoder.toml`, or defaults when it is missing.
    pub fn load_or_default(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize lipcoder.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Model name; `LIPCODER_MODEL` overrides the file.
    pub fn model(&self) -> String {
        std::env::var(MODEL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.llm.model.clone())
    }

    /// Endpoint; `LIPCODER_ENDPOINT` overrides the file.
    pub fn endpoint(&self) -> String {
        std::env::var(ENDPOINT_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.llm.endpoint.clone())
    }

    /// API key read from the variable named by `llm.api_key_env`.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|v| !v.trim().is_empty())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            warnings.push(format!(
                "llm.temperature {} is outside 0.0..=2.0",
                self.llm.temperature
            ));
        }

        let endpoint = self.llm.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            warnings.push(format!(
                "llm.endpoint '{}' should start with http:// or https://",
                self.llm.endpoint
            ));
        }

        let ctx = &self.context;
        if ctx.reserved_response_tokens + ctx.system_overhead_tokens >= ctx.max_prompt_tokens {
            warnings.push(format!(
                "context.reserved_response_tokens ({}) plus system_overhead_tokens ({}) \
                 leave no room for code within max_prompt_tokens ({})",
                ctx.reserved_response_tokens, ctx.system_overhead_tokens, ctx.max_prompt_tokens
            ));
        }

        if ctx.chars_per_token == 0 {
            warnings.push("context.chars_per_token must be at least 1 (treated as 1)".to_string());
        }

        if ctx.reserved_response_tokens > u32::MAX as usize {
            warnings.push(format!(
                "context.reserved_response_tokens ({}) exceeds the provider limit",
                ctx.reserved_response_tokens
            ));
        }

        warnings
    }
}

/// Runtime configuration merged from lipcoder.toml, environment and CLI.
#[derive(Debug, Clone)]
pub struct LipcoderConfig {
    pub project_dir: PathBuf,
    /// Path to the .lipcoder directory
    pub config_dir: PathBuf,
    pub toml: LipcoderToml,
    /// CLI override: verbose logging
    pub verbose: bool,
    /// CLI override: apply without asking
    pub yes: bool,
    /// CLI override for the model name
    pub cli_model: Option<String>,
}

impl LipcoderConfig {
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let config_dir = project_dir.join(CONFIG_DIR);
        let toml = LipcoderToml::load_or_default(&config_dir)?;

        Ok(Self {
            project_dir,
            config_dir,
            toml,
            verbose: false,
            yes: false,
            cli_model: None,
        })
    }

    pub fn with_cli_args(
        project_dir: PathBuf,
        verbose: bool,
        yes: bool,
        model: Option<String>,
    ) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.verbose = verbose;
        config.yes = yes;
        config.cli_model = model;
        Ok(config)
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.config_dir.join("logs")
    }

    /// Model name (CLI → env → file).
    pub fn model(&self) -> String {
        self.cli_model
            .clone()
            .unwrap_or_else(|| self.toml.model())
    }

    pub fn auto_apply_delay(&self) -> Duration {
        Duration::from_millis(self.toml.review.auto_apply_delay_ms)
    }

    /// Connection settings for the completion provider.
    pub fn llm_config(&self) -> LlmModelConfig {
        LlmModelConfig {
            provider: self.toml.llm.provider,
            model: self.model(),
            endpoint: self.toml.endpoint(),
            api_key: self.toml.api_key(),
            api_key_env: self.toml.llm.api_key_env.clone(),
            timeout_secs: Some(self.toml.llm.timeout_secs),
        }
    }

    /// Engine settings; fails when the budget leaves no room for code.
    pub fn engine_settings(&self) -> Result<EngineSettings, VibeError> {
        let budget = self.toml.context.budget();
        if budget.available_for_context(0) == 0 {
            return Err(VibeError::Config(format!(
                "max_prompt_tokens {} leaves no room for code after reserving {} response and {} overhead tokens",
                budget.max_prompt_tokens,
                budget.reserved_response_tokens,
                budget.system_overhead_tokens
            )));
        }
        let max_response_tokens = u32::try_from(budget.reserved_response_tokens)
            .map_err(|_| VibeError::Config("reserved_response_tokens is too large".to_string()))?;

        Ok(EngineSettings {
            budget,
            max_response_tokens,
            temperature: self.toml.llm.temperature,
            auto_apply: self.toml.review.auto_apply,
            large_file_lines: self.toml.context.large_file_lines,
        })
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}
