//! Configuration system for ingrain.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{IngrainError, IngrainResult};
use crate::quiz::QuizPrompts;
use crate::traits::{GenerationOptions, LlmConfig};

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAI,
    Anthropic,
    Ollama,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "openai",
            LlmProvider::Anthropic => "anthropic",
            LlmProvider::Ollama => "ollama",
        }
    }

    /// Environment variable holding this provider's API key, if it needs one.
    pub fn api_key_var(&self) -> Option<&'static str> {
        match self {
            LlmProvider::OpenAI => Some("OPENAI_API_KEY"),
            LlmProvider::Anthropic => Some("ANTHROPIC_API_KEY"),
            LlmProvider::Ollama => None,
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "gpt-4o-mini",
            LlmProvider::Anthropic => "claude-3-5-haiku-latest",
            LlmProvider::Ollama => "llama3.2",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = IngrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAI),
            "anthropic" => Ok(LlmProvider::Anthropic),
            "ollama" => Ok(LlmProvider::Ollama),
            other => Err(IngrainError::UnsupportedProvider {
                provider: other.to_string(),
            }),
        }
    }
}

/// Provider configuration with type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    /// Provider type.
    #[serde(default)]
    pub provider: LlmProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: LlmConfig,
}

impl LlmProviderConfig {
    /// Configured model, or the provider's default.
    pub fn model(&self) -> &str {
        if self.config.model.trim().is_empty() {
            self.provider.default_model()
        } else {
            &self.config.model
        }
    }
}

/// Main ingrain configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngrainConfig {
    /// Text-generation provider.
    pub llm: LlmProviderConfig,
    /// Review data file.
    pub data_path: PathBuf,
    /// Directory of notes to review.
    pub vault_dir: PathBuf,
    /// Replaces the quiz instruction placed before each note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_instruction: Option<String>,
    /// System prompt sent with every request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for IngrainConfig {
    fn default() -> Self {
        let ingrain_dir = dirs::home_dir()
            .map(|h| h.join(".ingrain"))
            .unwrap_or_else(|| PathBuf::from(".ingrain"));

        Self {
            llm: LlmProviderConfig::default(),
            data_path: ingrain_dir.join("data.json"),
            vault_dir: PathBuf::from("."),
            quiz_instruction: None,
            system_prompt: None,
        }
    }
}

impl IngrainConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> IngrainResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| IngrainError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| IngrainError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| IngrainError::Configuration(e.to_string())),
            _ => Err(IngrainError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables over the defaults.
    pub fn from_env() -> IngrainResult<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        config.load_api_key_from_env();
        Ok(config)
    }

    /// Override settings from `INGRAIN_*` environment variables.
    pub fn apply_env(&mut self) -> IngrainResult<()> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Fill in the provider's API key from its environment variable, unless
    /// one is already configured. Call after the provider is settled.
    pub fn load_api_key_from_env(&mut self) {
        self.fill_api_key(|name| std::env::var(name).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> IngrainResult<()> {
        if let Some(provider) = var("INGRAIN_LLM_PROVIDER") {
            self.llm.provider = provider.parse()?;
        }
        if let Some(model) = var("INGRAIN_LLM_MODEL") {
            self.llm.config.model = model;
        }
        if let Some(path) = var("INGRAIN_DATA_PATH") {
            self.data_path = PathBuf::from(path);
        }
        if let Some(dir) = var("INGRAIN_VAULT_DIR") {
            self.vault_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    fn fill_api_key(&mut self, var: impl Fn(&str) -> Option<String>) {
        if self.llm.config.api_key.is_some() {
            return;
        }
        if let Some(key_var) = self.llm.provider.api_key_var() {
            self.llm.config.api_key = var(key_var).filter(|k| !k.trim().is_empty());
        }
    }

    /// Prompt settings for the quiz client.
    pub fn quiz_prompts(&self) -> QuizPrompts {
        QuizPrompts::new(self.quiz_instruction.clone(), self.system_prompt.clone())
    }

    /// Per-request options for the quiz client.
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: Some(self.llm.config.temperature),
            max_tokens: Some(self.llm.config.max_tokens),
            top_p: Some(self.llm.config.top_p),
        }
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> IngrainConfigBuilder {
        IngrainConfigBuilder::default()
    }
}

/// Builder for IngrainConfig.
#[derive(Default)]
pub struct IngrainConfigBuilder {
    config: IngrainConfig,
}

impl IngrainConfigBuilder {
    /// Set LLM configuration.
    pub fn llm(mut self, config: LlmProviderConfig) -> Self {
        self.config.llm = config;
        self
    }

    pub fn provider(mut self, provider: LlmProvider) -> Self {
        self.config.llm.provider = provider;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.llm.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.llm.config.api_key = Some(key.into());
        self
    }

    /// Set review data file path.
    pub fn data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_path = path.into();
        self
    }

    pub fn vault_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.vault_dir = dir.into();
        self
    }

    /// Set custom quiz instruction.
    pub fn quiz_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.config.quiz_instruction = Some(instruction.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> IngrainConfig {
        self.config
    }
}
