//! Configuration types for Parley

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ParleyError, Result};

/// Main configuration for Parley
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParleyConfig {
    /// LLM provider configuration (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<LLMProviderConfig>,

    /// Conversation memory configuration
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Field extraction configuration
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

/// Conversation memory configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Maximum number of messages kept verbatim
    pub max_turns: usize,

    /// Maximum aggregate characters across kept messages
    pub max_chars: usize,

    /// Summarize every N added messages
    pub summarize_every: usize,

    /// Sampling temperature for summary generation
    pub summary_temperature: f32,

    /// Generation cap for summary generation
    pub summary_max_tokens: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_turns: 10,
            max_chars: 4000,
            summarize_every: 3,
            summary_temperature: 0.3,
            summary_max_tokens: 300,
        }
    }
}

impl ConversationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn with_summarize_every(mut self, turns: usize) -> Self {
        self.summarize_every = turns.max(1);
        self
    }

    pub fn with_summary_temperature(mut self, temperature: f32) -> Self {
        self.summary_temperature = temperature.clamp(0.0, 2.0);
        self
    }

    pub fn with_summary_max_tokens(mut self, tokens: usize) -> Self {
        self.summary_max_tokens = tokens;
        self
    }

    /// Clamp zero limits that would otherwise break the cadence or empty the buffer.
    pub(crate) fn normalized(mut self) -> Self {
        self.max_turns = self.max_turns.max(1);
        self.summarize_every = self.summarize_every.max(1);
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_turns` or `summarize_every` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_turns == 0 {
            return Err(ParleyError::Configuration(
                "conversation.max_turns must be at least 1".to_string(),
            ));
        }
        if self.summarize_every == 0 {
            return Err(ParleyError::Configuration(
                "conversation.summarize_every must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Field extraction configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Sampling temperature for extraction (near zero)
    pub temperature: f32,

    /// Generation cap for the function-call payload
    pub max_tokens: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 500,
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMProviderConfig {
    /// Provider type
    pub provider: LLMProvider,

    /// Model name (empty means provider default)
    #[serde(default)]
    pub model: String,

    /// API key (if needed, prefer env vars)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL (for OpenAI-compatible endpoints)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Per-request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

impl LLMProviderConfig {
    /// Groq with the default model, key taken from `GROQ_API_KEY`
    pub fn groq() -> Self {
        Self {
            provider: LLMProvider::Groq,
            model: String::new(),
            api_key: None,
            base_url: None,
            timeout: default_timeout(),
        }
    }
}

/// LLM provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LLMProvider {
    Groq,
}

impl ParleyConfig {
    /// Load configuration from files and environment variables.
    ///
    /// Loads in this order:
    /// 1. Default configuration
    /// 2. `parley/parley.toml` in the user config directory
    /// 3. `parley.toml` in the working directory
    /// 4. File named by `PARLEY_CONFIG_PATH`
    /// 5. `PARLEY_` environment variables (`PARLEY_CONVERSATION__MAX_TURNS=20`)
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is invalid.
    pub fn load() -> Result<Self> {
        use figment::{
            Figment,
            providers::{Env, Format, Serialized, Toml},
        };

        let mut figment = Figment::from(Serialized::defaults(ParleyConfig::default()));

        if let Some(dir) = dirs::config_dir() {
            figment = figment.merge(Toml::file(dir.join("parley").join("parley.toml")));
        }

        figment = figment.merge(Toml::file("parley.toml"));

        if let Ok(path) = std::env::var("PARLEY_CONFIG_PATH") {
            figment = figment.merge(Toml::file(path));
        }

        let config: ParleyConfig = figment
            .merge(Env::prefixed("PARLEY_").ignore(&["CONFIG_PATH"]).split("__"))
            .extract()
            .map_err(|e| {
                ParleyError::Configuration(format!("Failed to load configuration: {}", e))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        use figment::{
            Figment,
            providers::{Format, Serialized, Toml},
        };

        let path: PathBuf = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ParleyError::Configuration(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let config: ParleyConfig = Figment::from(Serialized::defaults(ParleyConfig::default()))
            .merge(Toml::file(&path))
            .extract()
            .map_err(|e| {
                ParleyError::Configuration(format!("Failed to load configuration file: {}", e))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        self.conversation.validate()
    }
}
