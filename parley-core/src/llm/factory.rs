//! Factory for creating LLM providers from configuration

use crate::config::{LLMProvider as LLMProviderType, LLMProviderConfig};
use crate::error::Result;
use crate::llm::LLMProvider;
use std::sync::Arc;

#[cfg(feature = "llm-groq")]
use crate::llm::providers::groq::{self, GroqProvider};

/// Factory for creating LLM providers
pub struct LLMProviderFactory;

impl LLMProviderFactory {
    /// Create an LLM provider from configuration
    ///
    /// # Arguments
    ///
    /// * `config` - LLM provider configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be created (e.g., missing API key)
    pub fn create(config: &LLMProviderConfig) -> Result<Arc<dyn LLMProvider>> {
        match config.provider {
            #[cfg(feature = "llm-groq")]
            LLMProviderType::Groq => {
                let model = if !config.model.is_empty() {
                    Some(config.model.clone())
                } else {
                    None
                };

                // If api_key is provided in config, use it, otherwise use from_env
                let provider = if let Some(api_key) = &config.api_key {
                    let model_str = model
                        .or_else(|| std::env::var("GROQ_MODEL").ok())
                        .unwrap_or_else(|| groq::DEFAULT_MODEL.to_string());
                    let base_url = config
                        .base_url
                        .clone()
                        .unwrap_or_else(|| groq::DEFAULT_BASE_URL.to_string());
                    GroqProvider::with_base_url(api_key.clone(), model_str, base_url)
                } else {
                    let provider = GroqProvider::from_env(model)?;
                    match &config.base_url {
                        Some(base_url) => provider.with_endpoint(base_url.clone()),
                        None => provider,
                    }
                };

                Ok(Arc::new(provider.with_timeout(config.timeout)?))
            }

            #[cfg(not(feature = "llm-groq"))]
            LLMProviderType::Groq => Err(crate::error::ParleyError::Configuration(
                "Groq provider requires 'llm-groq' feature".to_string(),
            )),
        }
    }

    /// Create from ParleyConfig (if LLM config is present)
    pub fn from_config(config: Option<&LLMProviderConfig>) -> Result<Option<Arc<dyn LLMProvider>>> {
        match config {
            Some(cfg) => Ok(Some(Self::create(cfg)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_none() {
        let provider = LLMProviderFactory::from_config(None).unwrap();
        assert!(provider.is_none());
    }

    #[cfg(feature = "llm-groq")]
    #[test]
    fn test_create_groq_with_explicit_key() {
        let config = LLMProviderConfig {
            api_key: Some("test-key".to_string()),
            model: "llama-3.1-8b-instant".to_string(),
            ..LLMProviderConfig::groq()
        };

        let provider = LLMProviderFactory::create(&config).unwrap();
        let info = provider.model_info();
        assert_eq!(info.provider, "groq");
        assert_eq!(info.model_name, "llama-3.1-8b-instant");
    }

    #[cfg(not(feature = "llm-groq"))]
    #[test]
    fn test_create_groq_without_feature() {
        let result = LLMProviderFactory::create(&LLMProviderConfig::groq());
        assert!(result.is_err());
    }
}
