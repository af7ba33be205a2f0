use crate::completion_provider::CompletionProvider;
use crate::ollama_client::{OllamaClient, OllamaConfig};
use anyhow::{anyhow, Result};
use domscript_core::ModelConfig;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "huggingface")]
use crate::huggingface_provider::{HuggingFaceConfig, HuggingFaceProvider};

#[cfg(feature = "openai-compatible")]
use crate::openai_compatible_provider::{OpenAICompatibleConfig, OpenAICompatibleProvider};

const DEFAULT_OLLAMA_MODEL: &str = "qwen2.5-coder:1.5b";
const DEFAULT_HUGGINGFACE_MODEL: &str = "Salesforce/codegen-350M-mono";

/// Factory for creating completion providers based on configuration
pub struct CompletionProviderFactory;

impl CompletionProviderFactory {
    /// Create a completion provider from configuration
    pub fn create_from_config(config: &ModelConfig) -> Result<Arc<dyn CompletionProvider>> {
        if !config.enabled {
            return Err(anyhow!("Model is not enabled in configuration"));
        }

        let provider_name = config.provider.to_lowercase();

        match provider_name.as_str() {
            "ollama" => Self::create_ollama_provider(config),
            #[cfg(feature = "openai-compatible")]
            "openai-compatible" => Self::create_openai_compatible_provider(config),
            #[cfg(feature = "huggingface")]
            "huggingface" => Self::create_huggingface_provider(config),
            _ => Err(anyhow!(
                "Unsupported completion provider: {}. Available providers: {}",
                provider_name,
                Self::supported_providers().join(", ")
            )),
        }
    }

    fn create_ollama_provider(config: &ModelConfig) -> Result<Arc<dyn CompletionProvider>> {
        let ollama_config = OllamaConfig {
            model_name: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
            ..Default::default()
        };

        Ok(Arc::new(OllamaClient::new(ollama_config)))
    }

    #[cfg(feature = "openai-compatible")]
    fn create_openai_compatible_provider(
        config: &ModelConfig,
    ) -> Result<Arc<dyn CompletionProvider>> {
        let base_url = config.openai_compatible_url.clone().ok_or_else(|| {
            anyhow!("OpenAI-compatible base URL not found. Set 'openai_compatible_url' in config")
        })?;

        let compat_config = OpenAICompatibleConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config
                .model
                .clone()
                .ok_or_else(|| anyhow!("Model name is required for OpenAI-compatible provider"))?,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
            api_key: config.api_key.clone(),
            provider_name: "openai-compatible".to_string(),
        };

        Ok(Arc::new(OpenAICompatibleProvider::new(compat_config)?))
    }

    #[cfg(feature = "huggingface")]
    fn create_huggingface_provider(config: &ModelConfig) -> Result<Arc<dyn CompletionProvider>> {
        let hf_config = HuggingFaceConfig {
            base_url: config.huggingface_url.clone(),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_HUGGINGFACE_MODEL.to_string()),
            api_key: config
                .api_key
                .clone()
                .or_else(|| std::env::var("HF_TOKEN").ok()),
            timeout_secs: config.timeout_secs,
        };

        Ok(Arc::new(HuggingFaceProvider::new(hf_config)?))
    }

    /// Get a list of supported providers (based on enabled features)
    pub fn supported_providers() -> Vec<&'static str> {
        let mut providers = vec!["ollama"];

        #[cfg(feature = "openai-compatible")]
        providers.push("openai-compatible");

        #[cfg(feature = "huggingface")]
        providers.push("huggingface");

        providers
    }
}
