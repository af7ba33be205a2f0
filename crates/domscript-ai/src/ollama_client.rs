use crate::completion_provider::*;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info};

/// Raw-mode completion client for a local Ollama server
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub model_name: String,
    pub base_url: String,
    pub context_window: usize,
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            model_name: "qwen2.5-coder:1.5b".to_string(),
            base_url: "http://localhost:11434".to_string(),
            context_window: 4096,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    /// Skip the chat template; the prefix is code to continue
    raw: bool,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: usize,
    num_ctx: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repeat_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    eval_count: Option<usize>,
}

pub struct OllamaClient {
    client: Client,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn request_options(&self, options: &CompletionOptions) -> GenerateOptions {
        GenerateOptions {
            temperature: options.temperature(),
            num_predict: options.max_new_tokens,
            num_ctx: self.config.context_window,
            top_p: if options.sampling { options.top_p } else { None },
            repeat_penalty: options.repetition_penalty,
            seed: options.deterministic.then_some(DETERMINISTIC_SEED),
        }
    }

    /// Check if the configured model is pulled on the server
    pub async fn check_availability(&self) -> CompletionResult<bool> {
        debug!("Checking Ollama availability at {}", self.config.base_url);

        let probe_timeout = Duration::from_secs(5);
        let response = timeout(
            probe_timeout,
            self.client
                .get(format!("{}/api/tags", self.config.base_url))
                .send(),
        )
        .await
        .map_err(|_| CompletionError::Timeout(probe_timeout))?
        .map_err(|e| CompletionError::from_transport(e, probe_timeout))?;

        if !response.status().is_success() {
            return Ok(false);
        }

        let models: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CompletionError::Backend(format!("Failed to parse models response: {}", e)))?;

        let wanted = self.config.model_name.as_str();
        let has_model = models["models"]
            .as_array()
            .map(|models| {
                models.iter().any(|model| {
                    model["name"]
                        .as_str()
                        .map(|name| name == wanted || name.starts_with(&format!("{wanted}:")))
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false);

        info!("Ollama model {} availability: {}", wanted, has_model);
        Ok(has_model)
    }
}

#[async_trait]
impl CompletionProvider for OllamaClient {
    async fn complete(
        &self,
        prefix: &str,
        options: &CompletionOptions,
    ) -> CompletionResult<String> {
        let start_time = Instant::now();
        let request = GenerateRequest {
            model: &self.config.model_name,
            prompt: prefix,
            raw: true,
            stream: false,
            options: self.request_options(options),
        };

        let response = timeout(
            self.config.timeout,
            self.client
                .post(format!("{}/api/generate", self.config.base_url))
                .json(&request)
                .send(),
        )
        .await
        .map_err(|_| CompletionError::Timeout(self.config.timeout))?
        .map_err(|e| CompletionError::from_transport(e, self.config.timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CompletionError::Backend(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let response_data: GenerateResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Backend(format!("Failed to parse Ollama response: {}", e)))?;

        debug!(
            "Ollama completion: {}ms, {} tokens",
            start_time.elapsed().as_millis(),
            response_data.eval_count.unwrap_or(0)
        );

        Ok(with_echo(prefix, response_data.response))
    }

    async fn is_available(&self) -> bool {
        self.check_availability().await.unwrap_or(false)
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_request_pins_seed() {
        let client = OllamaClient::new(OllamaConfig::default());
        let options = client.request_options(&CompletionOptions::deterministic(20));

        assert_eq!(options.temperature, 0.0);
        assert_eq!(options.num_predict, 20);
        assert_eq!(options.seed, Some(DETERMINISTIC_SEED));
        assert_eq!(options.top_p, None);
    }

    #[test]
    fn test_sampled_request_serializes_penalties() {
        let client = OllamaClient::new(OllamaConfig::default());
        let request = GenerateRequest {
            model: "m",
            prompt: "document.body",
            raw: true,
            stream: false,
            options: client.request_options(&CompletionOptions::default()),
        };
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["raw"], true);
        assert_eq!(value["options"]["num_predict"], 40);
        assert!(value["options"]["top_p"].is_number());
        assert!(value["options"]["repeat_penalty"].is_number());
        assert!(value["options"].get("seed").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_not_available() {
        let client = OllamaClient::new(OllamaConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_millis(500),
            ..Default::default()
        });
        assert!(!client.is_available().await);
    }
}
