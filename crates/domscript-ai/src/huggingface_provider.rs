use crate::completion_provider::*;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Hugging Face text-generation inference endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuggingFaceConfig {
    /// Base URL; the model id is appended as a path segment
    pub base_url: String,
    /// Repository id, e.g. "Salesforce/codegen-350M-mono"
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api-inference.huggingface.co/models".to_string(),
            model: "Salesforce/codegen-350M-mono".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

pub struct HuggingFaceProvider {
    config: HuggingFaceConfig,
    client: Client,
}

impl HuggingFaceProvider {
    pub fn new(config: HuggingFaceConfig) -> CompletionResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CompletionError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_request<'a>(&self, prefix: &'a str, options: &CompletionOptions) -> InferenceRequest<'a> {
        InferenceRequest {
            inputs: prefix,
            parameters: InferenceParameters {
                max_new_tokens: options.max_new_tokens,
                do_sample: options.sampling && !options.deterministic,
                top_p: if options.sampling { options.top_p } else { None },
                repetition_penalty: options.repetition_penalty,
                seed: options.deterministic.then_some(DETERMINISTIC_SEED),
                return_full_text: true,
            },
            options: InferenceOptions {
                wait_for_model: true,
                use_cache: !options.sampling,
            },
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }
}

#[async_trait]
impl CompletionProvider for HuggingFaceProvider {
    async fn complete(
        &self,
        prefix: &str,
        options: &CompletionOptions,
    ) -> CompletionResult<String> {
        let start_time = Instant::now();
        let mut request_builder = self
            .client
            .post(self.endpoint())
            .json(&self.build_request(prefix, options));
        if let Some(api_key) = &self.config.api_key {
            request_builder = request_builder.bearer_auth(api_key);
        }

        let response = request_builder
            .send()
            .await
            .map_err(|e| CompletionError::from_transport(e, self.timeout()))?;

        let status = response.status();
        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Err(CompletionError::Unavailable(format!(
                "{} is still loading",
                self.config.model
            )));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CompletionError::Backend(format!(
                "Hugging Face API error ({}): {}",
                status, error_text
            )));
        }

        let generations: Vec<Generation> = response.json().await.map_err(|e| {
            CompletionError::Backend(format!("Failed to parse Hugging Face response: {}", e))
        })?;

        debug!(
            "Hugging Face completion: {}ms",
            start_time.elapsed().as_millis()
        );

        generations
            .into_iter()
            .next()
            .map(|generation| with_echo(prefix, generation.generated_text))
            .ok_or_else(|| CompletionError::Backend("Empty generation list".to_string()))
    }

    async fn is_available(&self) -> bool {
        let mut request_builder = self.client.get(self.endpoint());
        if let Some(api_key) = &self.config.api_key {
            request_builder = request_builder.bearer_auth(api_key);
        }
        matches!(request_builder.send().await, Ok(response) if response.status().is_success())
    }

    fn provider_name(&self) -> &str {
        "huggingface"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
    options: InferenceOptions,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_new_tokens: usize,
    do_sample: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repetition_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    return_full_text: bool,
}

#[derive(Debug, Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
    use_cache: bool,
}

#[derive(Debug, Deserialize)]
struct Generation {
    generated_text: String,
}
