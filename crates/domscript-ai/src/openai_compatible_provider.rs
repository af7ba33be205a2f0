use crate::completion_provider::*;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for servers exposing the legacy `/v1/completions` endpoint
/// (LM Studio, llama.cpp server, vLLM, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAICompatibleConfig {
    /// Base URL for the API (e.g., "http://localhost:1234/v1")
    pub base_url: String,
    /// Model to use
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum retries for failed requests
    pub max_retries: u32,
    /// Optional API key (some providers require it, some don't)
    pub api_key: Option<String>,
    /// Provider name for display purposes
    pub provider_name: String,
}

impl Default for OpenAICompatibleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234/v1".to_string(),
            model: "local-model".to_string(),
            timeout_secs: 30,
            max_retries: 2,
            api_key: None,
            provider_name: "openai-compatible".to_string(),
        }
    }
}

/// OpenAI-compatible completion provider
pub struct OpenAICompatibleProvider {
    config: OpenAICompatibleConfig,
    client: Client,
}

impl OpenAICompatibleProvider {
    /// Create a new OpenAI-compatible provider
    pub fn new(config: OpenAICompatibleConfig) -> CompletionResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CompletionError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    fn build_request<'a>(&'a self, prefix: &'a str, options: &CompletionOptions) -> CompletionsRequest<'a> {
        CompletionsRequest {
            model: &self.config.model,
            prompt: prefix,
            max_tokens: options.max_new_tokens,
            temperature: options.temperature(),
            top_p: if options.sampling { options.top_p } else { None },
            repetition_penalty: options.repetition_penalty,
            seed: options.deterministic.then_some(DETERMINISTIC_SEED),
            echo: true,
            stream: false,
        }
    }

    /// Send a request with retry logic
    async fn send_request(&self, request: &CompletionsRequest<'_>) -> CompletionResult<String> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = Duration::from_secs(2u64.pow(attempt - 1));
                tokio::time::sleep(delay).await;
            }

            match self.try_request(request).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    if attempt < self.config.max_retries {
                        tracing::warn!(
                            "{} request failed (attempt {}/{}): {}, retrying...",
                            self.config.provider_name,
                            attempt + 1,
                            self.config.max_retries + 1,
                            e
                        );
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| CompletionError::Backend("All retry attempts failed".to_string())))
    }

    async fn try_request(&self, request: &CompletionsRequest<'_>) -> CompletionResult<String> {
        let mut request_builder = self
            .client
            .post(format!("{}/completions", self.config.base_url))
            .json(request);

        if let Some(api_key) = &self.config.api_key {
            request_builder = request_builder.bearer_auth(api_key);
        }

        let response = request_builder
            .send()
            .await
            .map_err(|e| CompletionError::from_transport(e, self.timeout()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(CompletionError::Backend(format!(
                "{} API error ({}): {}",
                self.config.provider_name, status, error_text
            )));
        }

        let body: CompletionsResponse = response.json().await.map_err(|e| {
            CompletionError::Backend(format!(
                "Failed to parse {} completions response: {}",
                self.config.provider_name, e
            ))
        })?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or_else(|| CompletionError::Backend("No choices in response".to_string()))
    }
}

#[async_trait]
impl CompletionProvider for OpenAICompatibleProvider {
    async fn complete(
        &self,
        prefix: &str,
        options: &CompletionOptions,
    ) -> CompletionResult<String> {
        let request = self.build_request(prefix, options);
        let text = self.send_request(&request).await?;
        // Not every server honors `echo`
        Ok(with_echo(prefix, text))
    }

    async fn is_available(&self) -> bool {
        let mut request_builder = self
            .client
            .get(format!("{}/models", self.config.base_url));
        if let Some(api_key) = &self.config.api_key {
            request_builder = request_builder.bearer_auth(api_key);
        }

        matches!(request_builder.send().await, Ok(response) if response.status().is_success())
    }

    fn provider_name(&self) -> &str {
        &self.config.provider_name
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
struct CompletionsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: usize,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    /// Non-standard, understood by vLLM and llama.cpp
    #[serde(skip_serializing_if = "Option::is_none")]
    repetition_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    echo: bool,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionsResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let provider = OpenAICompatibleProvider::new(OpenAICompatibleConfig::default()).unwrap();
        let request = provider.build_request("document.", &CompletionOptions::deterministic(20));
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["prompt"], "document.");
        assert_eq!(value["max_tokens"], 20);
        assert_eq!(value["echo"], true);
        assert_eq!(value["seed"], 0);
        assert!(value.get("top_p").is_none());
    }

    #[test]
    fn test_parse_completions_response() {
        let body: CompletionsResponse = serde_json::from_str(
            r#"{"id":"cmpl-1","object":"text_completion","choices":[{"text":"x);","index":0,"finish_reason":"length"}]}"#,
        )
        .unwrap();
        assert_eq!(body.choices[0].text, "x);");
    }
}
