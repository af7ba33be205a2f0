use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors a completion backend can fail with
#[derive(Error, Debug)]
pub enum CompletionError {
    /// Backend not reachable or not loaded
    #[error("Model unavailable: {0}")]
    Unavailable(String),

    /// No answer within the allotted time
    #[error("Model timeout after {0:?}")]
    Timeout(Duration),

    /// Backend answered with an error or an unreadable payload
    #[error("Model error: {0}")]
    Backend(String),
}

impl CompletionError {
    /// Classify a transport error from `reqwest`
    pub fn from_transport(error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            CompletionError::Timeout(timeout)
        } else if error.is_connect() {
            CompletionError::Unavailable(error.to_string())
        } else {
            CompletionError::Backend(error.to_string())
        }
    }
}

/// Result type for completion operations
pub type CompletionResult<T> = std::result::Result<T, CompletionError>;

/// Generation parameters for a single continuation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// Maximum tokens to append to the prefix
    pub max_new_tokens: usize,
    /// Sample from the distribution instead of greedy decoding
    pub sampling: bool,
    /// Top-p nucleus sampling parameter (ignored when not sampling)
    pub top_p: Option<f32>,
    /// Penalty for repeated tokens, 1.0 = none
    pub repetition_penalty: Option<f32>,
    /// Ask the backend for reproducible output (fixed seed, zero temperature)
    pub deterministic: bool,
}

impl CompletionOptions {
    /// Sampled generation used for user requests
    pub fn sampled(max_new_tokens: usize, top_p: f32, repetition_penalty: f32) -> Self {
        Self {
            max_new_tokens,
            sampling: true,
            top_p: Some(top_p),
            repetition_penalty: Some(repetition_penalty),
            deterministic: false,
        }
    }

    /// Greedy, reproducible generation used by the quality gate
    pub fn deterministic(max_new_tokens: usize) -> Self {
        Self {
            max_new_tokens,
            sampling: false,
            top_p: None,
            repetition_penalty: None,
            deterministic: true,
        }
    }

    /// Temperature to send to backends that expose one
    pub fn temperature(&self) -> f32 {
        if self.sampling && !self.deterministic {
            SAMPLING_TEMPERATURE
        } else {
            0.0
        }
    }
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self::sampled(40, 0.85, 1.1)
    }
}

const SAMPLING_TEMPERATURE: f32 = 1.0;

/// Seed sent with deterministic requests
pub const DETERMINISTIC_SEED: u64 = 0;

/// A text continuation service.
///
/// `complete` returns the generated text; it may or may not repeat the
/// prefix, callers strip it either way.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Continue `prefix`
    async fn complete(&self, prefix: &str, options: &CompletionOptions)
        -> CompletionResult<String>;

    /// Check if the provider is available and ready
    async fn is_available(&self) -> bool;

    /// Get the name of this provider
    fn provider_name(&self) -> &str;

    /// Get the model identifier
    fn model_name(&self) -> &str;
}

/// Prepend `prefix` unless the backend already echoed it
pub(crate) fn with_echo(prefix: &str, generated: String) -> String {
    if generated.starts_with(prefix) {
        generated
    } else {
        format!("{prefix}{generated}")
    }
}
