use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which generator produced a snippet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Model completion accepted by the validator
    Ai,
    /// Deterministic rule engine output
    Fallback,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Ai => write!(f, "ai"),
            Source::Fallback => write!(f, "fallback"),
        }
    }
}

/// Snippet returned for a single command.
///
/// Built once per request and never mutated afterwards, so the fields are
/// only exposed through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    code: String,
    source: Source,
    prompt: String,
    timestamp: DateTime<Utc>,
}

impl GenerationResult {
    pub fn new(code: impl Into<String>, source: Source, prompt: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            source,
            prompt: prompt.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn ai(code: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::new(code, Source::Ai, prompt)
    }

    pub fn fallback(code: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::new(code, Source::Fallback, prompt)
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_ai(&self) -> bool {
        self.source == Source::Ai
    }
}
