use domscript_core::{RepairRules, ValidationRules};
use thiserror::Error;
use tracing::debug;

/// Why a model completion was not used
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    #[error("completion was empty after removing the prompt")]
    Empty,

    #[error("completion too short ({len} chars)")]
    TooShort { len: usize },

    #[error("completion does not reference {0}")]
    MissingRootReference(String),

    #[error("completion neither styles nor queries elements")]
    MissingDomAccess,

    #[error("completion is not terminated with {0}")]
    Unterminated(String),

    #[error("completion contains foreign token {0:?}")]
    ForeignToken(String),
}

/// Cleans up, repairs and accepts or rejects raw model output.
#[derive(Debug, Clone)]
pub struct CompletionValidator {
    rules: ValidationRules,
    foreign_tokens: Vec<String>,
}

impl Default for CompletionValidator {
    fn default() -> Self {
        Self::new(ValidationRules::default())
    }
}

impl CompletionValidator {
    pub fn new(rules: ValidationRules) -> Self {
        let foreign_tokens = rules
            .foreign_tokens
            .iter()
            .map(|token| token.to_lowercase())
            .collect();
        Self {
            rules,
            foreign_tokens,
        }
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Full pipeline: strip the echoed prompt, normalize, repair, accept.
    pub fn review(&self, raw: &str, prompt: &str) -> Result<String, RejectionReason> {
        let stripped = strip_prompt(raw, prompt);
        if stripped.is_empty() {
            return Err(RejectionReason::Empty);
        }
        let len = stripped.chars().count();
        if len <= self.rules.min_raw_len {
            return Err(RejectionReason::TooShort { len });
        }

        let single_line = stripped
            .replace("\r\n", " ")
            .replace(['\n', '\r'], " ")
            .trim()
            .to_string();
        let repaired = repair(single_line, &self.rules.repair);
        debug!(repaired = %repaired, "repaired completion");

        self.accept(&repaired)?;
        Ok(repaired)
    }

    /// Acceptance predicate alone, no stripping or repair
    pub fn accept(&self, code: &str) -> Result<(), RejectionReason> {
        let len = code.chars().count();
        if len <= self.rules.min_len {
            return Err(RejectionReason::TooShort { len });
        }
        if !code.contains(self.rules.root_token.as_str()) {
            return Err(RejectionReason::MissingRootReference(
                self.rules.root_token.clone(),
            ));
        }
        if !self
            .rules
            .dom_access_tokens
            .iter()
            .any(|token| code.contains(token.as_str()))
        {
            return Err(RejectionReason::MissingDomAccess);
        }
        if !code.ends_with(self.rules.terminator.as_str()) {
            return Err(RejectionReason::Unterminated(self.rules.terminator.clone()));
        }

        let lower = code.to_lowercase();
        if let Some(token) = self
            .foreign_tokens
            .iter()
            .find(|token| lower.contains(token.as_str()))
        {
            return Err(RejectionReason::ForeignToken(token.clone()));
        }

        Ok(())
    }

    pub fn is_acceptable(&self, code: &str) -> bool {
        self.accept(code).is_ok()
    }
}

/// Remove every occurrence of `prompt` from `raw` and trim.
pub fn strip_prompt(raw: &str, prompt: &str) -> String {
    if prompt.is_empty() {
        return raw.trim().to_string();
    }
    raw.replace(prompt, "").trim().to_string()
}

/// Close an unterminated iteration call or style assignment.
fn repair(mut code: String, rules: &RepairRules) -> String {
    let ends_quoted = code.ends_with(rules.quote.as_str());

    if code.contains(rules.iteration_marker.as_str())
        && !code.ends_with(rules.iteration_end.as_str())
    {
        code.push_str(if ends_quoted {
            &rules.iteration_close_quoted
        } else {
            &rules.iteration_close_open_string
        });
    } else if code.contains(rules.style_marker.as_str()) && !code.ends_with(rules.style_end.as_str())
    {
        code.push_str(if ends_quoted {
            &rules.style_close_quoted
        } else {
            &rules.style_close_open_string
        });
    }

    code
}
