use domscript_core::{ConfigError, ConfigManager, DomScriptConfig};

use crate::rule_engine::RuleEngine;
use crate::validator::CompletionValidator;

/// Full configuration check: the structural checks of
/// [`ConfigManager::validate_config`] plus a rendering of every rule through
/// the configured validator.
///
/// Fallback snippets are returned without review, so a `[validation]` table
/// that would reject them is refused here rather than at request time.
pub fn validate_config(config: &DomScriptConfig) -> Result<(), ConfigError> {
    ConfigManager::validate_config(config)?;

    let engine = RuleEngine::new(&config.validation);
    let validator = CompletionValidator::new(config.validation.clone());
    engine.check_output(&validator).map_err(|rejection| {
        ConfigError::ValidationError(format!(
            "validation rules reject the {} rule output for {:?}: {}",
            rejection.rule, rejection.command, rejection.reason
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_foreign_token(token: &str) -> DomScriptConfig {
        let mut config = DomScriptConfig::default();
        config.validation.foreign_tokens.push(token.to_string());
        config
    }

    #[test]
    fn test_default_config_passes() {
        assert!(validate_config(&DomScriptConfig::default()).is_ok());
    }

    #[test]
    fn test_tokens_from_fixed_templates_are_refused() {
        for token in ["console", "setTimeout", "querySelectorAll", "fontWeight"] {
            let config = with_foreign_token(token);
            assert!(
                ConfigManager::validate_config(&config).is_ok(),
                "{token} is structurally fine"
            );
            match validate_config(&config) {
                Err(ConfigError::ValidationError(message)) => {
                    assert!(message.contains(&token.to_lowercase()), "{message}");
                }
                other => panic!("{token} accepted: {other:?}"),
            }
        }
    }

    #[test]
    fn test_blank_token_is_refused() {
        assert!(matches!(
            validate_config(&with_foreign_token("")),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_unrelated_token_is_accepted() {
        assert!(validate_config(&with_foreign_token("eval(")).is_ok());
    }
}
