//! Deterministic half of the DomScript pipeline: color extraction, the
//! fallback rule engine, prompt enhancement and completion validation.

pub mod color;
pub mod config_check;
pub mod prompt_enhancer;
pub mod rule_engine;
pub mod table;
pub mod validator;

pub use color::{extract_color, find_color, ColorToken, COLOR_VOCABULARY, DEFAULT_COLOR};
pub use config_check::validate_config;
pub use prompt_enhancer::{PromptEnhancer, GENERIC_PREFIX};
pub use rule_engine::{escape_js, RuleEngine, RuleOutputRejection, CATCH_ALL_RULE};
pub use table::{CommandText, PatternRule, PatternTable};
pub use validator::{strip_prompt, CompletionValidator, RejectionReason};
