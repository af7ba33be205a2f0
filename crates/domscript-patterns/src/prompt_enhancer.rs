use tracing::debug;

use crate::color::mentions_basic_color;
use crate::table::{body_style_prefix, for_each_style_prefix, CommandText, PatternRule, PatternTable};

/// Prefix used when no specific rule matches
pub const GENERIC_PREFIX: &str = "document.querySelectorAll";

/// Rewrites a command into an unterminated code prefix for a completion
/// model to continue.
#[derive(Debug, Clone)]
pub struct PromptEnhancer {
    table: PatternTable,
}

impl Default for PromptEnhancer {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptEnhancer {
    pub fn new() -> Self {
        Self {
            table: PatternTable::new(enhancer_rules()),
        }
    }

    pub fn enhance(&self, command: &str) -> String {
        let text = CommandText::new(command);
        let prefix = match self.table.first_match(&text) {
            Some(rule) => (rule.render)(&text),
            None => GENERIC_PREFIX.to_string(),
        };
        debug!(command, prefix = %prefix, "enhanced prompt");
        prefix
    }

    pub fn table(&self) -> &PatternTable {
        &self.table
    }
}

fn enhancer_rules() -> Vec<PatternRule> {
    vec![
        PatternRule {
            name: "button-color",
            matches: |c| c.has("button") && mentions_basic_color(c.lower()),
            render: |c| for_each_style_prefix("button", "btn", "backgroundColor", c.color().as_str()),
        },
        PatternRule {
            name: "background-color",
            matches: |c| c.has("background") && mentions_basic_color(c.lower()),
            render: |c| body_style_prefix("backgroundColor", c.color().as_str()),
        },
        PatternRule {
            name: "hide-images",
            matches: |c| c.has("hide") && c.has("image"),
            render: |_| for_each_style_prefix("img", "img", "display", "none"),
        },
        PatternRule {
            name: "hide-buttons",
            matches: |c| c.has("hide") && c.has("button"),
            render: |_| for_each_style_prefix("button", "btn", "display", "none"),
        },
    ]
}
