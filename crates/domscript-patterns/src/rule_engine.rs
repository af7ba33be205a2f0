use domscript_core::ValidationRules;
use tracing::debug;

use crate::table::{body_style_prefix, for_each_style_prefix, CommandText, PatternRule, PatternTable};
use crate::validator::{CompletionValidator, RejectionReason};

pub const CATCH_ALL_RULE: &str = "catch-all";

/// One command per table rule, in table order
const RULE_SAMPLES: &[&str] = &[
    "make buttons red",
    "set the background to blue",
    "change text color to green",
    "hide buttons",
    "show buttons",
    "hide images",
    "show images",
    "make images smaller",
    "make images larger",
    "make text larger",
    "make text smaller",
    "bold",
    "italic",
];

/// A rule whose rendered snippet fails the acceptance predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutputRejection {
    pub rule: &'static str,
    pub command: String,
    pub reason: RejectionReason,
}

/// Deterministic command-to-snippet mapping.
///
/// Total: every command yields a terminated snippet. Templates are literals
/// chosen to satisfy the completion validator with default rules.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    table: PatternTable,
    foreign_tokens: Vec<String>,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(&ValidationRules::default())
    }
}

impl RuleEngine {
    /// `rules` supplies the denylist the catch-all must avoid echoing
    pub fn new(rules: &ValidationRules) -> Self {
        Self {
            table: PatternTable::new(default_rules()),
            foreign_tokens: rules
                .foreign_tokens
                .iter()
                .map(|token| token.to_lowercase())
                .collect(),
        }
    }

    pub fn render(&self, command: &str) -> String {
        let text = CommandText::new(command);
        match self.table.first_match(&text) {
            Some(rule) => {
                debug!(rule = rule.name, "rule engine match");
                (rule.render)(&text)
            }
            None => {
                debug!(rule = CATCH_ALL_RULE, "rule engine match");
                self.catch_all(&text)
            }
        }
    }

    /// Name of the rule that would handle `command`
    pub fn matched_rule(&self, command: &str) -> &'static str {
        let text = CommandText::new(command);
        self.table
            .first_match(&text)
            .map(|rule| rule.name)
            .unwrap_or(CATCH_ALL_RULE)
    }

    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    /// Run one rendering per table rule, plus the catch-all in both its
    /// literal and spelled-out forms, through `validator`.
    ///
    /// Rule output is not reviewed at request time.
    pub fn check_output(&self, validator: &CompletionValidator) -> Result<(), RuleOutputRejection> {
        let denylisted = self.foreign_tokens.join(" ");
        let mut commands: Vec<&str> = RULE_SAMPLES.to_vec();
        commands.push("do a barrel roll");
        commands.push(&denylisted);

        for command in commands {
            if let Err(reason) = validator.accept(&self.render(command)) {
                return Err(RuleOutputRejection {
                    rule: self.matched_rule(command),
                    command: command.to_string(),
                    reason,
                });
            }
        }
        Ok(())
    }

    /// Logs the command and flashes a border so the user sees something ran.
    ///
    /// The command is embedded as a string literal unless that would put a
    /// denylisted token into the snippet, in which case it is spelled out as
    /// UTF-16 code units.
    fn catch_all(&self, text: &CommandText<'_>) -> String {
        let literal = catch_all_snippet(&format!("'Extension executed: {}'", escape_js(text.raw())));
        if !self.contains_foreign_token(&literal) {
            return literal;
        }

        let codes = text
            .raw()
            .encode_utf16()
            .map(|unit| unit.to_string())
            .collect::<Vec<_>>()
            .join(",");
        catch_all_snippet(&format!(
            "'Extension executed: ' + String.fromCharCode({codes})"
        ))
    }

    fn contains_foreign_token(&self, snippet: &str) -> bool {
        let lower = snippet.to_lowercase();
        self.foreign_tokens
            .iter()
            .any(|token| lower.contains(token.as_str()))
    }
}

fn catch_all_snippet(message: &str) -> String {
    format!(
        "console.log({message}); document.body.style.border = '2px solid green'; \
         setTimeout(() => document.body.style.border = '', 2000);"
    )
}

/// Escape `text` for a single-quoted JS string literal
pub fn escape_js(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '\u{2028}' | '\u{2029}' => escaped.push_str(&format!("\\u{:04x}", ch as u32)),
            c if c.is_control() => escaped.push_str(&format!("\\u{:04x}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}

fn closed(prefix: String) -> String {
    format!("{prefix});")
}

fn terminated(prefix: String) -> String {
    format!("{prefix};")
}

fn default_rules() -> Vec<PatternRule> {
    vec![
        PatternRule {
            name: "button-color",
            matches: |c| c.has("button") && c.has_color(),
            render: |c| {
                closed(for_each_style_prefix(
                    "button",
                    "btn",
                    "backgroundColor",
                    c.color().as_str(),
                ))
            },
        },
        PatternRule {
            name: "background-color",
            matches: |c| c.has("background") && c.has_color(),
            render: |c| terminated(body_style_prefix("backgroundColor", c.color().as_str())),
        },
        PatternRule {
            name: "text-color",
            matches: |c| c.has("text") && c.has_color() && c.has("color"),
            render: |c| terminated(body_style_prefix("color", c.color().as_str())),
        },
        PatternRule {
            name: "hide-buttons",
            matches: |c| c.has("hide") && c.has("button"),
            render: |_| closed(for_each_style_prefix("button", "btn", "display", "none")),
        },
        PatternRule {
            name: "show-buttons",
            matches: |c| c.has("show") && c.has("button"),
            render: |_| closed(for_each_style_prefix("button", "btn", "display", "block")),
        },
        PatternRule {
            name: "hide-images",
            matches: |c| c.has("hide") && c.has_any(&["image", "img"]),
            render: |_| closed(for_each_style_prefix("img", "img", "display", "none")),
        },
        PatternRule {
            name: "show-images",
            matches: |c| c.has("show") && c.has_any(&["image", "img"]),
            render: |_| closed(for_each_style_prefix("img", "img", "display", "block")),
        },
        PatternRule {
            name: "shrink-images",
            matches: |c| c.has_any(&["small", "smaller"]) && c.has("image"),
            render: |_| closed(for_each_style_prefix("img", "img", "width", "50px")),
        },
        PatternRule {
            name: "enlarge-images",
            matches: |c| c.has_any(&["big", "larger"]) && c.has("image"),
            render: |_| closed(for_each_style_prefix("img", "img", "width", "200px")),
        },
        PatternRule {
            name: "enlarge-text",
            matches: |c| c.has("text") && c.has_any(&["big", "larger"]),
            render: |_| terminated(body_style_prefix("fontSize", "20px")),
        },
        PatternRule {
            name: "shrink-text",
            matches: |c| c.has("text") && c.has_any(&["small", "smaller"]),
            render: |_| terminated(body_style_prefix("fontSize", "12px")),
        },
        PatternRule {
            name: "bold-text",
            matches: |c| c.has("bold"),
            render: |_| terminated(body_style_prefix("fontWeight", "bold")),
        },
        PatternRule {
            name: "italic-text",
            matches: |c| c.has("italic"),
            render: |_| terminated(body_style_prefix("fontStyle", "italic")),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> RuleEngine {
        RuleEngine::default()
    }

    #[test]
    fn test_button_color() {
        assert_eq!(
            engine().render("make buttons red"),
            "document.querySelectorAll('button').forEach(btn => btn.style.backgroundColor = 'red');"
        );
    }

    #[test]
    fn test_background_prefers_compound_color() {
        assert_eq!(
            engine().render("Set the background to LightGreen"),
            "document.body.style.backgroundColor = 'lightgreen';"
        );
    }

    #[test]
    fn test_text_color_needs_color_word() {
        assert_eq!(
            engine().render("change text color to navy"),
            "document.body.style.color = 'navy';"
        );
        assert_eq!(engine().matched_rule("change text color"), CATCH_ALL_RULE);
    }

    #[test]
    fn test_hide_images() {
        assert_eq!(
            engine().render("hide images"),
            "document.querySelectorAll('img').forEach(img => img.style.display = 'none');"
        );
        assert_eq!(engine().matched_rule("hide every img"), "hide-images");
    }

    #[test]
    fn test_overlap_resolves_by_position() {
        // Both button-color and hide-buttons match; button-color is earlier.
        assert_eq!(engine().matched_rule("hide the red button"), "button-color");
        assert_eq!(engine().matched_rule("hide the button"), "hide-buttons");
        // hide-buttons precedes hide-images
        assert_eq!(engine().matched_rule("hide buttons and images"), "hide-buttons");
    }

    #[test]
    fn test_size_rules() {
        assert_eq!(
            engine().render("make images smaller"),
            "document.querySelectorAll('img').forEach(img => img.style.width = '50px');"
        );
        assert_eq!(
            engine().render("bigger image please"),
            "document.querySelectorAll('img').forEach(img => img.style.width = '200px');"
        );
        assert_eq!(
            engine().render("make the text larger"),
            "document.body.style.fontSize = '20px';"
        );
        assert_eq!(
            engine().render("small text"),
            "document.body.style.fontSize = '12px';"
        );
    }

    #[test]
    fn test_font_style_rules() {
        assert_eq!(
            engine().render("Bold everything"),
            "document.body.style.fontWeight = 'bold';"
        );
        assert_eq!(
            engine().render("italic"),
            "document.body.style.fontStyle = 'italic';"
        );
    }

    #[test]
    fn test_catch_all_embeds_escaped_command() {
        let code = engine().render("it's a trap\\");
        assert_eq!(
            code,
            "console.log('Extension executed: it\\'s a trap\\\\'); \
             document.body.style.border = '2px solid green'; \
             setTimeout(() => document.body.style.border = '', 2000);"
        );
    }

    #[test]
    fn test_catch_all_spells_out_denylisted_text() {
        let code = engine().render("import the html");
        assert!(code.starts_with("console.log('Extension executed: ' + String.fromCharCode(105,"));
        assert!(!code.to_lowercase().contains("html"));
        assert!(code.ends_with(';'));
    }

    #[test]
    fn test_samples_cover_every_rule() {
        let engine = engine();
        let matched: Vec<_> = RULE_SAMPLES
            .iter()
            .map(|command| engine.matched_rule(command))
            .collect();
        assert_eq!(matched.len(), engine.table().len());
        assert!(!matched.contains(&CATCH_ALL_RULE));
        let unique: std::collections::HashSet<_> = matched.iter().collect();
        assert_eq!(unique.len(), matched.len());
    }

    #[test]
    fn test_default_output_passes_default_validator() {
        assert_eq!(engine().check_output(&CompletionValidator::default()), Ok(()));
    }

    #[test]
    fn test_check_output_reports_template_tokens() {
        let mut rules = ValidationRules::default();
        rules.foreign_tokens.push("settimeout".to_string());
        let engine = RuleEngine::new(&rules);

        let rejection = engine
            .check_output(&CompletionValidator::new(rules))
            .unwrap_err();
        assert_eq!(rejection.rule, CATCH_ALL_RULE);
        assert_eq!(
            rejection.reason,
            RejectionReason::ForeignToken("settimeout".to_string())
        );
    }

    #[test]
    fn test_check_output_reports_table_rule() {
        let mut rules = ValidationRules::default();
        rules.foreign_tokens.push("backgroundcolor".to_string());
        let engine = RuleEngine::new(&rules);

        let rejection = engine
            .check_output(&CompletionValidator::new(rules))
            .unwrap_err();
        assert_eq!(rejection.rule, "button-color");
        assert_eq!(rejection.command, "make buttons red");
    }

    #[test]
    fn test_catch_all_handles_empty_command() {
        let code = engine().render("");
        assert!(code.contains("Extension executed: "));
        assert!(code.ends_with(';'));
    }
}
