//! Ordered keyword-conjunction tables shared by the rule engine and the
//! prompt enhancer.

use crate::color::{find_color, ColorToken, DEFAULT_COLOR};

/// A command prepared for matching: lowercased once, color resolved once.
#[derive(Debug, Clone)]
pub struct CommandText<'a> {
    raw: &'a str,
    lower: String,
    color: Option<ColorToken>,
}

impl<'a> CommandText<'a> {
    pub fn new(raw: &'a str) -> Self {
        let lower = raw.to_lowercase();
        let color = find_color(&lower);
        Self { raw, lower, color }
    }

    pub fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn lower(&self) -> &str {
        &self.lower
    }

    pub fn has(&self, keyword: &str) -> bool {
        self.lower.contains(keyword)
    }

    pub fn has_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|keyword| self.has(keyword))
    }

    /// Whether a vocabulary color is mentioned at all
    pub fn has_color(&self) -> bool {
        self.color.is_some()
    }

    /// Mentioned color, or the default
    pub fn color(&self) -> ColorToken {
        self.color.unwrap_or(DEFAULT_COLOR)
    }
}

/// One row of a table: a predicate and the template it selects
#[derive(Clone, Copy)]
pub struct PatternRule {
    pub name: &'static str,
    pub matches: fn(&CommandText<'_>) -> bool,
    pub render: fn(&CommandText<'_>) -> String,
}

impl std::fmt::Debug for PatternRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternRule").field("name", &self.name).finish()
    }
}

/// Rules in priority order; the first matching predicate wins.
#[derive(Debug, Clone)]
pub struct PatternTable {
    rules: Vec<PatternRule>,
}

impl PatternTable {
    pub fn new(rules: Vec<PatternRule>) -> Self {
        Self { rules }
    }

    pub fn first_match(&self, command: &CommandText<'_>) -> Option<&PatternRule> {
        self.rules.iter().find(|rule| (rule.matches)(command))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// `document.querySelectorAll('<selector>').forEach(<var> => <var>.style.<property> = '<value>'`
///
/// Left open on purpose; callers close it (`');`) or hand it to a model.
pub(crate) fn for_each_style_prefix(
    selector: &str,
    var: &str,
    property: &str,
    value: &str,
) -> String {
    format!(
        "document.querySelectorAll('{selector}').forEach({var} => {var}.style.{property} = '{value}'"
    )
}

/// `document.body.style.<property> = '<value>'`, unterminated
pub(crate) fn body_style_prefix(property: &str, value: &str) -> String {
    format!("document.body.style.{property} = '{value}'")
}
