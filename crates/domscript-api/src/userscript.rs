use domscript_patterns::escape_js;
use serde::Serialize;

use crate::script_store::SavedScript;

/// Installable userscript for a saved snippet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Userscript {
    pub userscript: String,
    pub filename: String,
}

impl Userscript {
    pub fn from_script(script: &SavedScript) -> Self {
        Self {
            userscript: render(script),
            filename: format!(
                "script_{}_{}.user.js",
                script.id,
                safe_filename(&script.prompt)
            ),
        }
    }
}

/// Keep alphanumerics, space, `-` and `_`, trim trailing spaces, then
/// replace spaces with underscores.
pub fn safe_filename(prompt: &str) -> String {
    let kept: String = prompt
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    kept.trim_end().replace(' ', "_")
}

/// Header and comment lines cannot contain line breaks
fn one_line(text: &str) -> String {
    text.replace(['\r', '\n', '\u{2028}', '\u{2029}'], " ")
}

fn render(script: &SavedScript) -> String {
    let prompt = one_line(&script.prompt);
    format!(
        "// ==UserScript==
// @name         Auto-generated: {prompt}
// @namespace    domscript
// @version      1.0
// @description  Generated by DomScript
// @match        *://*/*
// @grant        none
// ==/UserScript==

(function() {{
    'use strict';

    // Generated code for: {prompt}
    // Source: {source}
    // Platform: {platform}
    {code}

    console.log('Userscript executed: {logged}');
}})();",
        source = one_line(&script.source),
        platform = one_line(&script.platform),
        code = script.code,
        logged = escape_js(&script.prompt),
    )
}
