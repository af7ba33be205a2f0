use serde::{Deserialize, Serialize};

/// Acceptance and repair rules applied to model completions.
///
/// The token lists are tuned to the failure modes of small code models
/// (emitting Python, echoing HTML from training data). They are data so that
/// a different backend can ship different tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRules {
    /// Stripped completions must be strictly longer than this before repair
    #[serde(default = "default_min_raw_len")]
    pub min_raw_len: usize,

    /// Repaired snippets must be strictly longer than this
    #[serde(default = "default_min_len")]
    pub min_len: usize,

    /// Token every snippet must reference (the DOM root object)
    #[serde(default = "default_root_token")]
    pub root_token: String,

    /// At least one of these must appear (style access or element query)
    #[serde(default = "default_dom_access_tokens")]
    pub dom_access_tokens: Vec<String>,

    /// Statement terminator a snippet must end with
    #[serde(default = "default_terminator")]
    pub terminator: String,

    /// Case-insensitive tokens that mark foreign-language or markup output
    #[serde(default = "default_foreign_tokens")]
    pub foreign_tokens: Vec<String>,

    /// Completion repair heuristics
    #[serde(default)]
    pub repair: RepairRules,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_raw_len: default_min_raw_len(),
            min_len: default_min_len(),
            root_token: default_root_token(),
            dom_access_tokens: default_dom_access_tokens(),
            terminator: default_terminator(),
            foreign_tokens: default_foreign_tokens(),
            repair: RepairRules::default(),
        }
    }
}

/// Closing sequences appended to unterminated completions.
///
/// Each rule has two variants: one used when the text already ends with
/// `quote`, one used otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairRules {
    #[serde(default = "default_quote")]
    pub quote: String,

    #[serde(default = "default_iteration_marker")]
    pub iteration_marker: String,
    #[serde(default = "default_iteration_end")]
    pub iteration_end: String,
    #[serde(default = "default_iteration_close_open_string")]
    pub iteration_close_open_string: String,
    #[serde(default = "default_iteration_close_quoted")]
    pub iteration_close_quoted: String,

    #[serde(default = "default_style_marker")]
    pub style_marker: String,
    #[serde(default = "default_style_end")]
    pub style_end: String,
    #[serde(default = "default_style_close_open_string")]
    pub style_close_open_string: String,
    #[serde(default = "default_style_close_quoted")]
    pub style_close_quoted: String,
}

impl Default for RepairRules {
    fn default() -> Self {
        Self {
            quote: default_quote(),
            iteration_marker: default_iteration_marker(),
            iteration_end: default_iteration_end(),
            iteration_close_open_string: default_iteration_close_open_string(),
            iteration_close_quoted: default_iteration_close_quoted(),
            style_marker: default_style_marker(),
            style_end: default_style_end(),
            style_close_open_string: default_style_close_open_string(),
            style_close_quoted: default_style_close_quoted(),
        }
    }
}

/// Probe battery and checks used by the one-shot quality gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeRules {
    /// Code prefixes sent to the model, deterministically
    #[serde(default = "default_probe_battery")]
    pub battery: Vec<String>,

    /// Stripped completions must be strictly longer than this
    #[serde(default = "default_probe_min_len")]
    pub min_len: usize,

    /// Case-insensitive tokens that fail a probe (license text, other languages)
    #[serde(default = "default_probe_denylist")]
    pub denylist: Vec<String>,

    /// At least one of these must appear in the completion
    #[serde(default = "default_probe_closing_tokens")]
    pub closing_tokens: Vec<String>,

    /// The gate passes when the success rate is strictly greater than this
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,
}

impl Default for ProbeRules {
    fn default() -> Self {
        Self {
            battery: default_probe_battery(),
            min_len: default_probe_min_len(),
            denylist: default_probe_denylist(),
            closing_tokens: default_probe_closing_tokens(),
            pass_threshold: default_pass_threshold(),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn default_min_raw_len() -> usize {
    5
}
fn default_min_len() -> usize {
    15
}
fn default_root_token() -> String {
    "document.".to_string()
}
fn default_dom_access_tokens() -> Vec<String> {
    strings(&["style.", "querySelector"])
}
fn default_terminator() -> String {
    ";".to_string()
}
fn default_foreign_tokens() -> Vec<String> {
    strings(&["def ", "import ", "print(", "class ", "</", "html"])
}

fn default_quote() -> String {
    "'".to_string()
}
fn default_iteration_marker() -> String {
    "forEach".to_string()
}
fn default_iteration_end() -> String {
    ");".to_string()
}
fn default_iteration_close_open_string() -> String {
    "');".to_string()
}
fn default_iteration_close_quoted() -> String {
    ");".to_string()
}
fn default_style_marker() -> String {
    "style.".to_string()
}
fn default_style_end() -> String {
    ";".to_string()
}
fn default_style_close_open_string() -> String {
    "';".to_string()
}
fn default_style_close_quoted() -> String {
    ";".to_string()
}

fn default_probe_battery() -> Vec<String> {
    strings(&[
        "document.querySelector('button').style.backgroundColor = 'red'",
        "document.body.style.fontSize = '20px'",
        "document.querySelectorAll('img').forEach(img => img.style.display = 'none'",
    ])
}
fn default_probe_min_len() -> usize {
    2
}
fn default_probe_denylist() -> Vec<String> {
    strings(&["import", "def ", "class ", "apache", "license"])
}
fn default_probe_closing_tokens() -> Vec<String> {
    strings(&[";", ")", "}", "'"])
}
fn default_pass_threshold() -> f64 {
    0.5
}
