use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::validation_config::{ProbeRules, ValidationRules};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration for DomScript
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DomScriptConfig {
    /// Completion model configuration
    #[serde(default)]
    pub model: ModelConfig,

    /// Acceptance rules for model completions
    #[serde(default)]
    pub validation: ValidationRules,

    /// One-shot quality gate battery
    #[serde(default)]
    pub probe: ProbeRules,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Saved script storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Completion model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Enable model-backed generation (false = rule engine only)
    #[serde(default)]
    pub enabled: bool,

    /// Provider: "ollama", "openai-compatible" or "huggingface"
    #[serde(default = "default_model_provider")]
    pub provider: String,

    /// Model identifier
    /// For Ollama: model name (e.g., "qwen2.5-coder:1.5b")
    /// For OpenAI-compatible: whatever the server exposes
    /// For Hugging Face: repository id (e.g., "Salesforce/codegen-350M-mono")
    #[serde(default)]
    pub model: Option<String>,

    /// Ollama URL
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// OpenAI-compatible base URL, including the `/v1` suffix
    #[serde(default)]
    pub openai_compatible_url: Option<String>,

    /// Hugging Face inference base URL (model id is appended)
    #[serde(default = "default_huggingface_url")]
    pub huggingface_url: String,

    /// Bearer key for hosted backends that require one
    #[serde(default)]
    pub api_key: Option<String>,

    /// Upper bound for a single completion call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries on transport failure (OpenAI-compatible only)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Tokens generated per request
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: usize,

    /// Nucleus sampling for request-time generation
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Repetition penalty for request-time generation
    #[serde(default = "default_repetition_penalty")]
    pub repetition_penalty: f32,

    /// Tokens generated per quality-gate probe
    #[serde(default = "default_probe_max_new_tokens")]
    pub probe_max_new_tokens: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_model_provider(),
            model: None,
            ollama_url: default_ollama_url(),
            openai_compatible_url: None,
            huggingface_url: default_huggingface_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            max_new_tokens: default_max_new_tokens(),
            top_p: default_top_p(),
            repetition_penalty: default_repetition_penalty(),
            probe_max_new_tokens: default_probe_max_new_tokens(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Where saved scripts are persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_scripts_path")]
    pub scripts_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            scripts_path: default_scripts_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "json", "compact"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_model_provider() -> String {
    "ollama".to_string()
}
fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_huggingface_url() -> String {
    "https://api-inference.huggingface.co/models".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    2
}
fn default_max_new_tokens() -> usize {
    40
}
fn default_top_p() -> f32 {
    0.85
}
fn default_repetition_penalty() -> f32 {
    1.1
}
fn default_probe_max_new_tokens() -> usize {
    20
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_scripts_path() -> PathBuf {
    PathBuf::from("working_scripts.json")
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

pub const SUPPORTED_PROVIDERS: &[&str] = &["ollama", "openai-compatible", "huggingface"];

/// Configuration manager with layered sources
pub struct ConfigManager {
    config: DomScriptConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Defaults only, no file or environment lookup
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(DomScriptConfig::default())
    }

    /// Wrap an already-built configuration after validating it
    pub fn from_config(config: DomScriptConfig) -> Result<Self, ConfigError> {
        Self::validate_config(&config)?;
        Ok(Self {
            config,
            config_path: None,
        })
    }

    /// Load configuration with the following precedence:
    /// 1. Environment variables (.env file)
    /// 2. Config file (.domscript.toml)
    /// 3. Sensible defaults
    pub fn load() -> Result<Self, ConfigError> {
        info!("Loading DomScript configuration");

        Self::load_dotenv();

        let (config, config_path) = Self::load_config_file()?;
        let config = Self::apply_env_overrides(config);
        Self::validate_config(&config)?;

        Self::log_summary(&config, config_path.as_deref());

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Load an explicit config file, still honoring environment overrides
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        Self::load_dotenv();

        let config = Self::read_toml_file(path)?;
        let config = Self::apply_env_overrides(config);
        Self::validate_config(&config)?;

        Self::log_summary(&config, Some(path));

        Ok(Self {
            config,
            config_path: Some(path.to_path_buf()),
        })
    }

    fn log_summary(config: &DomScriptConfig, path: Option<&Path>) {
        match path {
            Some(path) => info!("Config file: {}", path.display()),
            None => info!("Config file: NONE (using defaults)"),
        }
        info!(
            "Model generation: {}",
            if config.model.enabled {
                config.model.provider.as_str()
            } else {
                "disabled (rule engine only)"
            }
        );
        info!("Scripts file: {}", config.storage.scripts_path.display());
    }

    /// Load .env file if it exists
    fn load_dotenv() {
        if Path::new(".env").exists() {
            if let Err(e) = dotenv::from_filename(".env") {
                warn!("Failed to load .env file: {}", e);
            } else {
                info!("Loaded .env file from current directory");
            }
            return;
        }

        if let Some(home) = dirs::home_dir() {
            let home_env = home.join(".domscript.env");
            if home_env.exists() {
                if let Err(e) = dotenv::from_path(&home_env) {
                    warn!("Failed to load .domscript.env: {}", e);
                } else {
                    info!("Loaded .domscript.env from home directory");
                }
            }
        }
    }

    /// Find and load config file
    /// Search order:
    /// 1. ./.domscript.toml (current directory)
    /// 2. ~/.domscript/config.toml (user config)
    /// 3. Use defaults
    fn load_config_file() -> Result<(DomScriptConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(".domscript.toml");
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".domscript").join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        info!("No config file found, using defaults");
        Ok((DomScriptConfig::default(), None))
    }

    /// Read TOML config file
    pub fn read_toml_file(path: &Path) -> Result<DomScriptConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: DomScriptConfig) -> DomScriptConfig {
        if let Ok(provider) = std::env::var("DOMSCRIPT_MODEL_PROVIDER") {
            config.model.provider = provider;
        }
        if let Ok(model) = std::env::var("DOMSCRIPT_MODEL") {
            config.model.model = Some(model);
            config.model.enabled = true; // Enable if model specified
        }
        if let Ok(enabled) = std::env::var("DOMSCRIPT_MODEL_ENABLED") {
            config.model.enabled = enabled.to_lowercase() == "true" || enabled == "1";
        }
        if let Ok(url) = std::env::var("DOMSCRIPT_OLLAMA_URL") {
            config.model.ollama_url = url;
        }
        if let Ok(url) = std::env::var("DOMSCRIPT_OPENAI_COMPATIBLE_URL") {
            config.model.openai_compatible_url = Some(url);
        }
        if let Ok(url) = std::env::var("DOMSCRIPT_HUGGINGFACE_URL") {
            config.model.huggingface_url = url;
        }
        if let Ok(key) = std::env::var("DOMSCRIPT_API_KEY").or_else(|_| std::env::var("HF_TOKEN"))
        {
            config.model.api_key = Some(key);
        }
        if let Ok(timeout) = std::env::var("DOMSCRIPT_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                config.model.timeout_secs = secs;
            }
        }

        // Server
        if let Ok(host) = std::env::var("DOMSCRIPT_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("DOMSCRIPT_PORT") {
            if let Ok(p) = port.parse() {
                config.server.port = p;
            }
        }

        if let Ok(path) = std::env::var("DOMSCRIPT_SCRIPTS_PATH") {
            config.storage.scripts_path = PathBuf::from(path);
        }

        // Logging
        if let Ok(level) = std::env::var("RUST_LOG") {
            // RUST_LOG may be a full directive list; only adopt plain levels
            if is_log_level(&level) {
                config.logging.level = level;
            }
        }

        config
    }

    /// Validate configuration
    pub fn validate_config(config: &DomScriptConfig) -> Result<(), ConfigError> {
        let provider = config.model.provider.to_lowercase();
        if !SUPPORTED_PROVIDERS.contains(&provider.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid model provider: {}. Must be one of: {}",
                config.model.provider,
                SUPPORTED_PROVIDERS.join(", ")
            )));
        }

        if config.model.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "model.timeout_secs must be greater than zero".to_string(),
            ));
        }

        if !(config.model.top_p > 0.0 && config.model.top_p <= 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "model.top_p must be in (0, 1], got {}",
                config.model.top_p
            )));
        }

        if config.probe.battery.is_empty() {
            return Err(ConfigError::ValidationError(
                "probe.battery must contain at least one prompt".to_string(),
            ));
        }

        for (key, tokens) in [
            ("validation.foreign_tokens", &config.validation.foreign_tokens),
            ("probe.denylist", &config.probe.denylist),
            ("probe.closing_tokens", &config.probe.closing_tokens),
        ] {
            // A blank entry matches every string
            if tokens.iter().any(|token| token.trim().is_empty()) {
                return Err(ConfigError::ValidationError(format!(
                    "{key} must not contain blank entries"
                )));
            }
        }

        if config.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be non-zero".to_string(),
            ));
        }

        if !is_log_level(&config.logging.level) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                config.logging.level
            )));
        }

        match config.logging.format.as_str() {
            "pretty" | "json" | "compact" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {}. Must be one of: pretty, json, compact",
                    other
                )))
            }
        }

        Ok(())
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &DomScriptConfig {
        &self.config
    }

    /// Get the path to the config file that was loaded, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Create a default config file
    pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        let config = DomScriptConfig::default();
        let toml_str =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::ReadError(e.to_string()))?;
        }

        std::fs::write(path, toml_str).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Ok(())
    }
}

fn is_log_level(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}
