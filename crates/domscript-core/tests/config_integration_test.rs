use domscript_core::{ConfigError, ConfigManager, DomScriptConfig};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_default_configuration() {
    let config = DomScriptConfig::default();
    assert!(ConfigManager::validate_config(&config).is_ok());
}

#[test]
fn test_load_from_toml_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("domscript.toml");

    fs::write(
        &config_path,
        r#"
[model]
enabled = true
provider = "huggingface"
max_new_tokens = 32

[validation]
foreign_tokens = ["def ", "import "]

[server]
port = 9100

[storage]
scripts_path = "saved.json"
"#,
    )
    .unwrap();

    let config = ConfigManager::read_toml_file(&config_path).unwrap();
    assert!(config.model.enabled);
    assert_eq!(config.model.provider, "huggingface");
    assert_eq!(config.model.max_new_tokens, 32);
    assert_eq!(config.model.top_p, 0.85);
    assert_eq!(config.validation.foreign_tokens.len(), 2);
    assert_eq!(config.validation.min_len, 15);
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.storage.scripts_path.to_str(), Some("saved.json"));
    assert!(ConfigManager::validate_config(&config).is_ok());
}

#[test]
fn test_invalid_toml_is_parse_error() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("broken.toml");
    fs::write(&config_path, "[model\nenabled = ").unwrap();

    let err = ConfigManager::read_toml_file(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn test_missing_explicit_path_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.toml");

    let err = ConfigManager::load_from_path(&missing).err().unwrap();
    assert!(matches!(err, ConfigError::NotFound(_)));
}

#[test]
fn test_default_config_round_trips_through_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nested").join("config.toml");

    ConfigManager::create_default_config(&config_path).unwrap();
    let loaded = ConfigManager::read_toml_file(&config_path).unwrap();

    assert_eq!(loaded.model.provider, "ollama");
    assert_eq!(loaded.probe.battery.len(), 3);
    assert_eq!(loaded.validation, DomScriptConfig::default().validation);
}

#[test]
fn test_from_config_rejects_bad_log_format() {
    let mut config = DomScriptConfig::default();
    config.logging.format = "xml".to_string();

    assert!(ConfigManager::from_config(config).is_err());
}
