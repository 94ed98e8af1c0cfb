//! Integration tests for configuration loading and client construction

use tabula::config::ConfigLoader;
use tabula::logging::LogFormat;
use tabula::Client;
use tempfile::TempDir;

#[test]
fn test_config_file_builds_client() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("tabula.toml");

    std::fs::write(
        &config_file,
        r#"
[client]
base_url = "http://127.0.0.1:9"
auth_token = "abc"
connect_timeout_secs = 2

[query]
limit = 25
user_time_zone = "UTC"

[logging]
level = "debug"
format = "json"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.logging.format, LogFormat::Json);

    let client = Client::from_config(&config).unwrap();
    assert_eq!(client.query_defaults().limit, 25);
    assert_eq!(client.query_defaults().user_time_zone, "UTC");
}

#[test]
fn test_invalid_base_url_fails_validation() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("tabula.toml");
    std::fs::write(&config_file, "[client]\nbase_url = \"not a url\"\n").unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("base_url"));
}

#[test]
fn test_missing_config_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    assert!(ConfigLoader::load_from_file(&temp_dir.path().join("absent.toml")).is_err());
}
