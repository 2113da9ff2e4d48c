use graph_template_qa::config::AppConfig;
use serial_test::serial;
use std::env;
use std::fs;
use std::time::Duration;

const BIN: &str = "graph-template-qa";

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("KGQA_SERVER__PORT");
        env::remove_var("KGQA_STORE__PROVIDER");
        env::remove_var("KGQA_STORE__QUERY_TIMEOUT_MS");
        env::remove_var("KGQA_SCHEMA");
        env::remove_var("KGQA_TEMPLATES");
        env::remove_var("CONFIG_FILE");
        env::remove_var("PORT");
    }
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load_from_args([BIN]).expect("defaults should load");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.store.provider, "memory");
    assert_eq!(config.catalog.templates_path, "data/question_templates.yaml");
    assert_eq!(config.engine.answer_separator, ",");
    assert_eq!(config.engine.max_attempts, None);

    let options = config.resolve_options();
    assert_eq!(options.query_timeout, Some(Duration::from_millis(5000)));
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("KGQA_SERVER__PORT", "9090");
        env::set_var("KGQA_STORE__PROVIDER", "surrealdb");
    }

    let config = AppConfig::load_from_args([BIN]).expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.store.provider, "surrealdb");

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_flags_win_over_env() {
    clear_env_vars();
    unsafe {
        env::set_var("KGQA_SERVER__PORT", "9090");
    }

    let config = AppConfig::load_from_args([BIN, "--port", "8181", "--templates", "t.json"])
        .expect("Failed to load config");
    assert_eq!(config.server.port, 8181);
    assert_eq!(config.catalog.templates_path, "t.json");

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("kgqa.yaml");
    fs::write(
        &file_path,
        r#"
server:
  port: 7070
engine:
  max_attempts: 4
"#,
    )
    .expect("Failed to write temp config");

    let config = AppConfig::load_from_args([BIN, "--config", file_path.to_str().unwrap()])
        .expect("Failed to load config from file");
    assert_eq!(config.server.port, 7070);
    assert_eq!(config.engine.max_attempts, Some(4));
    // Untouched sections keep their defaults
    assert_eq!(config.store.namespace, "kgqa");
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    clear_env_vars();

    let result = AppConfig::load_from_args([BIN, "--config", "does-not-exist.yaml"]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_cwd_config_fallback() {
    clear_env_vars();

    let cwd_path = "config.yaml";
    fs::write(
        cwd_path,
        r#"
server:
  port: 6060
"#,
    )
    .expect("Failed to write ./config.yaml");

    let config = AppConfig::load_from_args([BIN]);

    fs::remove_file(cwd_path).unwrap();

    assert_eq!(config.expect("Failed to load config").server.port, 6060);
}
