use fetchline_common::observability::LogFormat;
use fetchline_config::FetchlineConfigLoader;
use serial_test::serial;
use std::{fs, path::PathBuf, time::Duration};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

const FILE_YAML: &str = r#"
fetcher:
  max_retries: 4
  requests_per_second: 2.5
  max_concurrent: 10
  request_timeout_secs: 12
  user_agent: "fetchline/${FETCHLINE_TEST_BUILD}"
logging:
  format: json
  filter: "fetchline_http=debug"
  emit_stderr: false
"#;

#[test]
#[serial]
fn loads_file_and_expands_placeholders() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "fetchline.yaml", FILE_YAML);

    let config = temp_env::with_var("FETCHLINE_TEST_BUILD", Some("7"), || {
        FetchlineConfigLoader::new()
            .with_file(p)
            .load()
            .expect("load fetchline config")
    });

    assert_eq!(config.fetcher.max_retries, 4);
    assert_eq!(config.fetcher.max_concurrent, 10);
    assert_eq!(config.fetcher.user_agent.as_deref(), Some("fetchline/7"));
    assert_eq!(config.logging.format, LogFormat::Json);
    assert!(!config.logging.emit_stderr);

    let fetcher = config.fetcher.to_fetcher_config();
    assert_eq!(fetcher.request_timeout, Duration::from_secs(12));
    assert_eq!(fetcher.min_interval(), Duration::from_millis(400));
}

#[test]
#[serial]
fn environment_overrides_file_values() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "fetchline.yaml", FILE_YAML);

    let config = temp_env::with_vars(
        [
            ("FETCHLINE__FETCHER__MAX_CONCURRENT", Some("3")),
            ("FETCHLINE__FETCHER__DISABLE_RATE_LIMIT", Some("true")),
        ],
        || FetchlineConfigLoader::new().with_file(p).load(),
    )
    .expect("load with env overrides");

    assert_eq!(config.fetcher.max_concurrent, 3);
    assert!(config.fetcher.disable_rate_limit);
    assert_eq!(config.fetcher.max_retries, 4);
}

#[test]
#[serial]
fn numeric_looking_env_values_stay_strings_for_text_fields() {
    let config = temp_env::with_vars(
        [
            ("FETCHLINE__FETCHER__USER_AGENT", Some("2024")),
            ("FETCHLINE__LOGGING__FILTER", Some("42")),
            ("FETCHLINE__LOGGING__DIR", Some("7")),
            ("FETCHLINE__FETCHER__REQUEST_TIMEOUT_SECS", Some("9")),
            ("FETCHLINE__FETCHER__CONNECT_TIMEOUT_SECS", Some("2")),
            ("FETCHLINE__LOGGING__EMIT_STDERR", Some("false")),
        ],
        || FetchlineConfigLoader::new().load(),
    )
    .expect("numeric-looking strings load");

    assert_eq!(config.fetcher.user_agent.as_deref(), Some("2024"));
    assert_eq!(config.logging.filter, "42");
    assert_eq!(config.logging.dir, Some(PathBuf::from("7")));
    assert_eq!(config.fetcher.request_timeout_secs, 9);
    assert_eq!(config.fetcher.connect_timeout_secs, Some(2));
    assert!(!config.logging.emit_stderr);
}

#[test]
#[serial]
fn non_numeric_env_value_for_numeric_field_is_an_error() {
    let result = temp_env::with_var("FETCHLINE__FETCHER__MAX_RETRIES", Some("lots"), || {
        FetchlineConfigLoader::new().load()
    });
    assert!(result.is_err());
}

#[test]
#[serial]
fn missing_optional_file_falls_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = FetchlineConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("defaults");

    assert_eq!(config.fetcher.max_retries, 3);
    assert_eq!(config.fetcher.request_timeout_secs, 30);
    assert_eq!(config.logging.format, LogFormat::Text);
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let result = FetchlineConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(result.is_err());
}

#[test]
#[serial]
fn out_of_range_values_are_rejected() {
    let result = FetchlineConfigLoader::new()
        .with_yaml_str("fetcher:\n  max_retries: 0")
        .load();
    let err = result.unwrap_err().to_string();
    assert!(err.contains("max_retries"), "unexpected error: {err}");
}
