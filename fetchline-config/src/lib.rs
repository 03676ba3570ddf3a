//! Loader for fetchline configuration with YAML + environment overlays.
//!
//! Sources are merged in order: YAML files / inline snippets, then
//! `FETCHLINE__`-prefixed environment variables (`__` separates nested keys,
//! e.g. `FETCHLINE__FETCHER__MAX_CONCURRENT=8`). String values may contain
//! `${VAR}` placeholders which are expanded after merging.
//!
//! Environment values always arrive as strings; numeric and boolean fields
//! accept either a native value or its string form.
//!
//! Every key is optional:
//!
//! ```yaml
//! fetcher:
//!   max_retries: 3
//!   requests_per_second: 1.0
//!   max_concurrent: 5
//!   request_timeout_secs: 30
//!   disable_rate_limit: false
//!   backoff_unit_ms: 1000
//!   user_agent: "fetchline/0.1"
//! logging:
//!   format: text
//!   filter: info
//!   emit_stderr: true
//! ```
use config::{Config, ConfigError, Environment, File};
use fetchline_common::observability::{LogConfig, LogFormat};
use fetchline_http::FetcherConfig;
use serde::Deserialize;
use serde_json::Value;
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "FETCHLINE";
const MAX_EXPANSION_PASSES: usize = 8;

#[derive(Debug, Default, Deserialize)]
pub struct FetchlineConfig {
    #[serde(default)]
    pub fetcher: FetcherSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Serializable mirror of [`FetcherConfig`] with plain-number durations.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FetcherSettings {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub max_retries: u32,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub requests_per_second: f64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub max_concurrent: usize,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub request_timeout_secs: u64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub disable_rate_limit: bool,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub backoff_unit_ms: u64,
    pub user_agent: Option<String>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub connect_timeout_secs: Option<u64>,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        let d = FetcherConfig::default();
        Self {
            max_retries: d.max_retries,
            requests_per_second: d.requests_per_second,
            max_concurrent: d.max_concurrent,
            request_timeout_secs: d.request_timeout.as_secs(),
            disable_rate_limit: d.rate_limiting_disabled,
            backoff_unit_ms: d.backoff_unit.as_millis() as u64,
            user_agent: None,
            connect_timeout_secs: None,
        }
    }
}

impl FetcherSettings {
    pub fn to_fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            max_retries: self.max_retries,
            requests_per_second: self.requests_per_second,
            max_concurrent: self.max_concurrent,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            rate_limiting_disabled: self.disable_rate_limit,
            backoff_unit: Duration::from_millis(self.backoff_unit_ms),
            user_agent: self.user_agent.clone(),
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: LogFormat,
    pub filter: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub emit_stderr: bool,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: "info".into(),
            emit_stderr: true,
            dir: None,
        }
    }
}

impl LoggingSettings {
    pub fn to_log_config(&self, app_name: &'static str) -> LogConfig {
        LogConfig {
            app_name,
            log_dir: self.dir.clone(),
            emit_stderr: self.emit_stderr,
            format: self.format,
            default_filter: self.filter.clone(),
        }
    }
}

/// Expand `${VAR}` placeholders in every string, following chains of
/// variables up to a fixed number of passes so cycles terminate.
fn expand_placeholders(v: &mut Value) {
    match v {
        Value::String(s) if s.contains('$') => {
            for _ in 0..MAX_EXPANSION_PASSES {
                let next = match shellexpand::env(s.as_str()) {
                    Ok(expanded) if expanded != s.as_str() => expanded.into_owned(),
                    _ => break,
                };
                *s = next;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(expand_placeholders),
        Value::Object(map) => map.values_mut().for_each(expand_placeholders),
        _ => {}
    }
}

/// Builder over the `config` crate (YAML sources + env overrides).
pub struct FetchlineConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for FetchlineConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchlineConfigLoader {
    /// Start from defaults with `FETCHLINE__` env overrides.
    ///
    /// Env values are kept as strings so text fields such as `user_agent`
    /// accept digits.
    ///
    /// ```
    /// use fetchline_config::FetchlineConfigLoader;
    ///
    /// let cfg = FetchlineConfigLoader::new()
    ///     .with_yaml_str("fetcher:\n  max_concurrent: 8")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(cfg.fetcher.max_concurrent, 8);
    /// assert_eq!(cfg.fetcher.max_retries, 3);
    /// ```
    pub fn new() -> Self {
        Self { builder: Config::builder() }
    }

    /// Attach a required YAML/TOML/JSON file; format is inferred from the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent (env-only deployments).
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, apply env overrides, expand placeholders and validate.
    ///
    /// ```
    /// use fetchline_config::FetchlineConfigLoader;
    ///
    /// let err = FetchlineConfigLoader::new()
    ///     .with_yaml_str("fetcher:\n  requests_per_second: 0")
    ///     .load()
    ///     .unwrap_err();
    /// assert!(err.to_string().contains("requests_per_second"));
    /// ```
    pub fn load(self) -> Result<FetchlineConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_placeholders(&mut v);

        let typed: FetchlineConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed
            .fetcher
            .to_fetcher_config()
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(typed)
    }
}
