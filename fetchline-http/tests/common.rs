use std::sync::OnceLock;

use fetchline_common::observability::{LogConfig, LogFormat};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "fetchline-tests",
            emit_stderr: true,
            format: if std::env::var("FETCHLINE_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "fetchline_http=debug".to_string(),
            ..LogConfig::default()
        };

        fetchline_common::observability::init_logging(config).unwrap_or_default()
    });
}
