use clap::Parser;
use fetchline_config::FetcherSettings;
use std::path::PathBuf;

/// Fetch URLs concurrently with rate limiting and retries.
#[derive(Debug, Parser)]
#[command(name = "fetchline", version)]
pub struct Cli {
    /// URLs to fetch; results are reported in this order.
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// YAML config file. Defaults to ./fetchline.yaml when present.
    #[arg(long, short = 'c', env = "FETCHLINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Attempts per URL, including the first.
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Maximum request starts per second.
    #[arg(long = "rps")]
    pub requests_per_second: Option<f64>,

    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// Per-request timeout in seconds.
    #[arg(long = "timeout")]
    pub timeout_secs: Option<u64>,

    #[arg(long)]
    pub no_rate_limit: bool,

    /// Print full results as JSON instead of a summary.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Layer command-line flags over file/env settings.
    pub fn apply_overrides(&self, settings: &mut FetcherSettings) {
        if let Some(n) = self.max_retries {
            settings.max_retries = n;
        }
        if let Some(rate) = self.requests_per_second {
            settings.requests_per_second = rate;
        }
        if let Some(n) = self.max_concurrent {
            settings.max_concurrent = n;
        }
        if let Some(secs) = self.timeout_secs {
            settings.request_timeout_secs = secs;
        }
        if self.no_rate_limit {
            settings.disable_rate_limit = true;
        }
    }
}
