use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use fetchline_common::observability::init_logging;
use fetchline_config::FetchlineConfigLoader;
use fetchline_http::Fetcher;
use std::process::ExitCode;

mod cli;
mod report;

const DEFAULT_CONFIG: &str = "fetchline.yaml";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // 1) Load config (file, then env, then flags)
    let loader = match &cli.config {
        Some(path) => FetchlineConfigLoader::new().with_file(path),
        None => FetchlineConfigLoader::new().with_optional_file(DEFAULT_CONFIG),
    };
    let mut cfg = loader.load().context("failed to load configuration")?;
    cli.apply_overrides(&mut cfg.fetcher);

    let log_path = init_logging(cfg.logging.to_log_config("fetchline"))?;
    tracing::debug!(log_path = %log_path.display(), urls = cli.urls.len(), "fetchline.start");

    // 2) Fetch inside one session scope
    let fetcher = Fetcher::new(cfg.fetcher.to_fetcher_config())?;
    let session = fetcher.open()?;
    let results = session.fetch_all(cli.urls.iter().cloned()).await?;
    session.close();

    // 3) Report
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print!("{}", report::render_text(&results));
    }

    let all_ok = results.iter().all(|r| r.is_success());
    Ok(if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
