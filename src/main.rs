//! Douyin Downloader - CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use douyin_downloader::{
    api::{DouyinApi, RequestContext},
    classify::Classifier,
    cli::Args,
    config::{validate_config, Config},
    download::{Orchestrator, ResumableDownloader},
    error::{exit_codes, Error, Result},
    ledger::Ledger,
    output::{print_banner, print_config_summary, print_error, print_info, print_warning, print_run_stats},
    throttle::RetryPolicy,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            let code = match e {
                Error::Config(_) | Error::ConfigValidation { .. } | Error::TomlParse(_) => {
                    exit_codes::CONFIG_ERROR
                }
                Error::Api(_) | Error::Authentication(_) | Error::RateLimited(_) => {
                    exit_codes::API_ERROR
                }
                Error::Download(_) | Error::Ledger(_) => exit_codes::DOWNLOAD_ERROR,
                _ => exit_codes::UNEXPECTED_ERROR,
            };
            ExitCode::from(code as u8)
        }
    }
}

async fn run() -> Result<i32> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    // Print banner
    print_banner();

    // Load configuration
    let config_path = args.config.clone();
    let mut config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        print_info("No configuration file found, using CLI arguments only");
        Config::default()
    };

    // Merge CLI arguments into config
    args.merge_into_config(&mut config);

    // Validate configuration
    validate_config(&config)?;

    if config.link.is_empty() {
        return Err(Error::Config(
            "no links to download; pass --link or set `link` in the config file".into(),
        ));
    }

    if config.account.cookie.is_none() {
        print_warning(
            "No cookie configured; listing endpoints may reject anonymous requests \
             (set --cookie or the DOUYIN_COOKIE environment variable)",
        );
    }

    let modes = config
        .options
        .mode
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    print_config_summary(
        config.link.len(),
        &modes,
        &config.download_root().display().to_string(),
        config.options.thread,
    );

    // Shared HTTP client and per-run request context
    let ctx = Arc::new(RequestContext::new(
        config.account.cookie.as_deref(),
        &config.account.user_agent,
    )?);
    let client = reqwest::Client::builder()
        .user_agent(config.account.user_agent.clone())
        .build()
        .map_err(|e| Error::Api(format!("Failed to create HTTP client: {}", e)))?;

    // Acquisition ledger (cross-run incremental state)
    let ledger = if config.options.database {
        let ledger = Ledger::open(&config.ledger_path())?;
        tracing::debug!("ledger at {}", ledger.path().display());
        Some(Arc::new(ledger))
    } else {
        None
    };

    let retry = RetryPolicy::new(
        config.options.retries,
        vec![
            std::time::Duration::from_secs(1),
            std::time::Duration::from_secs(2),
            std::time::Duration::from_secs(5),
        ],
    );

    let api = Arc::new(DouyinApi::new(client.clone(), ctx.clone()));
    let downloader = Arc::new(ResumableDownloader::new(
        client.clone(),
        ctx,
        retry,
        config.options.show_progress,
    ));
    let classifier = Classifier::new(client);

    let links = config.link.clone();
    let orchestrator = Orchestrator::new(api, classifier, ledger, downloader, Arc::new(config));

    // Run the batch
    let report = orchestrator.run(&links).await?;

    // Print statistics
    print_run_stats(&report.stats);

    if report.all_inputs_failed() {
        print_error("All inputs failed");
        return Ok(exit_codes::ALL_INPUTS_FAILED);
    }
    if report.inputs_failed > 0 {
        print_warning(&format!(
            "{} of {} inputs failed",
            report.inputs_failed, report.inputs_total
        ));
    }

    Ok(exit_codes::SUCCESS)
}
