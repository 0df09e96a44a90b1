//! Video stabilizer binary.
//!
//! Usage: `videostab <input>`. Settings come from `VIDEOSTAB_*` variables
//! (see [`CliConfig::from_env`]); the report is printed to stdout as JSON.

use std::path::PathBuf;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{error, info, Instrument};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stab_cli::{CliConfig, RunLogger};
use stab_media::Stabilizer;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("videostab=info".parse().expect("valid directive"))
        .add_directive("stab_media=info".parse().expect("valid directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let input = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: videostab <input>")?;

    let config = CliConfig::from_env().context("invalid configuration")?;
    let output = config.output_for(&input);
    info!("Stabilizer config: {:?}", config.stabilize);

    let logger = RunLogger::new(&input, &output);
    logger.log_start(&format!("radius {}", config.stabilize.smoothing_radius));

    // Setup signal handler
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            cancel_tx.send(true).ok();
        }
    });

    let progress_logger = logger.clone();
    let result = Stabilizer::new(config.stabilize)
        .with_progress(move |progress| {
            progress_logger.log_progress(&progress);
        })
        .with_cancel(cancel_rx)
        .run_async(input.clone(), output.clone())
        .instrument(logger.create_span())
        .await;

    let report = result.with_context(|| format!("failed to stabilize {}", input.display()))?;

    if report.estimation_failures > 0 {
        logger.log_warning(&format!(
            "{} frame pair(s) had no usable transform",
            report.estimation_failures
        ));
    }
    logger.log_completion(&report);

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
