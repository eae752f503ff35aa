//! `specgen` -- submit design documents and save the generated test
//! specification archive.
//!
//! Configuration comes from the environment (see
//! [`specgen_client::config`]) and can be overridden per invocation with
//! the global flags. Progress is printed to stderr while the job runs; the
//! saved path (or, with `--json`, the full job report) goes to stdout.
//!
//! Exit codes: `0` success, `1` the job failed, `2` the request was
//! rejected before anything was sent.

mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use specgen_client::api::DocGenApi;
use specgen_client::board::JobView;
use specgen_client::config::ClientConfig;
use specgen_client::controller::{JobController, JobOutcome, JobReport};
use specgen_client::delivery::DirectoryDeliverer;

use crate::cli::Cli;

const EXIT_JOB_FAILED: u8 = 1;
const EXIT_REJECTED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "specgen aborted");
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_JOB_FAILED)
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "specgen_client=info,specgen=info".into());

    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = ClientConfig::from_env(cli.overrides()).context("Invalid configuration")?;
    let print_json = cli.json;

    tracing::info!(
        api_url = %config.api_url,
        output_dir = %config.output_dir.display(),
        poll_interval_secs = config.poll.interval.as_secs(),
        "Starting specgen",
    );

    let api = Arc::new(DocGenApi::new(config.api_url.as_str()));
    let deliverer = DirectoryDeliverer::new(&config.output_dir);
    let mut controller = JobController::new(api, deliverer, config.poll);

    let renderer = tokio::spawn(render(controller.subscribe()));
    let request = cli.command.into_request();

    let result = tokio::select! {
        result = controller.submit(request) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    controller.shutdown();
    drop(controller);
    // The renderer finishes once the board is gone.
    let _ = renderer.await;

    let report = match result {
        Some(Ok(report)) => report,
        Some(Err(rejected)) => {
            tracing::debug!(error = %rejected, "Request rejected");
            return Ok(ExitCode::from(EXIT_REJECTED));
        }
        None => anyhow::bail!("Interrupted"),
    };

    print_report(&report, print_json)?;

    Ok(if report.outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_JOB_FAILED)
    })
}

/// Print status and progress lines to stderr as they change.
async fn render(mut rx: watch::Receiver<JobView>) {
    let mut last_status = String::new();
    let mut last_progress = None;

    while rx.changed().await.is_ok() {
        let (status, progress) = {
            let view = rx.borrow_and_update();
            (view.status_text.clone(), view.progress_text())
        };

        if status != last_status && !status.is_empty() {
            eprintln!("{status}");
        }
        if let Some(text) = progress.as_deref() {
            if last_progress.as_deref() != Some(text) {
                eprintln!("  {text}");
            }
        }

        last_status = status;
        last_progress = progress;
    }
}

fn print_report(report: &JobReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    match &report.outcome {
        JobOutcome::Succeeded { path, size, .. } => {
            println!("{}", path.display());
            tracing::debug!(job_id = %report.job_id, size, "Archive saved");
        }
        // The failure message already went out as status text.
        JobOutcome::Failed { .. } => {}
    }
    Ok(())
}
