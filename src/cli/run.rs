//! `run` command: generate load for a fixed time or until Ctrl+C

use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use loadknob_core::{Engine, EngineSnapshot, WorkerStats};

const REFRESH_INTERVAL: Duration = Duration::from_millis(250);

pub async fn execute(
    engine: Engine,
    duration: Option<Duration>,
    json: bool,
    full: bool,
) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .context("Invalid progress template")?,
    );
    spinner.enable_steady_tick(Duration::from_millis(120));

    engine.start();

    let deadline = async {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(deadline, ctrl_c);

    let mut refresh = tokio::time::interval(REFRESH_INTERVAL);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl+C")?;
                tracing::info!("Interrupted");
                break;
            }
            _ = refresh.tick() => spinner.set_message(progress_message(&engine.snapshot())),
        }
    }

    engine.stop();
    spinner.set_message("waiting for in-flight requests");
    let tallies = engine.drain().await;
    spinner.finish_and_clear();

    let mut total = WorkerStats::new();
    for tally in &tallies {
        total.merge(tally);
    }
    tracing::info!(
        workers = tallies.len(),
        completed = total.completed,
        errors = total.errors,
        "Run finished"
    );

    // the log always receives the full state
    let recent = engine.report();
    let report = if full { engine.full_report() } else { recent };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }

    Ok(())
}

fn progress_message(snapshot: &EngineSnapshot) -> String {
    format!(
        "{} calls, {} errors | {} workers @ {}ms -> {}",
        snapshot.call_count,
        snapshot.error_count,
        snapshot.active_workers,
        snapshot.delay_millis,
        snapshot.target_uri
    )
}
