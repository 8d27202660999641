use anyhow::{Context, Result};
use ic3scraper::{
    config::{load_params, DEFAULT_JOB},
    fetch::HttpSource,
    logging,
    pipeline::{Pipeline, RunOutcome},
};
use std::{env, path::PathBuf, process::ExitCode};
use tracing::instrument::WithSubscriber;

/// Looked up in the working directory unless `IC3_PARAMS` names another file.
const PARAMS_FILE: &str = "params.json";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // ─── 1) load the job ─────────────────────────────────────────────
    let params_path = match env::var_os("IC3_PARAMS") {
        Some(path) => PathBuf::from(path),
        None => env::current_dir()
            .context("resolving working directory")?
            .join(PARAMS_FILE),
    };
    let config = load_params(&params_path, DEFAULT_JOB)?;

    // ─── 2) init logging ─────────────────────────────────────────────
    let dispatch = logging::file_dispatch(&config.log_file, logging::DEFAULT_FILTER)?;

    // ─── 3) fetch, reshape, validate, write ──────────────────────────
    let source = HttpSource::from_config(&config)?;
    let mut pipeline = Pipeline::new(config, source);
    let outcome = pipeline.run().with_subscriber(dispatch).await;

    Ok(match outcome {
        RunOutcome::Completed(_) => ExitCode::SUCCESS,
        RunOutcome::Aborted { .. } => ExitCode::FAILURE,
    })
}
