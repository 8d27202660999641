// src/logging.rs

use anyhow::{Context, Result};
use std::{fs::OpenOptions, path::Path, sync::Mutex};
use tracing::{Dispatch, Level};
use tracing_subscriber::{fmt, fmt::writer::MakeWriterExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Build the run's log sink: timestamped lines appended to `log_path`, with
/// warnings and errors also copied to stderr.
///
/// The returned dispatch is handed to the pipeline rather than installed
/// globally.
pub fn file_dispatch(log_path: &Path, default_filter: &str) -> Result<Dispatch> {
    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("opening log file {}", log_path.display()))?;

    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let writer = Mutex::new(file).and(std::io::stderr.with_max_level(Level::WARN));
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_ansi(false)
        .with_target(true)
        .with_writer(writer)
        .finish();

    Ok(Dispatch::new(subscriber))
}
