// src/pipeline.rs

use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::config::{ErrorPolicy, JobConfig, TableSpec};
use crate::error::PipelineError;
use crate::fetch::{snapshot::save_snapshot, FetchResult, ReportSource, STATE_COUNT};
use crate::process::{self, QualityReport};
use crate::store::PartitionWriter;

/// Where a pipeline is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Aborted,
}

/// Counters for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub units_fetched: usize,
    pub tables_written: usize,
    pub quality_rejected: usize,
    pub errors_skipped: usize,
}

#[derive(Debug)]
pub enum RunOutcome {
    Completed(RunSummary),
    Aborted {
        summary: RunSummary,
        error: PipelineError,
    },
}

impl RunOutcome {
    pub fn summary(&self) -> RunSummary {
        match self {
            RunOutcome::Completed(summary) | RunOutcome::Aborted { summary, .. } => *summary,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, RunOutcome::Aborted { .. })
    }
}

/// Result of pushing one table through extract → reshape → validate → write.
#[derive(Debug)]
enum TableOutcome {
    Written(PathBuf),
    Rejected(QualityReport),
}

/// Drives years × states × tables, one unit at a time.
pub struct Pipeline<S> {
    config: JobConfig,
    source: S,
    writer: PartitionWriter,
    state: RunState,
    summary: RunSummary,
}

impl<S: ReportSource> Pipeline<S> {
    pub fn new(config: JobConfig, source: S) -> Self {
        let writer = PartitionWriter::new(config.local_folder_path.clone());
        Self {
            config,
            source,
            writer,
            state: RunState::Idle,
            summary: RunSummary::default(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run every (year, state, table) unit. Under [`ErrorPolicy::AbortAll`] the
    /// first error ends the run, except quality rejects and failed requests.
    pub async fn run(&mut self) -> RunOutcome {
        self.state = RunState::Running;
        self.summary = RunSummary::default();
        info!(
            years = self.config.years.len(),
            tables = self.config.tables.len(),
            policy = ?self.config.on_error,
            "successfully initialized logging"
        );

        match self.run_all().await {
            Ok(()) => {
                self.state = RunState::Completed;
                info!(summary = ?self.summary, "run completed");
                RunOutcome::Completed(self.summary)
            }
            Err(err) => {
                self.state = RunState::Aborted;
                error!(summary = ?self.summary, "an error occurred: {}", err);
                RunOutcome::Aborted {
                    summary: self.summary,
                    error: err,
                }
            }
        }
    }

    async fn run_all(&mut self) -> Result<(), PipelineError> {
        let policy = self.config.on_error;

        for &year in &self.config.years {
            for state_index in 1..=STATE_COUNT {
                let fetched = match self.source.fetch(year, state_index).await {
                    Ok(fetched) => fetched,
                    Err(err) => {
                        skip_or_abort(policy, &mut self.summary, err.into(), year, state_index, None)?;
                        continue;
                    }
                };
                self.summary.units_fetched += 1;

                if let Some(dir) = &self.config.raw_html_dir {
                    if let Err(e) = save_snapshot(dir, &fetched).await {
                        warn!(year, state = %fetched.state_name, "snapshot failed: {}", e);
                    }
                }

                for spec in &self.config.tables {
                    match process_table(&self.writer, &fetched, spec) {
                        Ok(TableOutcome::Written(path)) => {
                            self.summary.tables_written += 1;
                            debug!(path = %path.display(), "wrote file");
                        }
                        Ok(TableOutcome::Rejected(report)) => {
                            self.summary.quality_rejected += 1;
                            error!(
                                year,
                                state = %fetched.state_name,
                                table = %spec.id,
                                missing = report.missing_values,
                                duplicates = report.duplicate_rows,
                                "data quality issues"
                            );
                        }
                        Err(err) => skip_or_abort(
                            policy,
                            &mut self.summary,
                            err,
                            year,
                            state_index,
                            Some(spec.id.as_str()),
                        )?,
                    }
                }
            }
        }
        Ok(())
    }
}

fn process_table(
    writer: &PartitionWriter,
    fetched: &FetchResult,
    spec: &TableSpec,
) -> Result<TableOutcome, PipelineError> {
    let raw = process::extract(&fetched.body, &spec.id, &spec.matcher)?;
    let table = process::reshape(&raw, spec)?;
    info!(table = %spec.id, rows = table.num_rows(), "table created");

    let report = process::inspect(&table);
    if !report.is_clean() {
        return Ok(TableOutcome::Rejected(report));
    }
    let path = writer.write(&table, fetched.year, &fetched.state_name)?;
    Ok(TableOutcome::Written(path))
}

/// The single place where the error-scope policy is applied. A failed request
/// only costs its own (year, state) unit under either policy.
fn skip_or_abort(
    policy: ErrorPolicy,
    summary: &mut RunSummary,
    err: PipelineError,
    year: u32,
    state_index: u32,
    table: Option<&str>,
) -> Result<(), PipelineError> {
    let network = matches!(&err, PipelineError::Fetch(e) if e.is_network());
    match policy {
        ErrorPolicy::AbortAll if !network => Err(err),
        _ => {
            summary.errors_skipped += 1;
            error!(year, state_index, table = table.unwrap_or("-"), "skipping unit: {}", err);
            Ok(())
        }
    }
}
