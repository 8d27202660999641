// src/error.rs

use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading or checking the job configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("url template {0:?} has no {{year}} placeholder")]
    MissingYearPlaceholder(String),

    #[error("url template renders to an invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("job {0:?} not found in params file")]
    UnknownJob(String),

    #[error("no years configured")]
    NoYears,

    #[error("no tables configured")]
    NoTables,

    #[error("match text for table {table:?} is not a valid pattern: {source}")]
    BadMatchText {
        table: String,
        #[source]
        source: regex::Error,
    },

    #[error("table {0:?} has no dtype entry")]
    MissingSchema(String),

    #[error("unknown column type {ty:?} for {table}.{column}")]
    UnknownType {
        table: String,
        column: String,
        ty: String,
    },
}

/// Failures fetching one (year, state) report page.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("state index {0} outside 1..={max}", max = crate::fetch::STATE_COUNT)]
    InvalidStateIndex(u32),

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("state index {index} not in option list ({available} options)")]
    StateNotListed { index: u32, available: usize },
}

impl FetchError {
    /// Network-level failures. These lose the (year, state) unit but never end
    /// the run, whatever the error policy.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout { .. } | FetchError::Transport { .. } | FetchError::Status { .. }
        )
    }
}

/// No table in the page matched the configured text.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("table not found for id {0:?}")]
    TableNotFound(String),

    #[error("table for id {0:?} has no header row")]
    EmptyTable(String),
}

/// Failures turning a raw table into its canonical, typed form.
#[derive(Error, Debug)]
pub enum ReshapeError {
    #[error("table {table:?} has {columns} columns, paired layout needs at least 4")]
    Shape { table: String, columns: usize },

    #[error("column {column:?} of table {table:?} has no declared type")]
    UndeclaredColumn { table: String, column: String },

    #[error("declared column {column:?} missing from table {table:?}")]
    MissingColumn { table: String, column: String },

    #[error("cannot cast {value:?} in column {column:?} to {ty}")]
    Cast {
        column: String,
        value: String,
        ty: String,
    },

    #[error("building record batch: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

/// Failures persisting a canonical table to its partition.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parquet error at {path}: {source}")]
    Parquet {
        path: PathBuf,
        #[source]
        source: parquet::errors::ParquetError,
    },

    #[error("bad glob for {path}: {source}")]
    Pattern {
        path: PathBuf,
        #[source]
        source: glob::PatternError,
    },
}

/// Anything that can end a unit of work inside the orchestrator.
///
/// Quality failures are not represented here: they are logged and skipped
/// where they occur.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Reshape(#[from] ReshapeError),

    #[error(transparent)]
    Write(#[from] WriteError),
}
