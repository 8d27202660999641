// src/store/mod.rs

use arrow::record_batch::RecordBatch;
use chrono::Utc;
use glob::glob;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{
    fs::{self, File},
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, error, info, warn};

use crate::error::WriteError;
use crate::process::CanonicalTable;

/// Directory holding every file for one (table, year, state).
///
/// `<root>/<table_id>/year=<year>/state=<state_name>`
pub fn partition_dir(root: &Path, table_id: &str, year: u32, state_name: &str) -> PathBuf {
    root.join(table_id)
        .join(format!("year={year}"))
        .join(format!("state={}", sanitize_segment(state_name)))
}

/// Keep a partition value inside a single path segment.
fn sanitize_segment(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect()
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> WriteError + '_ {
    move |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn pq_err(path: &Path) -> impl FnOnce(parquet::errors::ParquetError) -> WriteError + '_ {
    move |source| WriteError::Parquet {
        path: path.to_path_buf(),
        source,
    }
}

/// Appends canonical tables to a hive-style partitioned parquet dataset.
///
/// Existing files are never touched; every write adds one file.
#[derive(Debug, Clone)]
pub struct PartitionWriter {
    root: PathBuf,
    props: WriterProperties,
}

impl PartitionWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        Self {
            root: root.into(),
            props,
        }
    }

    /// Write `table` as a new file in its partition and return the file's path.
    pub fn write(
        &self,
        table: &CanonicalTable,
        year: u32,
        state_name: &str,
    ) -> Result<PathBuf, WriteError> {
        let dir = partition_dir(&self.root, &table.table_id, year, state_name);
        fs::create_dir_all(&dir).map_err(io_err(&dir))?;

        let out_path = next_file_name(&dir);
        let file_name = out_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = dir.join(format!(".{file_name}.tmp"));

        write_then_rename(&table.batch, &self.props, &temp_path, &out_path)?;

        info!(
            table = %table.table_id,
            rows = table.num_rows(),
            path = %dir.display(),
            "data has been loaded to the partition"
        );
        Ok(out_path)
    }
}

/// Write `batch` to `temp_path`, then move it to `out_path`. On any failure the
/// temp file is removed so the partition only ever holds complete files.
fn write_then_rename(
    batch: &RecordBatch,
    props: &WriterProperties,
    temp_path: &Path,
    out_path: &Path,
) -> Result<(), WriteError> {
    let result = (|| -> Result<(), WriteError> {
        let file = File::create(temp_path).map_err(io_err(temp_path))?;
        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props.clone()))
            .map_err(pq_err(temp_path))?;
        writer.write(batch).map_err(pq_err(temp_path))?;
        writer.close().map_err(pq_err(temp_path))?;
        fs::rename(temp_path, out_path).map_err(io_err(out_path))
    })();

    if let Err(e) = &result {
        error!(temp_path = %temp_path.display(), "write failed: {}", e);
        if let Err(rm) = fs::remove_file(temp_path) {
            if rm.kind() != ErrorKind::NotFound {
                warn!(temp_path = %temp_path.display(), "could not remove temp file: {}", rm);
            }
        }
    }
    result
}

/// `part-<utc micros>-<n>.parquet`, with `n` bumped until the name is unused.
fn next_file_name(dir: &Path) -> PathBuf {
    let ts = Utc::now().timestamp_micros();
    let mut n = 0u32;
    loop {
        let candidate = dir.join(format!("part-{ts}-{n}.parquet"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// All parquet files of a partition (or any dataset directory), sorted by name.
pub fn partition_files(dir: &Path) -> Result<Vec<PathBuf>, WriteError> {
    let pattern = format!("{}/**/*.parquet", dir.display());
    let mut files: Vec<PathBuf> = glob(&pattern)
        .map_err(|source| WriteError::Pattern {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(Result::ok)
        .collect();
    files.sort();
    Ok(files)
}

/// Read every file under `dir` back as record batches: the union of all writes.
pub fn read_partition(dir: &Path) -> Result<Vec<RecordBatch>, WriteError> {
    let mut batches = Vec::new();
    for path in partition_files(dir)? {
        let file = File::open(&path).map_err(io_err(&path))?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(pq_err(&path))?
            .build()
            .map_err(pq_err(&path))?;
        for batch in reader {
            let batch = batch.map_err(|e| WriteError::Parquet {
                path: path.clone(),
                source: e.into(),
            })?;
            batches.push(batch);
        }
        debug!(path = %path.display(), "read partition file");
    }
    Ok(batches)
}
