// src/process/mod.rs
pub mod convert;
pub mod extract;
pub mod quality;
pub mod raw_table;
pub mod reshape;

use arrow::record_batch::RecordBatch;

pub use extract::extract;
pub use quality::{inspect, validate, QualityReport};
pub use raw_table::RawTable;
pub use reshape::{reshape, Layout};

/// A reshaped, typed table ready for validation and writing.
#[derive(Debug, Clone)]
pub struct CanonicalTable {
    pub table_id: String,
    pub batch: RecordBatch,
}

impl CanonicalTable {
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }
}
