use arrow::row::{RowConverter, SortField};
use std::collections::HashSet;
use tracing::warn;

use super::CanonicalTable;

/// What the quality check found in one canonical table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QualityReport {
    pub missing_values: usize,
    pub duplicate_rows: usize,
}

impl QualityReport {
    pub fn is_clean(&self) -> bool {
        self.missing_values == 0 && self.duplicate_rows == 0
    }
}

/// Count missing cells and rows identical to an earlier row.
pub fn inspect(table: &CanonicalTable) -> QualityReport {
    let batch = &table.batch;
    let missing_values = batch.columns().iter().map(|c| c.null_count()).sum();

    let fields = batch
        .schema()
        .fields()
        .iter()
        .map(|f| SortField::new(f.data_type().clone()))
        .collect();
    let duplicate_rows = match RowConverter::new(fields)
        .and_then(|converter| converter.convert_columns(batch.columns()))
    {
        Ok(rows) => {
            let mut seen = HashSet::with_capacity(rows.num_rows());
            rows.iter().filter(|row| !seen.insert(*row)).count()
        }
        Err(e) => {
            // Only reachable for column types the row format cannot encode.
            warn!(table = %table.table_id, "row comparison failed: {}", e);
            batch.num_rows().max(1)
        }
    };

    QualityReport {
        missing_values,
        duplicate_rows,
    }
}

/// `true` when the table has no missing values and no duplicated rows.
pub fn validate(table: &CanonicalTable) -> bool {
    inspect(table).is_clean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Int32Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use std::sync::Arc;

    fn table(labels: Vec<Option<&str>>, counts: Vec<Option<i32>>) -> CanonicalTable {
        let schema = Arc::new(Schema::new(vec![
            Field::new("crime_type", DataType::Utf8, true),
            Field::new("count", DataType::Int32, true),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(labels)),
            Arc::new(Int32Array::from(counts)),
        ];
        CanonicalTable {
            table_id: "t".into(),
            batch: RecordBatch::try_new(schema, columns).unwrap(),
        }
    }

    #[test]
    fn unique_complete_rows_pass() {
        let t = table(
            vec![Some("Lottery"), Some("Lottery"), Some("Phishing")],
            vec![Some(1), Some(2), Some(1)],
        );
        assert!(validate(&t));
        assert_eq!(inspect(&t), QualityReport::default());
    }

    #[test]
    fn identical_rows_fail() {
        let t = table(
            vec![Some("Lottery"), Some("Phishing"), Some("Lottery")],
            vec![Some(7), Some(1), Some(7)],
        );
        assert!(!validate(&t));
        assert_eq!(inspect(&t).duplicate_rows, 1);
    }

    #[test]
    fn missing_values_fail() {
        let t = table(vec![Some("Lottery"), None], vec![Some(7), Some(1)]);
        let report = inspect(&t);
        assert_eq!(report.missing_values, 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn empty_table_is_clean() {
        let t = table(vec![], vec![]);
        assert!(validate(&t));
    }
}
