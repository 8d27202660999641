// src/process/reshape.rs

use std::borrow::Cow;
use tracing::debug;

use super::{convert::convert_to_final_types, raw_table::RawTable, CanonicalTable};
use crate::config::TableSpec;
use crate::error::ReshapeError;

/// Summary/footer rows at the bottom of every paired report table.
pub const FOOTER_ROWS: usize = 4;

/// How a report table is laid out on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Two logical columns printed twice side by side (0–1 and 2–3), followed by
    /// [`FOOTER_ROWS`] summary rows.
    Paired,
    /// Already one row per record.
    AsIs,
}

/// Turn a raw table into its canonical form: merge column pairs if needed,
/// normalize names, drop incomplete rows, cast to the declared schema.
pub fn reshape(raw: &RawTable, spec: &TableSpec) -> Result<CanonicalTable, ReshapeError> {
    let merged: Cow<'_, RawTable> = match spec.layout {
        Layout::Paired => Cow::Owned(unpair(raw, &spec.id)?),
        Layout::AsIs => Cow::Borrowed(raw),
    };

    let headers: Vec<String> = merged
        .headers
        .iter()
        .map(|h| normalize_column_name(h))
        .collect();

    let rows: Vec<Vec<&str>> = merged
        .rows
        .iter()
        .filter_map(|row| row.iter().map(Option::as_deref).collect::<Option<Vec<_>>>())
        .collect();

    let dropped = merged.num_rows() - rows.len();
    if dropped > 0 {
        debug!(table = %spec.id, dropped, "dropped rows with missing values");
    }

    let batch = convert_to_final_types(&spec.id, &headers, &rows, &spec.schema)?;
    Ok(CanonicalTable {
        table_id: spec.id.clone(),
        batch,
    })
}

/// Drop the footer rows and stack column pair (2,3) under pair (0,1), taking
/// the first pair's labels.
pub fn unpair(raw: &RawTable, table_id: &str) -> Result<RawTable, ReshapeError> {
    if raw.num_columns() < 4 {
        return Err(ReshapeError::Shape {
            table: table_id.to_string(),
            columns: raw.num_columns(),
        });
    }

    let keep = raw.num_rows().saturating_sub(FOOTER_ROWS);
    let body = RawTable {
        headers: raw.headers.clone(),
        rows: raw.rows[..keep].to_vec(),
    };

    let mut rows = body.project(&[0, 1]);
    rows.extend(body.project(&[2, 3]));

    Ok(RawTable {
        headers: raw.headers[..2].to_vec(),
        rows,
    })
}

/// Lower-case and replace spaces with underscores.
pub fn normalize_column_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AGE_GROUP_TABLE;
    use crate::schema::{ColumnType, TableSchema};
    use arrow::array::{Int32Array, StringArray};
    use regex::Regex;

    fn paired_raw(data_rows: usize) -> RawTable {
        let mut rows: Vec<Vec<Option<String>>> = (0..data_rows)
            .map(|i| {
                vec![
                    Some(format!("{}-{}", i * 10, i * 10 + 9)),
                    Some(format!("{}", i)),
                    Some(format!("{}+", 100 + i)),
                    Some(format!("{}", 100 + i)),
                ]
            })
            .collect();
        for label in ["Total", "Sum", "Notes", "Source"] {
            rows.push(vec![Some(label.into()), None, None, None]);
        }
        RawTable {
            headers: vec![
                "Age Range".into(),
                "Count".into(),
                "Age Range".into(),
                "Count".into(),
            ],
            rows,
        }
    }

    fn spec(id: &str, layout: Layout, columns: Vec<(&str, ColumnType)>) -> TableSpec {
        TableSpec {
            id: id.to_string(),
            matcher: Regex::new("Age Range").unwrap(),
            layout,
            schema: TableSchema::new(
                columns
                    .into_iter()
                    .map(|(n, t)| (n.to_string(), t))
                    .collect(),
            ),
        }
    }

    fn pair_spec() -> TableSpec {
        spec(
            "ic3__victims_by_state",
            Layout::Paired,
            vec![("age_range", ColumnType::String), ("count", ColumnType::Int32)],
        )
    }

    #[test]
    fn paired_table_drops_footer_and_doubles_rows() {
        let raw = paired_raw(6);
        assert_eq!(raw.num_rows(), 10);

        let merged = unpair(&raw, "t").unwrap();
        assert_eq!(merged.headers, vec!["Age Range", "Count"]);
        assert_eq!(merged.num_rows(), 12);

        let table = reshape(&raw, &pair_spec()).unwrap();
        assert_eq!(table.num_rows(), 12);
        assert_eq!(table.column_names(), vec!["age_range", "count"]);

        // left pair first, then right pair, each in source order
        let labels = table
            .batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(labels.value(0), "0-9");
        assert_eq!(labels.value(5), "50-59");
        assert_eq!(labels.value(6), "100+");
        assert_eq!(labels.value(11), "105+");
        let counts = table
            .batch
            .column(1)
            .as_any()
            .downcast_ref::<Int32Array>()
            .unwrap();
        assert_eq!(counts.value(6), 100);
    }

    #[test]
    fn paired_row_count_is_twice_rows_minus_footer() {
        for total in 4..16 {
            let raw = paired_raw(total - FOOTER_ROWS);
            assert_eq!(raw.num_rows(), total);
            let merged = unpair(&raw, "t").unwrap();
            assert_eq!(merged.num_rows(), 2 * (total - FOOTER_ROWS));
        }
    }

    #[test]
    fn footer_only_table_becomes_empty() {
        let mut raw = paired_raw(0);
        raw.rows.truncate(2);
        let table = reshape(&raw, &pair_spec()).unwrap();
        assert_eq!(table.num_rows(), 0);
    }

    #[test]
    fn age_group_table_used_as_extracted() {
        let raw = paired_raw(6);
        let spec = spec(
            AGE_GROUP_TABLE,
            Layout::AsIs,
            vec![("age_range", ColumnType::String), ("count", ColumnType::String)],
        );
        let table = reshape(&raw, &spec).unwrap();
        // six data rows survive; the four footer rows carry missing cells
        assert_eq!(table.num_rows(), 6);
        assert_eq!(
            table.column_names(),
            vec!["age_range", "count", "age_range", "count"]
        );
    }

    #[test]
    fn as_is_keeps_every_complete_row() {
        let raw = RawTable {
            headers: vec!["Age Range".into(), "Count".into(), "Amount Loss".into()],
            rows: vec![
                vec![Some("Under 20".into()), Some("17".into()), Some("$2,000".into())],
                vec![Some("20 - 29".into()), Some("1,204".into()), Some("$9,000".into())],
                vec![Some("30 - 39".into()), None, Some("$1".into())],
            ],
        };
        let spec = spec(
            AGE_GROUP_TABLE,
            Layout::AsIs,
            vec![
                ("age_range", ColumnType::String),
                ("count", ColumnType::Int32),
                ("amount_loss", ColumnType::String),
            ],
        );
        let table = reshape(&raw, &spec).unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.column_names(), vec!["age_range", "count", "amount_loss"]);
    }

    #[test]
    fn paired_layout_needs_four_columns() {
        let raw = RawTable {
            headers: vec!["A".into(), "B".into(), "C".into()],
            rows: vec![],
        };
        assert!(matches!(
            unpair(&raw, "t"),
            Err(ReshapeError::Shape { columns: 3, .. })
        ));
    }

    #[test]
    fn normalize_is_idempotent() {
        for name in ["Age Range", "Amount Loss", "count", "Crime  Type", "already_done"] {
            let once = normalize_column_name(name);
            assert_eq!(normalize_column_name(&once), once);
        }
        assert_eq!(normalize_column_name("Amount Loss"), "amount_loss");
    }
}
