use arrow::{
    array::{ArrayRef, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray},
    record_batch::RecordBatch,
};
use std::{str::FromStr, sync::Arc};

use crate::error::ReshapeError;
use crate::schema::{build_arrow_schema, ColumnType, TableSchema};

/// Cast complete string rows into a typed batch, one column per header.
///
/// Every header needs a declared type and every declared column must be present.
pub fn convert_to_final_types(
    table_id: &str,
    headers: &[String],
    rows: &[Vec<&str>],
    schema: &TableSchema,
) -> Result<RecordBatch, ReshapeError> {
    if let Some(missing) = schema.names().find(|n| !headers.iter().any(|h| h.as_str() == *n)) {
        return Err(ReshapeError::MissingColumn {
            table: table_id.to_string(),
            column: missing.to_string(),
        });
    }

    let types = headers
        .iter()
        .map(|h| {
            schema.type_of(h).ok_or_else(|| ReshapeError::UndeclaredColumn {
                table: table_id.to_string(),
                column: h.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let arrow_schema = build_arrow_schema(headers.iter().map(String::as_str).zip(types.iter().copied()));

    let mut columns = Vec::with_capacity(headers.len());
    for (idx, (name, ty)) in headers.iter().zip(&types).enumerate() {
        let values = rows.iter().map(|row| row[idx]);
        columns.push(build_column(name, *ty, values)?);
    }

    Ok(RecordBatch::try_new(arrow_schema, columns)?)
}

fn build_column<'a, I>(column: &str, ty: ColumnType, values: I) -> Result<ArrayRef, ReshapeError>
where
    I: Iterator<Item = &'a str>,
{
    let array: ArrayRef = match ty {
        ColumnType::String => Arc::new(StringArray::from_iter_values(values)),
        ColumnType::Int32 => Arc::new(Int32Array::from(parse_all::<i32, _>(column, ty, values)?)),
        ColumnType::Int64 => Arc::new(Int64Array::from(parse_all::<i64, _>(column, ty, values)?)),
        ColumnType::Float32 => {
            Arc::new(Float32Array::from(parse_all::<f32, _>(column, ty, values)?))
        }
        ColumnType::Float64 => {
            Arc::new(Float64Array::from(parse_all::<f64, _>(column, ty, values)?))
        }
        ColumnType::Bool => {
            let parsed = values
                .map(|v| parse_bool(v).ok_or_else(|| cast_error(column, ty, v)))
                .collect::<Result<Vec<bool>, _>>()?;
            Arc::new(BooleanArray::from(parsed))
        }
    };
    Ok(array)
}

fn parse_all<'a, T, I>(column: &str, ty: ColumnType, values: I) -> Result<Vec<T>, ReshapeError>
where
    T: FromStr,
    I: Iterator<Item = &'a str>,
{
    values
        .map(|v| clean_number(v).parse::<T>().map_err(|_| cast_error(column, ty, v)))
        .collect()
}

/// Drop surrounding whitespace and thousands separators.
fn clean_number(raw: &str) -> String {
    raw.trim().chars().filter(|c| *c != ',').collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn cast_error(column: &str, ty: ColumnType, value: &str) -> ReshapeError {
    ReshapeError::Cast {
        column: column.to_string(),
        value: value.to_string(),
        ty: ty.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;

    fn schema() -> TableSchema {
        TableSchema::new(vec![
            ("crime_type".into(), ColumnType::String),
            ("victims".into(), ColumnType::Int32),
        ])
    }

    fn headers() -> Vec<String> {
        vec!["crime_type".into(), "victims".into()]
    }

    #[test]
    fn casts_with_thousands_separators() {
        let rows = vec![vec!["Advanced Fee", "1,024"], vec!["Lottery", " 12 "]];
        let batch = convert_to_final_types("t", &headers(), &rows, &schema()).unwrap();
        let victims = batch
            .column(1)
            .as_any()
            .downcast_ref::<Int32Array>()
            .unwrap();
        assert_eq!(victims.values().to_vec(), vec![1024, 12]);
        assert_eq!(victims.null_count(), 0);
    }

    #[test]
    fn uncastable_value_fails_whole_table() {
        let rows = vec![vec!["Advanced Fee", "1,024"], vec!["Lottery", "twelve"]];
        let err = convert_to_final_types("t", &headers(), &rows, &schema()).unwrap_err();
        match err {
            ReshapeError::Cast { column, value, ty } => {
                assert_eq!(column, "victims");
                assert_eq!(value, "twelve");
                assert_eq!(ty, "int32");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn undeclared_and_missing_columns() {
        let rows = vec![vec!["x", "1", "y"]];
        let wide: Vec<String> = vec!["crime_type".into(), "victims".into(), "extra".into()];
        assert!(matches!(
            convert_to_final_types("t", &wide, &rows, &schema()),
            Err(ReshapeError::UndeclaredColumn { column, .. }) if column == "extra"
        ));

        let narrow = vec!["crime_type".to_string()];
        let rows = vec![vec!["x"]];
        assert!(matches!(
            convert_to_final_types("t", &narrow, &rows, &schema()),
            Err(ReshapeError::MissingColumn { column, .. }) if column == "victims"
        ));
    }

    #[test]
    fn floats_and_bools() {
        let schema = TableSchema::new(vec![
            ("loss".into(), ColumnType::Float64),
            ("flag".into(), ColumnType::Bool),
        ]);
        let headers = vec!["loss".to_string(), "flag".to_string()];
        let rows = vec![vec!["1,234.50", "Yes"], vec!["0.5", "false"]];
        let batch = convert_to_final_types("t", &headers, &rows, &schema).unwrap();
        let loss = batch
            .column(0)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(loss.value(0), 1234.5);
        let flag = batch
            .column(1)
            .as_any()
            .downcast_ref::<BooleanArray>()
            .unwrap();
        assert!(flag.value(0));
        assert!(!flag.value(1));
    }
}
