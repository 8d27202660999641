// src/schema/arrow.rs

use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema};
use std::sync::Arc;

use super::types::ColumnType;

/// Map a semantic column type onto the Arrow type written to parquet.
///
/// - string  → Utf8
/// - int32   → Int32
/// - int64   → Int64
/// - float32 → Float32
/// - float64 → Float64
/// - bool    → Boolean
pub fn map_to_arrow_type(ty: ColumnType) -> DataType {
    match ty {
        ColumnType::String => DataType::Utf8,
        ColumnType::Int32 => DataType::Int32,
        ColumnType::Int64 => DataType::Int64,
        ColumnType::Float32 => DataType::Float32,
        ColumnType::Float64 => DataType::Float64,
        ColumnType::Bool => DataType::Boolean,
    }
}

/// Build an ArrowSchema (inside an Arc) from `(name, type)` pairs, in order.
pub fn build_arrow_schema<'a, I>(cols: I) -> Arc<ArrowSchema>
where
    I: IntoIterator<Item = (&'a str, ColumnType)>,
{
    let fields: Vec<ArrowField> = cols
        .into_iter()
        .map(|(name, ty)| ArrowField::new(name, map_to_arrow_type(ty), /* nullable = */ true))
        .collect();

    Arc::new(ArrowSchema::new(fields))
}
