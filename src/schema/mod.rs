pub mod arrow;
pub mod types;

pub use arrow::{build_arrow_schema, map_to_arrow_type};
pub use types::{ColumnType, RawTableSchema, TableSchema};
