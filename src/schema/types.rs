// src/schema/types.rs

use serde::{Deserialize, Deserializer};
use std::{fmt, str::FromStr};

/// Semantic type a canonical column is cast to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    String,
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Int32 => "int32",
            ColumnType::Int64 => "int64",
            ColumnType::Float32 => "float32",
            ColumnType::Float64 => "float64",
            ColumnType::Bool => "bool",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the dtype names found in job files, including the pandas spellings.
impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" | "str" | "object" | "utf8" => Ok(ColumnType::String),
            "int32" | "int" | "integer" => Ok(ColumnType::Int32),
            "int64" | "bigint" => Ok(ColumnType::Int64),
            "float32" => Ok(ColumnType::Float32),
            "float" | "float64" | "double" | "decimal" => Ok(ColumnType::Float64),
            "bool" | "boolean" => Ok(ColumnType::Bool),
            other => Err(other.to_string()),
        }
    }
}

/// Declared columns of one destination table, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableSchema {
    pub columns: Vec<(String, ColumnType)>,
}

impl TableSchema {
    pub fn new(columns: Vec<(String, ColumnType)>) -> Self {
        Self { columns }
    }

    pub fn type_of(&self, column: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, ty)| *ty)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }
}

/// Raw `column -> type name` map as it appears in the job file. Type names are
/// parsed later so the error can name the table.
#[derive(Debug, Clone, Default)]
pub struct RawTableSchema(pub Vec<(String, String)>);

impl<'de> Deserialize<'de> for RawTableSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        crate::config::ordered_map(deserializer).map(RawTableSchema)
    }
}
