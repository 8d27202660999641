// src/process/extract.rs

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::raw_table::RawTable;
use crate::error::ExtractError;

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("table selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("row selector"));
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").expect("cell selector"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

// Cell contents read as "no value". A lone "-" is data, not a missing marker.
const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "None", "#N/A", "<NA>",
];

// Guards against absurd colspan attributes.
const MAX_COLSPAN: usize = 64;

/// Locate the first `<table>` in `body` whose text matches `matcher` and return it
/// as a raw table. The first row supplies the headers.
pub fn extract(body: &str, table_id: &str, matcher: &Regex) -> Result<RawTable, ExtractError> {
    let doc = Html::parse_document(body);
    let table = doc
        .select(&TABLE)
        .find(|t| matcher.is_match(&t.text().collect::<String>()))
        .ok_or_else(|| ExtractError::TableNotFound(table_id.to_string()))?;

    let mut rows = table.select(&ROW).map(row_cells);
    let headers: Vec<String> = rows
        .next()
        .unwrap_or_default()
        .into_iter()
        .map(|(text, _)| text)
        .collect();
    if headers.is_empty() {
        return Err(ExtractError::EmptyTable(table_id.to_string()));
    }

    let width = headers.len();
    let rows = rows
        .map(|cells| {
            let mut row: Vec<Option<String>> = cells
                .into_iter()
                .map(|(text, missing)| (!missing).then_some(text))
                .collect();
            row.resize(width, None);
            row
        })
        .collect();

    Ok(RawTable { headers, rows })
}

/// Cell texts of one `<tr>`, each with a flag set when the cell holds no value.
fn row_cells(row: ElementRef<'_>) -> Vec<(String, bool)> {
    let mut out = Vec::new();
    for cell in row.select(&CELL) {
        let text = cell_text(cell);
        let missing = MISSING_TOKENS.contains(&text.as_str());
        let span = cell
            .value()
            .attr("colspan")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(1)
            .min(MAX_COLSPAN);
        for _ in 0..span {
            out.push((text.clone(), missing));
        }
    }
    out
}

fn cell_text(cell: ElementRef<'_>) -> String {
    let raw: String = cell.text().collect();
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}
