/// One HTML table as parsed: header labels verbatim, data cells as optional strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTable {
    /// Column labels from the table's first row, case and spacing preserved.
    pub headers: Vec<String>,
    /// Each data row, one cell per header; `None` marks a missing value.
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.headers.len()
    }

    /// Columns `cols` of every row, in row order.
    pub fn project(&self, cols: &[usize]) -> Vec<Vec<Option<String>>> {
        self.rows
            .iter()
            .map(|row| cols.iter().map(|&c| row.get(c).cloned().flatten()).collect())
            .collect()
    }
}
