pub mod dates;
pub mod readers;
pub mod schema;
pub mod upload;

pub use readers::{
    hybrid_assignments, planting_records, sensor_records, usage_records, Parsed,
};
pub use schema::{TableSchema, ValidatedTable, ValidationReport};
pub use upload::{FileFormat, Upload};

/// An uploaded table as trimmed string cells. Every row has one cell per column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Build from string literals. Mostly useful for tests and demos.
    pub fn from_rows(columns: &[&str], rows: &[&[&str]]) -> Self {
        Self::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell text, or "" when the column is absent.
    pub fn cell<'a>(&'a self, row: &'a [String], column: &str) -> &'a str {
        self.column_index(column)
            .and_then(|idx| row.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Lenient numeric parse: blanks and non-numeric text give `None`.
pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integer ids may arrive as "7" or, from spreadsheets, "7.0".
pub fn parse_id(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>().ok().or_else(|| {
        parse_number(s)
            .filter(|v| v.fract() == 0.0)
            .map(|v| v as i64)
    })
}
