use super::dates::{format_date, parse_date};
use super::RawTable;
use crate::error::{Result, ValidationError};
use serde::{Deserialize, Serialize};

/// Expected shape of an uploaded table.
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: &'static str,
    required: Vec<&'static str>,
    optional: Vec<(&'static str, &'static str)>,
    date_columns: Vec<&'static str>,
}

/// How many rows were read and how many were dropped during coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub total_rows: usize,
    pub dropped_rows: usize,
}

impl ValidationReport {
    pub fn kept_rows(&self) -> usize {
        self.total_rows - self.dropped_rows
    }

    pub fn summary(&self, table: &str) -> String {
        if self.dropped_rows == 0 {
            format!("{} data loaded: {} rows", table, self.total_rows)
        } else {
            format!(
                "{} data loaded: {} of {} rows kept, {} dropped (unparseable values)",
                table,
                self.kept_rows(),
                self.total_rows,
                self.dropped_rows
            )
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedTable {
    pub table: RawTable,
    pub report: ValidationReport,
}

impl TableSchema {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            required: Vec::new(),
            optional: Vec::new(),
            date_columns: Vec::new(),
        }
    }

    pub fn required(mut self, columns: &[&'static str]) -> Self {
        self.required.extend_from_slice(columns);
        self
    }

    /// A column that is filled with `default` when absent or blank.
    pub fn optional(mut self, column: &'static str, default: &'static str) -> Self {
        self.optional.push((column, default));
        self
    }

    /// Columns coerced to `YYYY-MM-DD`; rows that fail to parse are dropped.
    pub fn dates(mut self, columns: &[&'static str]) -> Self {
        self.date_columns.extend_from_slice(columns);
        self
    }

    pub fn missing_columns(&self, table: &RawTable) -> Vec<String> {
        self.required
            .iter()
            .filter(|c| !table.has_column(c))
            .map(|c| c.to_string())
            .collect()
    }

    pub fn validate(&self, mut table: RawTable) -> Result<ValidatedTable> {
        let missing = self.missing_columns(&table);
        if !missing.is_empty() {
            return Err(ValidationError::MissingColumns {
                table: self.name.to_string(),
                missing,
            }
            .into());
        }

        for (column, default) in &self.optional {
            match table.column_index(column) {
                Some(idx) => {
                    for row in table.rows.iter_mut() {
                        if row[idx].is_empty() {
                            row[idx] = default.to_string();
                        }
                    }
                }
                None => {
                    table.columns.push(column.to_string());
                    for row in table.rows.iter_mut() {
                        row.push(default.to_string());
                    }
                }
            }
        }

        let total_rows = table.rows.len();
        let date_indices: Vec<usize> = self
            .date_columns
            .iter()
            .filter_map(|c| table.column_index(c))
            .collect();

        if !date_indices.is_empty() {
            table.rows.retain_mut(|row| {
                for &idx in &date_indices {
                    match parse_date(&row[idx]) {
                        Some(date) => row[idx] = format_date(date),
                        None => return false,
                    }
                }
                true
            });
        }

        let report = ValidationReport {
            total_rows,
            dropped_rows: total_rows - table.rows.len(),
        };

        if report.dropped_rows > 0 {
            tracing::warn!(
                "{} data: dropped {} of {} rows with unparseable dates",
                self.name,
                report.dropped_rows,
                total_rows
            );
        }

        Ok(ValidatedTable { table, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MaxWaterError;

    fn sensor_schema() -> TableSchema {
        TableSchema::new("sensor")
            .required(&["Sensor_ID", "Date", "Depth", "Moisture_Level"])
            .optional("Sensor_Type", "Unknown")
            .dates(&["Date"])
    }

    #[test]
    fn reports_exact_missing_set() {
        let table = RawTable::from_rows(&["Sensor_ID", "Date"], &[&["1", "2024-01-01"]]);
        let err = sensor_schema().validate(table).unwrap_err();
        match err {
            MaxWaterError::Validation(ValidationError::MissingColumns { table, missing }) => {
                assert_eq!(table, "sensor");
                assert_eq!(missing, vec!["Depth", "Moisture_Level"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn optional_column_defaults_when_absent() {
        let table = RawTable::from_rows(
            &["Sensor_ID", "Date", "Depth", "Moisture_Level"],
            &[&["1", "2024-01-01", "3", "25"]],
        );
        let validated = sensor_schema().validate(table).unwrap();
        let row = &validated.table.rows[0];
        assert_eq!(validated.table.cell(row, "Sensor_Type"), "Unknown");
    }

    #[test]
    fn blank_optional_cells_get_default() {
        let table = RawTable::from_rows(
            &["Sensor_ID", "Date", "Depth", "Moisture_Level", "Sensor_Type"],
            &[
                &["1", "2024-01-01", "3", "25", ""],
                &["2", "2024-01-01", "3", "25", "TDR"],
            ],
        );
        let validated = sensor_schema().validate(table).unwrap();
        let t = &validated.table;
        assert_eq!(t.cell(&t.rows[0], "Sensor_Type"), "Unknown");
        assert_eq!(t.cell(&t.rows[1], "Sensor_Type"), "TDR");
    }

    #[test]
    fn unparseable_dates_are_dropped_and_counted() {
        let table = RawTable::from_rows(
            &["Sensor_ID", "Date", "Depth", "Moisture_Level"],
            &[
                &["1", "01/05/2024", "3", "25"],
                &["1", "yesterday", "3", "25"],
                &["1", "", "3", "25"],
            ],
        );
        let validated = sensor_schema().validate(table).unwrap();
        assert_eq!(validated.report.total_rows, 3);
        assert_eq!(validated.report.dropped_rows, 2);
        let t = &validated.table;
        assert_eq!(t.cell(&t.rows[0], "Date"), "2024-01-05");
        assert!(validated.report.summary("Sensor").contains("2 dropped"));
    }
}
