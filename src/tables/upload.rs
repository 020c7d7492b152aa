use super::dates::format_date;
use super::RawTable;
use crate::error::{Result, ValidationError};
use base64::Engine;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Delimited,
    Spreadsheet,
}

impl FileFormat {
    pub fn from_filename(filename: &str) -> Result<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" | "txt" | "tsv" => Ok(FileFormat::Delimited),
            "xls" | "xlsx" | "xlsm" | "xlsb" | "ods" => Ok(FileFormat::Spreadsheet),
            _ => Err(ValidationError::UnsupportedFormat(filename.to_string()).into()),
        }
    }
}

/// An uploaded file: raw bytes plus the name used for format dispatch.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn from_bytes(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Decode a browser upload of the form `data:<mime>;base64,<payload>`.
    pub fn from_data_url(contents: &str, filename: impl Into<String>) -> Result<Self> {
        let filename = filename.into();
        let (_, payload) = contents.split_once(',').ok_or_else(|| {
            ValidationError::Unparseable(format!("{}: missing content-type prefix", filename))
        })?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| ValidationError::Unparseable(format!("{}: {}", filename, e)))?;

        Ok(Self { filename, bytes })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(Self { filename, bytes })
    }

    pub fn read_table(&self) -> Result<RawTable> {
        let table = match FileFormat::from_filename(&self.filename)? {
            FileFormat::Delimited => read_delimited(&self.bytes, &self.filename)?,
            FileFormat::Spreadsheet => read_spreadsheet(self.bytes.clone(), &self.filename)?,
        };
        tracing::debug!(
            "Read {} rows x {} columns from {}",
            table.rows.len(),
            table.columns.len(),
            self.filename
        );
        Ok(table)
    }
}

fn read_delimited(bytes: &[u8], filename: &str) -> Result<RawTable> {
    let delimiter = if filename.to_lowercase().ends_with(".tsv") {
        b'\t'
    } else {
        b','
    };

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if columns.iter().all(|c| c.is_empty()) {
        return Err(ValidationError::Unparseable(format!("{}: no header row", filename)).into());
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable::new(columns, rows))
}

fn read_spreadsheet(bytes: Vec<u8>, filename: &str) -> Result<RawTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook.worksheet_range_at(0).ok_or_else(|| {
        ValidationError::Unparseable(format!("{}: workbook has no sheets", filename))
    })??;

    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(cell_text).collect(),
        None => {
            return Err(
                ValidationError::Unparseable(format!("{}: sheet is empty", filename)).into(),
            )
        }
    };

    let rows = rows
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    Ok(RawTable::new(columns, rows))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| format_date(d.date()))
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MaxWaterError;

    fn data_url(text: &str) -> String {
        format!(
            "data:text/csv;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(text)
        )
    }

    #[test]
    fn format_dispatch_by_extension() {
        assert_eq!(
            FileFormat::from_filename("sensors.CSV").unwrap(),
            FileFormat::Delimited
        );
        assert_eq!(
            FileFormat::from_filename("planting.xlsx").unwrap(),
            FileFormat::Spreadsheet
        );
        assert_eq!(
            FileFormat::from_filename("old.xls").unwrap(),
            FileFormat::Spreadsheet
        );
    }

    #[test]
    fn unsupported_extension_is_validation_error() {
        let err = FileFormat::from_filename("notes.pdf").unwrap_err();
        assert!(matches!(
            err,
            MaxWaterError::Validation(ValidationError::UnsupportedFormat(_))
        ));
        assert!(FileFormat::from_filename("no_extension").is_err());
    }

    #[test]
    fn decodes_base64_csv_upload() {
        let upload = Upload::from_data_url(
            &data_url("FarmID,2024-01-01, Total\nA, 3 ,3\nB,4,4\n"),
            "irrigation.csv",
        )
        .unwrap();
        let table = upload.read_table().unwrap();
        assert_eq!(table.columns, vec!["FarmID", "2024-01-01", "Total"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["A", "3", "3"]);
    }

    #[test]
    fn short_rows_are_padded() {
        let upload = Upload::from_bytes(b"a,b,c\n1,2\n".to_vec(), "t.csv");
        let table = upload.read_table().unwrap();
        assert_eq!(table.rows[0], vec!["1", "2", ""]);
    }

    #[test]
    fn missing_prefix_is_unparseable() {
        let err = Upload::from_data_url("not-a-data-url", "x.csv").unwrap_err();
        assert!(matches!(
            err,
            MaxWaterError::Validation(ValidationError::Unparseable(_))
        ));
    }

    #[test]
    fn bad_base64_is_unparseable() {
        let err = Upload::from_data_url("data:text/csv;base64,@@@@", "x.csv").unwrap_err();
        assert!(matches!(
            err,
            MaxWaterError::Validation(ValidationError::Unparseable(_))
        ));
    }

    #[test]
    fn garbage_spreadsheet_is_an_error() {
        let upload = Upload::from_bytes(b"definitely not a workbook".to_vec(), "farm.xlsx");
        assert!(upload.read_table().is_err());
    }
}
