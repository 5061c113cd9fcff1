// ============================================================
// CSV READER
// ============================================================
// Parse CSV uploads with encoding detection and type inference

use csv::{ReaderBuilder, StringRecord, Trim};

use super::encoding::decode_text;
use crate::domain::dataset::{normalize_headers, Cell, Dataset};
use crate::domain::error::{AppError, Result};

/// CSV reader producing typed datasets
#[derive(Debug, Clone)]
pub struct CsvReader {
    /// Delimiter character (default: comma)
    delimiter: u8,
}

impl Default for CsvReader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Decode and parse raw upload bytes
    pub fn read(&self, bytes: &[u8]) -> Result<Dataset> {
        let content = decode_text(bytes);
        self.parse_content(&content)
    }

    /// Parse CSV content. The first non-blank record is the header.
    pub fn parse_content(&self, content: &str) -> Result<Dataset> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(Trim::All)
            .has_headers(false)
            .flexible(true) // width is checked per row below
            .from_reader(content.as_bytes());

        let mut records = reader.records();

        let header = loop {
            match records.next() {
                None => {
                    return Err(AppError::UnreadableInput(
                        "No columns to parse from file".to_string(),
                    ))
                }
                Some(result) => {
                    let record = result.map_err(|e| {
                        AppError::UnreadableInput(format!("Failed to read CSV headers: {}", e))
                    })?;
                    if !is_blank_line(content, &record) {
                        break record;
                    }
                }
            }
        };

        let headers = normalize_headers(header.iter());
        let width = headers.len();
        let mut rows = Vec::new();

        for result in records {
            let record = result.map_err(|e| {
                AppError::UnreadableInput(format!("Failed to parse CSV row {}: {}", rows.len() + 1, e))
            })?;

            if is_blank_line(content, &record) {
                continue;
            }

            if record.len() > width {
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                return Err(AppError::UnreadableInput(format!(
                    "Error tokenizing data. Expected {} fields in line {}, saw {}",
                    width,
                    line,
                    record.len()
                )));
            }

            rows.push(parse_row(&record, width));
        }

        Dataset::from_rows(headers, rows).map_err(|e| AppError::UnreadableInput(e.to_string()))
    }
}

/// Short rows are padded with empty cells
fn parse_row(record: &StringRecord, width: usize) -> Vec<Cell> {
    let mut row: Vec<Cell> = record.iter().map(Cell::infer).collect();
    row.resize(width, Cell::Empty);
    row
}

/// True for whitespace-only source lines. A quoted empty field (`""`) is a
/// real single-column record holding an empty value and is kept.
fn is_blank_line(content: &str, record: &StringRecord) -> bool {
    if record.len() > 1 || !record.iter().all(|field| field.trim().is_empty()) {
        return false;
    }

    let Some(position) = record.position() else {
        return true;
    };

    // The recorded offset may sit before empty lines the parser skipped
    let rest = content
        .as_bytes()
        .get(position.byte() as usize..)
        .unwrap_or_default();
    let start = rest
        .iter()
        .position(|b| *b != b'\n' && *b != b'\r')
        .unwrap_or(rest.len());
    let line = rest[start..].split(|b| *b == b'\n').next().unwrap_or_default();

    !line.contains(&b'"')
}
