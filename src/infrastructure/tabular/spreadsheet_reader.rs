use calamine::{Data, DataType, Range, Reader, Xls, Xlsx};
use std::fmt::Display;
use std::io::{Cursor, Read, Seek};

use super::InputFormat;
use crate::domain::dataset::{normalize_headers, Cell, Dataset};
use crate::domain::error::{AppError, Result};

/// Read the first worksheet of an XLSX/XLS upload. Row one is the header.
pub fn read_spreadsheet(format: InputFormat, bytes: &[u8]) -> Result<Dataset> {
    let cursor = Cursor::new(bytes);

    let range = match format {
        InputFormat::Xlsx => {
            let workbook: Xlsx<_> = Xlsx::new(cursor).map_err(|e| {
                AppError::UnreadableInput(format!("Failed to open Excel file: {}", e))
            })?;
            first_worksheet(workbook)?
        }
        InputFormat::Xls => {
            let workbook: Xls<_> = Xls::new(cursor).map_err(|e| {
                AppError::UnreadableInput(format!("Failed to open Excel file: {}", e))
            })?;
            first_worksheet(workbook)?
        }
        InputFormat::Csv => {
            return Err(AppError::Internal(
                "CSV input routed to the spreadsheet reader".to_string(),
            ))
        }
    };

    dataset_from_range(&range)
}

fn first_worksheet<RS, R>(mut workbook: R) -> Result<Range<Data>>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: Display,
{
    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::UnreadableInput("No worksheet found".to_string()))?
        .map_err(|e| AppError::UnreadableInput(format!("Failed to read Excel range: {}", e)))
}

fn dataset_from_range(range: &Range<Data>) -> Result<Dataset> {
    let mut rows = range.rows();

    let Some(header) = rows.next() else {
        return Ok(Dataset::empty());
    };

    let headers = normalize_headers(header.iter().map(header_text));
    let width = headers.len();

    let mut body: Vec<Vec<Cell>> = rows
        .map(|row| {
            let mut cells: Vec<Cell> = row.iter().map(to_cell).collect();
            cells.resize(width, Cell::Empty);
            cells
        })
        .collect();

    // Blank rows inside the sheet are kept; trailing ones are formatting residue
    while body
        .last()
        .is_some_and(|cells| cells.iter().all(Cell::is_empty))
    {
        body.pop();
    }

    Dataset::from_rows(headers, body).map_err(|e| AppError::UnreadableInput(e.to_string()))
}

fn header_text(cell: &Data) -> String {
    match to_cell(cell) {
        Cell::Empty => String::new(),
        Cell::Float(value) if value.fract() == 0.0 => format!("{}", value as i64),
        other => other.to_string(),
    }
}

fn to_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::Int(value) => Cell::Int(*value),
        Data::Float(value) => Cell::Float(*value),
        Data::Bool(value) => Cell::Bool(*value),
        Data::String(value) if value.trim().is_empty() => Cell::Empty,
        Data::String(value) => Cell::Text(value.clone()),
        Data::DateTime(value) if value.is_datetime() => {
            date_text(cell, value.as_f64() < 1.0).unwrap_or_else(|| Cell::Text(cell.to_string()))
        }
        Data::DateTimeIso(value) => {
            date_text(cell, false).unwrap_or_else(|| Cell::Text(value.clone()))
        }
        // Durations and formula errors keep their display text
        other => Cell::Text(other.to_string()),
    }
}

/// `2024-01-15 00:00:00`, or `09:30:00` for time-only cells.
fn date_text(cell: &Data, time_only: bool) -> Option<Cell> {
    let datetime = cell.as_datetime()?;
    let text = if time_only {
        datetime.format("%H:%M:%S").to_string()
    } else {
        datetime.format("%Y-%m-%d %H:%M:%S").to_string()
    };
    Some(Cell::Text(text))
}
