// ============================================================
// TABULAR INPUT LOADER
// ============================================================
// Turns uploaded bytes into a Dataset. The file extension picks the parser.

mod csv_reader;
mod encoding;
mod spreadsheet_reader;

pub use csv_reader::CsvReader;
pub use encoding::decode_text;
pub use spreadsheet_reader::read_spreadsheet;

use std::path::Path;

use crate::domain::dataset::Dataset;
use crate::domain::error::{AppError, Result};

/// Upload formats the loader accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Xlsx,
    Xls,
}

impl InputFormat {
    pub const ACCEPTED_EXTENSIONS: [&'static str; 3] = ["csv", "xlsx", "xls"];

    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .ok_or_else(|| {
                AppError::UnsupportedFormat(format!("{} has no file extension", file_name))
            })?;

        match extension.as_str() {
            "csv" => Ok(InputFormat::Csv),
            "xlsx" => Ok(InputFormat::Xlsx),
            "xls" => Ok(InputFormat::Xls),
            other => Err(AppError::UnsupportedFormat(format!(
                "{} (expected one of: {})",
                other,
                Self::ACCEPTED_EXTENSIONS.join(", ")
            ))),
        }
    }

    pub fn is_spreadsheet(&self) -> bool {
        !matches!(self, InputFormat::Csv)
    }
}

/// Parses uploads into datasets.
#[derive(Debug, Default, Clone)]
pub struct TabularLoader {
    csv: CsvReader,
}

impl TabularLoader {
    pub fn new(csv: CsvReader) -> Self {
        Self { csv }
    }

    /// Load an upload, choosing the parser from the file name.
    pub fn load(&self, file_name: &str, bytes: &[u8]) -> Result<Dataset> {
        let format = InputFormat::from_file_name(file_name)?;
        self.load_as(format, bytes)
    }

    pub fn load_as(&self, format: InputFormat, bytes: &[u8]) -> Result<Dataset> {
        let dataset = if format.is_spreadsheet() {
            read_spreadsheet(format, bytes)?
        } else {
            self.csv.read(bytes)?
        };

        tracing::debug!(
            ?format,
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            "Upload parsed"
        );

        Ok(dataset)
    }
}
