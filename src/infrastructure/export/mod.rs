use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use csv::{Terminator, WriterBuilder};

use crate::domain::dataset::Dataset;
use crate::domain::error::{AppError, Result};

pub const REPORT_FILE_NAME: &str = "investigation_report.csv";
pub const CSV_MIME_TYPE: &str = "text/csv";

/// Render a dataset as UTF-8 CSV: header row, then one line per row.
///
/// A dataset without columns renders as empty bytes. Rows cannot be written
/// without columns, so a zero-column dataset that still has rows is refused.
pub fn export_csv(dataset: &Dataset) -> Result<Vec<u8>> {
    if dataset.column_count() == 0 {
        if dataset.row_count() > 0 {
            return Err(AppError::Internal(format!(
                "Cannot export {} rows without columns",
                dataset.row_count()
            )));
        }
        return Ok(Vec::new());
    }

    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(dataset.column_names())
        .map_err(|e| AppError::Internal(format!("Failed to write CSV header: {}", e)))?;

    for (index, row) in dataset.rows().enumerate() {
        writer
            .write_record(row.iter().map(|cell| cell.to_string()))
            .map_err(|e| AppError::Internal(format!("Failed to write CSV row {}: {}", index, e)))?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush CSV: {}", e)))
}

/// A named download produced from a report dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn from_dataset(dataset: &Dataset, file_name: &str) -> Result<Self> {
        Ok(Self {
            file_name: file_name.to_string(),
            mime_type: CSV_MIME_TYPE.to_string(),
            bytes: export_csv(dataset)?,
        })
    }

    /// `data:` URI for inline download links.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }

    /// `Content-Disposition` value for attachment responses.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.file_name.replace('"', ""))
    }

    /// Download size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}
