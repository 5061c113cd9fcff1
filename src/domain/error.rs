use thiserror::Error;

/// Request-level failures. Only the input errors are visible to the end user
/// as a hard stop; provider failures never reach this type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Could not read file: {0}")]
    UnreadableInput(String),
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the error was caused by the uploaded file rather than the service.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AppError::UnreadableInput(_) | AppError::UnsupportedFormat(_)
        )
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::UnreadableInput(err.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
