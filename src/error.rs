use std::path::PathBuf;
use thiserror::Error;

pub type EtlResult<T> = Result<T, EtlError>;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path not found or not an Excel file: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("No Excel files found under {}", .0.display())]
    NoSpreadsheets(PathBuf),

    #[error(
        "{} and {} would both be written to {}",
        .first.display(),
        .second.display(),
        .destination.display()
    )]
    OutputCollision {
        first: PathBuf,
        second: PathBuf,
        destination: PathBuf,
    },

    #[error("Cannot read sheet '{sheet}': {reason}")]
    SheetRead { sheet: String, reason: String },

    #[error("Import error: {0}")]
    Import(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Invalid rules: {0}")]
    Rules(String),
}

impl EtlError {
    pub fn sheet_read(sheet: &str, reason: impl Into<String>) -> Self {
        EtlError::SheetRead {
            sheet: sheet.to_string(),
            reason: reason.into(),
        }
    }
}
