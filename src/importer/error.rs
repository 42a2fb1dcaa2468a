// ==========================================
// mHealth Barangay San Cristobal - Import Error Types
// ==========================================
// Tooling: thiserror derive macros
// Layering: RepositoryError converts upward via #[from]; per-row
//           failures are collected in the batch summary, the variants
//           here abort the whole run
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// Import pipeline error taxonomy.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("file read failed: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("excel parse failed: {0}")]
    ExcelParse(String),

    #[error("csv parse failed: {0}")]
    CsvParse(#[from] csv::Error),

    #[error("row {row}: invalid date format: {value}")]
    InvalidDateFormat { row: usize, value: String },

    #[error("row {row}: invalid phone number: {value}")]
    InvalidPhoneFormat { row: usize, value: String },

    #[error("row {row}: invalid gender value: {value}")]
    InvalidGenderValue { row: usize, value: String },

    #[error("row {row}: missing required field: {field}")]
    MissingRequiredField { row: usize, field: String },

    #[error("batch setup failed: {0}")]
    BatchSetup(String),

    #[error(transparent)]
    Store(#[from] RepositoryError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result alias for the import pipeline.
pub type ImportResult<T> = Result<T, ImportError>;
