//! Error types for the celldist library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum CellDistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Empty input: no points labelled '{0}' in field")]
    EmptyInput(String),

    #[error("Unknown label '{0}'")]
    UnknownLabel(String),

    #[error("No matching target labels: {0}")]
    NoMatch(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Matrices were built against different label vocabularies")]
    VocabularyMismatch,

    #[error("Missing column '{0}' in cell table")]
    MissingColumn(String),

    #[error("Invalid coordinate '{value}' at row {row}")]
    InvalidCoordinate { value: String, row: usize },

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Plotting error: {0}")]
    Plot(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, CellDistError>;
