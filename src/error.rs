//! Error types for the ecomatrix library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum SurveyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid count value '{value}' for sample '{row}', category '{col}'")]
    InvalidCount {
        value: String,
        row: String,
        col: String,
    },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Duplicate label '{0}'")]
    DuplicateLabel(String),

    #[error("No metadata attached to the matrix; required by {0}")]
    MissingMetadata(String),

    #[error("Missing column '{0}' in metadata")]
    MissingColumn(String),

    #[error("Matrix holds relative abundances; {0} requires whole-number counts")]
    AlreadyNormalized(String),

    #[error("Sample size {requested} exceeds the {available} observations available")]
    SampleTooLarge { requested: u64, available: u64 },

    #[error("Index {index} out of bounds for {len} samples")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Cannot assign variant '{variant}' to a rank: {reason}")]
    RankAssignment { variant: String, reason: String },

    #[error("Zero total: {0}")]
    ZeroTotal(String),

    #[error("Category '{label}' has a zero column marginal")]
    EmptyColumn { label: String },

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, SurveyError>;
