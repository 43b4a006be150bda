//! Chart error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Chart not found: {path}")]
    ChartNotFound { path: String },

    #[error("Invalid chart: {message}")]
    InvalidChart { message: String },

    #[error("Failed to parse Chart.yaml: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Invalid .helmignore pattern '{pattern}': {message}")]
    InvalidIgnorePattern { pattern: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing required field: {field}")]
    MissingField { field: String },
}

impl From<walkdir::Error> for ChartError {
    fn from(e: walkdir::Error) -> Self {
        ChartError::Io(e.into())
    }
}

pub type Result<T> = std::result::Result<T, ChartError>;
