//! Error types for repository operations

use thiserror::Error;

/// Repository operation errors
#[derive(Debug, Error)]
pub enum RepoError {
    // ============ Configuration Errors ============
    #[error("no repo named \"{name}\" found")]
    RepositoryNotFound { name: String },

    #[error("Invalid repository URL: {url} - {reason}")]
    InvalidRepositoryUrl { url: String, reason: String },

    #[error("Invalid repository configuration: {message}")]
    InvalidConfig { message: String },

    #[error("invalid file url: {url}")]
    InvalidFileUrl { url: String },

    // ============ TLS Errors ============
    #[error("TLS configuration error for {path}: {message}")]
    Tls { path: String, message: String },

    // ============ Network Errors ============
    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Request timed out: {message}")]
    Timeout { message: String },

    // ============ Server Errors ============
    /// Non-success response, rendered as `<status>: <message>`
    #[error("{status}: {message}")]
    Server { status: u16, message: String },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, RepoError>;

impl From<reqwest::Error> for RepoError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RepoError::Timeout {
                message: e.to_string(),
            }
        } else if e.is_connect() {
            RepoError::NetworkError {
                message: format!("Connection failed: {}", e),
            }
        } else {
            RepoError::NetworkError {
                message: e.to_string(),
            }
        }
    }
}

impl From<serde_yaml::Error> for RepoError {
    fn from(e: serde_yaml::Error) -> Self {
        RepoError::Serialization(e.to_string())
    }
}
