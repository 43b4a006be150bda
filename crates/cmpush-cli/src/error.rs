//! CLI error types
//!
//! Every variant renders through miette and ends the process with status 1.

use cmpush_chart::ChartError;
use cmpush_repo::RepoError;
use miette::Diagnostic;
use thiserror::Error;

/// Usage line shown when the positional arguments have the wrong shape
pub const USAGE: &str =
    "This command needs 2 arguments: name of chart, name of chart repository (or repo URL)";

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Wrong number or shape of positional arguments
    #[error("{message}")]
    #[diagnostic(code(cmpush::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Chart could not be loaded or packaged
    #[error("{message}")]
    #[diagnostic(code(cmpush::cli::chart))]
    Chart {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Repository lookup, transport or server failure
    #[error("{message}")]
    #[diagnostic(code(cmpush::cli::repository))]
    Repository {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("IO error: {message}")]
    #[diagnostic(code(cmpush::cli::io))]
    Io { message: String },
}

impl CliError {
    pub fn usage() -> Self {
        Self::Usage {
            message: USAGE.to_string(),
            help: Some("helm cm-push <chart> <repository|url> [flags]".to_string()),
        }
    }
}

impl From<ChartError> for CliError {
    fn from(err: ChartError) -> Self {
        let help = match &err {
            ChartError::ChartNotFound { .. } | ChartError::InvalidChart { .. } => Some(
                "Pass a chart directory containing Chart.yaml or a packaged .tgz".to_string(),
            ),
            _ => None,
        };
        CliError::Chart {
            message: err.to_string(),
            help,
        }
    }
}

impl From<RepoError> for CliError {
    fn from(err: RepoError) -> Self {
        let help = match &err {
            RepoError::RepositoryNotFound { .. } => Some(
                "Add it with 'helm repo add' or pass the repository URL instead".to_string(),
            ),
            RepoError::Tls { .. } => Some(
                "Check --ca-file, --cert-file and --key-file (or HELM_REPO_CA_FILE, HELM_REPO_CERT_FILE, HELM_REPO_KEY_FILE)"
                    .to_string(),
            ),
            _ => None,
        };
        CliError::Repository {
            message: err.to_string(),
            help,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_message_unchanged() {
        let err: CliError = RepoError::Server {
            status: 400,
            message: "version already exists".to_string(),
        }
        .into();
        insta::assert_snapshot!(err.to_string(), @"400: version already exists");
    }

    #[test]
    fn test_repository_not_found_has_help() {
        let err: CliError = RepoError::RepositoryNotFound {
            name: "museum".to_string(),
        }
        .into();
        assert!(matches!(err, CliError::Repository { help: Some(_), .. }));
    }
}
