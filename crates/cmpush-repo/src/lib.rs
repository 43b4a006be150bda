//! cmpush Repository Access
//!
//! This crate provides everything the push plugin does against a chart
//! repository:
//!
//! - **Settings**: flags layered over environment variables and `~/.cfconfig`
//! - **Repository lookup**: Helm's `repositories.yaml` or a bare URL
//! - **Client**: chart upload and file download over HTTP(S)
//! - **Responses**: status checks and the server's JSON error envelope
//!
//! ## Example
//!
//! ```rust,no_run
//! use cmpush_repo::{ChartRepositoryClient, ClientOptions, ProcessEnvironment, Repository, Settings};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = ProcessEnvironment;
//! let settings = Settings::default().resolve(&env);
//! let repo = Repository::locate("chartmuseum", &env)?;
//!
//! let client = ChartRepositoryClient::new(ClientOptions::from_settings(
//!     repo.endpoint(settings.use_http),
//!     &settings,
//! ))?;
//! let response = client
//!     .upload_chart_package(Path::new("mychart-0.1.0.tgz"), false)
//!     .await?;
//! cmpush_repo::handle_upload_response(response).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod credentials;
pub mod env;
pub mod error;
pub mod file_url;
pub mod response;
pub mod settings;

// Re-exports for convenience
pub use client::{ChartRepositoryClient, ClientOptions};
pub use config::{Repository, RepositoryFile, normalize_scheme};
pub use credentials::{CfConfig, ResolvedCredentials};
pub use env::{Environment, ProcessEnvironment, StaticEnvironment};
pub use error::{RepoError, Result};
pub use file_url::FileUrl;
pub use response::{handle_download_response, handle_upload_response};
pub use settings::Settings;
