//! CLI commands
//!
//! The binary runs in one of two modes, chosen from the positional
//! arguments alone: a push (`<chart> <repository>`) or a Helm downloader
//! call (`<certFile> <keyFile> <caFile> <cm://url>`).

pub mod download;
pub mod push;

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use cmpush_repo::config::CM_SCHEME;
use cmpush_repo::{Environment, Settings};

use crate::error::{CliError, Result};

/// Flags shared by both modes
#[derive(Args, Debug, Default, Clone)]
pub struct PushFlags {
    /// Override chart version pre-push
    #[arg(short = 'v', long)]
    pub version: Option<String>,

    /// Override HTTP basic auth username [$HELM_REPO_USERNAME]
    #[arg(short = 'u', long)]
    pub username: Option<String>,

    /// Override HTTP basic auth password [$HELM_REPO_PASSWORD]
    #[arg(short = 'p', long)]
    pub password: Option<String>,

    /// Send token in Authorization header [$HELM_REPO_ACCESS_TOKEN]
    #[arg(long)]
    pub access_token: Option<String>,

    /// Alternative header to use for token auth [$HELM_REPO_AUTH_HEADER]
    #[arg(long)]
    pub auth_header: Option<String>,

    /// ChartMuseum context path [$HELM_REPO_CONTEXT_PATH]
    #[arg(long)]
    pub context_path: Option<String>,

    /// Verify certificates of HTTPS-enabled servers using this CA bundle [$HELM_REPO_CA_FILE]
    #[arg(long)]
    pub ca_file: Option<PathBuf>,

    /// Identify HTTPS client using this SSL certificate file [$HELM_REPO_CERT_FILE]
    #[arg(long)]
    pub cert_file: Option<PathBuf>,

    /// Identify HTTPS client using this SSL key file [$HELM_REPO_KEY_FILE]
    #[arg(long)]
    pub key_file: Option<PathBuf>,

    /// Connect to the server without verifying its certificate [$HELM_REPO_INSECURE]
    #[arg(long)]
    pub insecure: bool,

    /// Use HTTP instead of HTTPS for cm:// URLs [$HELM_REPO_USE_HTTP]
    #[arg(long)]
    pub use_http: bool,

    /// Force upload even if chart version exists
    #[arg(short = 'f', long)]
    pub force: bool,
}

impl PushFlags {
    /// Flag values, before the environment is consulted
    pub fn into_settings(self) -> Settings {
        Settings {
            chart_version: self.version,
            username: self.username,
            password: self.password,
            access_token: self.access_token,
            auth_header: self.auth_header,
            context_path: self.context_path,
            ca_file: self.ca_file,
            cert_file: self.cert_file,
            key_file: self.key_file,
            force: self.force,
            use_http: self.use_http,
            insecure_skip_verify: self.insecure,
        }
    }
}

/// What the positional arguments ask for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Push {
        chart: String,
        repository: String,
    },
    Download {
        cert_file: String,
        key_file: String,
        ca_file: String,
        url: String,
    },
}

impl Invocation {
    pub fn from_args(args: &[String]) -> Result<Self> {
        match args {
            [cert_file, key_file, ca_file, url] if url.starts_with(CM_SCHEME) => {
                Ok(Invocation::Download {
                    cert_file: cert_file.clone(),
                    key_file: key_file.clone(),
                    ca_file: ca_file.clone(),
                    url: url.clone(),
                })
            }
            [chart, repository] => Ok(Invocation::Push {
                chart: chart.clone(),
                repository: repository.clone(),
            }),
            _ => Err(CliError::usage()),
        }
    }
}

/// Dispatch on the positional arguments
pub async fn run(
    args: &[String],
    flags: PushFlags,
    env: &dyn Environment,
    out: &mut dyn Write,
) -> Result<()> {
    let settings = flags.into_settings();
    match Invocation::from_args(args)? {
        Invocation::Push { chart, repository } => {
            push::run(&chart, &repository, settings, env, out).await
        }
        Invocation::Download {
            cert_file,
            key_file,
            ca_file,
            url,
        } => {
            let tls = download::TlsArgs::new(&cert_file, &key_file, &ca_file);
            download::run(&url, tls, settings, env, out).await
        }
    }
}
