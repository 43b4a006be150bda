//! Repository lookup
//!
//! Named repositories come from Helm's `repositories.yaml`; a bare
//! `http(s)://` URL becomes an unnamed repository without credentials.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::env::Environment;
use crate::error::{RepoError, Result};

/// Marker scheme for chart repositories registered through this plugin
pub const CM_SCHEME: &str = "cm://";

/// Overrides the location of `repositories.yaml`
pub const REPOSITORY_CONFIG_ENV: &str = "HELM_REPOSITORY_CONFIG";

/// Legacy Helm home directory
pub const HELM_HOME_ENV: &str = "HELM_HOME";

/// Helm's registry of locally added repositories
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryFile {
    #[serde(default)]
    pub api_version: Option<String>,

    #[serde(default)]
    pub repositories: Vec<Repository>,
}

impl RepositoryFile {
    /// Load from the default location; a missing file is an empty registry
    pub fn load(env: &dyn Environment) -> Result<Self> {
        let path = Self::default_path(env)?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            tracing::debug!("no repository file at {}", path.display());
            Ok(Self::default())
        }
    }

    /// Load from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: Self = serde_yaml::from_str(&content).map_err(|e| RepoError::InvalidConfig {
            message: format!("{}: {}", path.display(), e),
        })?;
        Ok(file)
    }

    /// `$HELM_REPOSITORY_CONFIG`, else `$HELM_HOME/repository/repositories.yaml`,
    /// else `<config dir>/helm/repositories.yaml`
    pub fn default_path(env: &dyn Environment) -> Result<PathBuf> {
        if let Some(path) = env.var(REPOSITORY_CONFIG_ENV).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        if let Some(home) = env.var(HELM_HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(home)
                .join("repository")
                .join("repositories.yaml"));
        }
        let config_dir = env.config_dir().ok_or_else(|| RepoError::InvalidConfig {
            message: "Could not determine config directory".to_string(),
        })?;
        Ok(config_dir.join("helm").join("repositories.yaml"))
    }

    /// Get a repository by name
    pub fn get(&self, name: &str) -> Option<&Repository> {
        self.repositories.iter().find(|r| r.name == name)
    }
}

/// Repository definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    /// Registered name, empty for a repository given as a URL
    #[serde(default)]
    pub name: String,

    /// Base URL, possibly using the `cm://` marker scheme
    pub url: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub ca_file: Option<PathBuf>,

    #[serde(default)]
    pub cert_file: Option<PathBuf>,

    #[serde(default)]
    pub key_file: Option<PathBuf>,

    #[serde(default, rename = "insecure_skip_tls_verify")]
    pub insecure_skip_tls_verify: bool,
}

impl Repository {
    /// Resolve a repository name or an `http(s)://` URL
    pub fn locate(name_or_url: &str, env: &dyn Environment) -> Result<Self> {
        if is_http_url(name_or_url) {
            return Self::from_url(name_or_url);
        }

        let file = RepositoryFile::load(env)?;
        file.get(name_or_url)
            .cloned()
            .ok_or_else(|| RepoError::RepositoryNotFound {
                name: name_or_url.to_string(),
            })
    }

    /// An unnamed repository with no stored credentials
    pub fn from_url(url: &str) -> Result<Self> {
        Url::parse(url).map_err(|e| RepoError::InvalidRepositoryUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            url: url.to_string(),
            ..Default::default()
        })
    }

    /// Whether this repository was synthesized from a URL
    pub fn is_ephemeral(&self) -> bool {
        self.name.is_empty()
    }

    /// Name for messages: the registered name, or the URL
    pub fn display_name(&self) -> &str {
        if self.is_ephemeral() {
            &self.url
        } else {
            &self.name
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref().filter(|s| !s.is_empty())
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|s| !s.is_empty())
    }

    /// Base URL with `cm://` rewritten for transport
    pub fn endpoint(&self, use_http: bool) -> String {
        normalize_scheme(&self.url, use_http)
    }
}

/// Whether the argument is an `http://` or `https://` URL
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Replace the first `cm://` with `http://` or `https://`
pub fn normalize_scheme(url: &str, use_http: bool) -> String {
    let scheme = if use_http { "http://" } else { "https://" };
    url.replacen(CM_SCHEME, scheme, 1)
}
