//! `cm://` file URLs handed to the plugin when Helm uses it as a downloader
//!
//! `cm://host/prefix/charts/foo-1.0.0.tgz` splits into the repository base
//! `https://host/prefix` and the file `charts/foo-1.0.0.tgz`; without a
//! `charts` segment only the last segment becomes the file.

use url::Url;

use crate::config::{CM_SCHEME, normalize_scheme};
use crate::error::{RepoError, Result};

/// A downloader URL split into repository endpoint and file path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUrl {
    /// Repository base with an `http`/`https` scheme
    pub base: Url,
    /// Path of the file relative to `base`
    pub file_path: String,
}

impl FileUrl {
    /// Split a `cm://` URL, rewriting its scheme per `use_http`
    pub fn parse(file_url: &str, use_http: bool) -> Result<Self> {
        let invalid = || RepoError::InvalidFileUrl {
            url: file_url.to_string(),
        };

        if !file_url.starts_with(CM_SCHEME) {
            return Err(invalid());
        }

        let mut url = Url::parse(&normalize_scheme(file_url, use_http)).map_err(|e| {
            RepoError::InvalidRepositoryUrl {
                url: file_url.to_string(),
                reason: e.to_string(),
            }
        })?;

        let parts: Vec<&str> = url.path().split('/').collect();
        let count = parts.len();
        if count <= 1 || parts[count - 1].is_empty() {
            return Err(invalid());
        }

        let mut file_path = parts[count - 1].to_string();
        let mut strip = 1;
        if parts[count - 2] == "charts" {
            strip += 1;
            file_path = format!("charts/{}", file_path);
        }

        let base_path = parts[..count - strip].join("/");
        url.set_path(&base_path);

        Ok(Self {
            base: url,
            file_path,
        })
    }
}
