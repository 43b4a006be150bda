//! Chart repository HTTP client
//!
//! Uploads packaged charts to `<contextPath>/api/<repo path>/charts` and
//! fetches repository files. Responses are returned as-is; status handling
//! lives in [`crate::response`].

use reqwest::multipart::{Form, Part};
use reqwest::{Certificate, Identity, RequestBuilder};
use std::path::{Path, PathBuf};
use url::Url;

use crate::credentials::ResolvedCredentials;
use crate::error::{RepoError, Result};
use crate::settings::Settings;

/// Multipart form field carrying the chart archive
pub const CHART_FORM_FIELD: &str = "chart";

/// Everything needed to build a [`ChartRepositoryClient`]
#[derive(Clone, Default)]
pub struct ClientOptions {
    /// Repository base URL (`http` or `https`)
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub access_token: Option<String>,
    pub auth_header: Option<String>,
    pub context_path: Option<String>,
    pub ca_file: Option<PathBuf>,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub insecure_skip_verify: bool,
}

impl ClientOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Options for `url` taking credentials and TLS material from `settings`
    pub fn from_settings(url: impl Into<String>, settings: &Settings) -> Self {
        Self {
            url: url.into(),
            username: settings.username.clone(),
            password: settings.password.clone(),
            access_token: settings.access_token.clone(),
            auth_header: settings.auth_header.clone(),
            context_path: settings.context_path.clone(),
            ca_file: settings.ca_file.clone(),
            cert_file: settings.cert_file.clone(),
            key_file: settings.key_file.clone(),
            insecure_skip_verify: settings.insecure_skip_verify,
        }
    }

    pub fn with_basic_auth(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username;
        self.password = password;
        self
    }
}

/// Client for a single chart repository
pub struct ChartRepositoryClient {
    client: reqwest::Client,
    base: Url,
    context_path: String,
    credentials: ResolvedCredentials,
}

impl std::fmt::Debug for ChartRepositoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let auth = match &self.credentials {
            ResolvedCredentials::Header { name, .. } => name.as_str(),
            ResolvedCredentials::Bearer { .. } => "bearer",
            ResolvedCredentials::Basic { .. } => "basic",
            ResolvedCredentials::Anonymous => "anonymous",
        };
        f.debug_struct("ChartRepositoryClient")
            .field("base", &self.base.as_str())
            .field("context_path", &self.context_path)
            .field("auth", &auth)
            .finish_non_exhaustive()
    }
}

impl ChartRepositoryClient {
    /// Build a client; fails on an unusable URL or unreadable TLS material
    pub fn new(options: ClientOptions) -> Result<Self> {
        let base = Url::parse(&options.url).map_err(|e| RepoError::InvalidRepositoryUrl {
            url: options.url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(RepoError::InvalidRepositoryUrl {
                url: options.url.clone(),
                reason: format!("unsupported scheme '{}'", base.scheme()),
            });
        }

        let credentials = ResolvedCredentials::select(
            options.username.as_deref(),
            options.password.as_deref(),
            options.access_token.as_deref(),
            options.auth_header.as_deref(),
        );

        Ok(Self {
            client: build_http_client(&options)?,
            base,
            context_path: options.context_path.unwrap_or_default(),
            credentials,
        })
    }

    /// Endpoint that accepts chart uploads
    pub fn upload_url(&self, force: bool) -> Url {
        let base_path = self.base_path();
        let mut url = self.base.clone();
        url.set_path(&join_path(&[&self.context_path, "api", &base_path, "charts"]));
        url.set_query(force.then_some("force"));
        url.set_fragment(None);
        url
    }

    /// Endpoint serving `file_path`
    pub fn file_url(&self, file_path: &str) -> Url {
        let base_path = self.base_path();
        let mut url = self.base.clone();
        url.set_path(&join_path(&[&self.context_path, &base_path, file_path]));
        url.set_query(None);
        url.set_fragment(None);
        url
    }

    /// Upload a packaged chart, optionally overwriting an existing version
    pub async fn upload_chart_package(
        &self,
        chart_package: &Path,
        force: bool,
    ) -> Result<reqwest::Response> {
        let data = tokio::fs::read(chart_package).await?;
        let file_name = chart_package
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let part = Part::bytes(data)
            .file_name(file_name)
            .mime_str("application/octet-stream")?;
        let form = Form::new().part(CHART_FORM_FIELD, part);

        let url = self.upload_url(force);
        tracing::debug!(url = %url, "uploading {}", chart_package.display());

        let request = self.authorize(self.client.post(url)).multipart(form);
        Ok(request.send().await?)
    }

    /// Fetch a file relative to the repository base
    pub async fn download_file(&self, file_path: &str) -> Result<reqwest::Response> {
        let url = self.file_url(file_path);
        tracing::debug!(url = %url, "downloading");

        let request = self.authorize(self.client.get(url));
        Ok(request.send().await?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.auth_header() {
            Some((name, value)) => request.header(name, value),
            None => request,
        }
    }

    /// Repository path with a leading context path removed
    fn base_path(&self) -> String {
        let path = self.base.path();
        path.strip_prefix(self.context_path.as_str())
            .unwrap_or(path)
            .to_string()
    }
}

fn build_http_client(options: &ClientOptions) -> Result<reqwest::Client> {
    let mut builder =
        reqwest::Client::builder().user_agent(concat!("cmpush/", env!("CARGO_PKG_VERSION")));

    if let Some(ca_file) = &options.ca_file {
        let pem = read_tls_file(ca_file)?;
        let cert = Certificate::from_pem(&pem).map_err(|e| tls_error(ca_file, e))?;
        builder = builder.add_root_certificate(cert);
    }

    match (&options.cert_file, &options.key_file) {
        (Some(cert_file), Some(key_file)) => {
            let mut pem = read_tls_file(cert_file)?;
            pem.push(b'\n');
            pem.extend(read_tls_file(key_file)?);
            let identity = Identity::from_pem(&pem).map_err(|e| tls_error(cert_file, e))?;
            builder = builder.identity(identity);
        }
        (Some(path), None) | (None, Some(path)) => {
            tracing::warn!(
                "ignoring {}: client certificate and key must be given together",
                path.display()
            );
        }
        (None, None) => {}
    }

    if options.insecure_skip_verify {
        tracing::debug!("TLS certificate verification is disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder.build().map_err(|e| RepoError::NetworkError {
        message: e.to_string(),
    })
}

fn read_tls_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| tls_error(path, e))
}

fn tls_error(path: &Path, e: impl std::fmt::Display) -> RepoError {
    RepoError::Tls {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Join URL path pieces, dropping empty and `.` segments
fn join_path(parts: &[&str]) -> String {
    let segments: Vec<&str> = parts
        .iter()
        .flat_map(|part| part.split('/'))
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    format!("/{}", segments.join("/"))
}
