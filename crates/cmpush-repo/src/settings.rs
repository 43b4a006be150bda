//! Effective settings: flags, then environment, then `~/.cfconfig`
//!
//! String settings only take an environment value when the flag left them
//! empty. Boolean settings are different: when their environment variable is
//! present it always replaces the flag value.

use std::path::PathBuf;

use crate::credentials::token_from_cfconfig;
use crate::env::Environment;

pub const USERNAME_ENV: &str = "HELM_REPO_USERNAME";
pub const PASSWORD_ENV: &str = "HELM_REPO_PASSWORD";
pub const ACCESS_TOKEN_ENV: &str = "HELM_REPO_ACCESS_TOKEN";
pub const AUTH_HEADER_ENV: &str = "HELM_REPO_AUTH_HEADER";
pub const CONTEXT_PATH_ENV: &str = "HELM_REPO_CONTEXT_PATH";
pub const USE_HTTP_ENV: &str = "HELM_REPO_USE_HTTP";
pub const CA_FILE_ENV: &str = "HELM_REPO_CA_FILE";
pub const CERT_FILE_ENV: &str = "HELM_REPO_CERT_FILE";
pub const KEY_FILE_ENV: &str = "HELM_REPO_KEY_FILE";
pub const INSECURE_ENV: &str = "HELM_REPO_INSECURE";

/// Settings shared by the push and download paths
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Version to stamp on the chart before packaging
    pub chart_version: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub access_token: Option<String>,
    /// Header carrying the access token instead of `Authorization: Bearer`
    pub auth_header: Option<String>,
    pub context_path: Option<String>,
    pub ca_file: Option<PathBuf>,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    /// Overwrite an existing chart version on the server
    pub force: bool,
    /// Rewrite `cm://` to `http://` instead of `https://`
    pub use_http: bool,
    pub insecure_skip_verify: bool,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Settings")
            .field("chart_version", &self.chart_version)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("access_token", &redact(&self.access_token))
            .field("auth_header", &self.auth_header)
            .field("context_path", &self.context_path)
            .field("ca_file", &self.ca_file)
            .field("cert_file", &self.cert_file)
            .field("key_file", &self.key_file)
            .field("force", &self.force)
            .field("use_http", &self.use_http)
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .finish()
    }
}

impl Settings {
    /// Fill in what the flags left unset from the environment and `~/.cfconfig`
    pub fn resolve(mut self, env: &dyn Environment) -> Self {
        fill_string(&mut self.username, env, USERNAME_ENV);
        fill_string(&mut self.password, env, PASSWORD_ENV);
        fill_string(&mut self.access_token, env, ACCESS_TOKEN_ENV);
        fill_string(&mut self.auth_header, env, AUTH_HEADER_ENV);
        fill_string(&mut self.context_path, env, CONTEXT_PATH_ENV);
        override_bool(&mut self.use_http, env, USE_HTTP_ENV);

        fill_path(&mut self.ca_file, env, CA_FILE_ENV);
        fill_path(&mut self.cert_file, env, CERT_FILE_ENV);
        fill_path(&mut self.key_file, env, KEY_FILE_ENV);
        override_bool(&mut self.insecure_skip_verify, env, INSECURE_ENV);

        if self.access_token.is_none() {
            self.access_token = token_from_cfconfig(env);
        }

        self
    }

    /// Use these TLS files only where nothing else provided one
    pub fn fill_tls_files(
        &mut self,
        ca_file: Option<PathBuf>,
        cert_file: Option<PathBuf>,
        key_file: Option<PathBuf>,
    ) {
        let non_empty = |p: Option<PathBuf>| p.filter(|p| !p.as_os_str().is_empty());
        if self.ca_file.is_none() {
            self.ca_file = non_empty(ca_file);
        }
        if self.cert_file.is_none() {
            self.cert_file = non_empty(cert_file);
        }
        if self.key_file.is_none() {
            self.key_file = non_empty(key_file);
        }
    }
}

fn fill_string(field: &mut Option<String>, env: &dyn Environment, key: &str) {
    if field.as_deref().is_some_and(|v| !v.is_empty()) {
        return;
    }
    *field = env.var(key).filter(|v| !v.is_empty());
    if field.is_some() {
        tracing::debug!("{} taken from environment", key);
    }
}

fn fill_path(field: &mut Option<PathBuf>, env: &dyn Environment, key: &str) {
    if field.as_ref().is_some_and(|p| !p.as_os_str().is_empty()) {
        return;
    }
    *field = env.var(key).filter(|v| !v.is_empty()).map(PathBuf::from);
    if field.is_some() {
        tracing::debug!("{} taken from environment", key);
    }
}

fn override_bool(field: &mut bool, env: &dyn Environment, key: &str) {
    let Some(value) = env.var(key) else {
        return;
    };
    *field = parse_bool(&value).unwrap_or_else(|| {
        tracing::warn!("{}={:?} is not a boolean, treating it as false", key, value);
        false
    });
}

/// Parse the textual booleans accepted in environment variables
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
