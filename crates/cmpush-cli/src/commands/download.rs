//! Downloader mode
//!
//! Helm calls registered downloaders as
//! `<cmd> <certFile> <keyFile> <caFile> <url>` and reads the file from stdout.

use std::io::Write;
use std::path::PathBuf;

use cmpush_repo::{
    ChartRepositoryClient, ClientOptions, Environment, FileUrl, Settings,
    handle_download_response,
};

use crate::error::Result;

/// TLS files passed by Helm; empty arguments mean "not given"
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TlsArgs {
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub ca_file: Option<PathBuf>,
}

impl TlsArgs {
    pub fn new(cert_file: &str, key_file: &str, ca_file: &str) -> Self {
        let path = |s: &str| (!s.is_empty()).then(|| PathBuf::from(s));
        Self {
            cert_file: path(cert_file),
            key_file: path(key_file),
            ca_file: path(ca_file),
        }
    }
}

/// Fetch the file behind a `cm://` URL and write it to `out` unchanged
pub async fn run(
    url: &str,
    tls: TlsArgs,
    settings: Settings,
    env: &dyn Environment,
    out: &mut dyn Write,
) -> Result<()> {
    let mut settings = settings.resolve(env);
    settings.fill_tls_files(tls.ca_file, tls.cert_file, tls.key_file);

    let target = FileUrl::parse(url, settings.use_http)?;
    tracing::debug!("downloading {} from {}", target.file_path, target.base);

    let client = ChartRepositoryClient::new(ClientOptions::from_settings(
        target.base.as_str(),
        &settings,
    ))?;
    let response = client.download_file(&target.file_path).await?;
    let body = handle_download_response(response).await?;

    out.write_all(&body)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmpush_repo::StaticEnvironment;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cm_url(server: &MockServer, suffix: &str) -> String {
        format!("{}{}", server.uri().replacen("http://", "cm://", 1), suffix)
    }

    fn isolated_env(home: &std::path::Path) -> StaticEnvironment {
        StaticEnvironment::new()
            .with_home(home)
            .with_var("HELM_REPO_USE_HTTP", "true")
    }

    #[test]
    fn test_empty_tls_args_are_unset() {
        assert_eq!(TlsArgs::new("", "", ""), TlsArgs::default());
        let tls = TlsArgs::new("cert.pem", "", "ca.pem");
        assert_eq!(tls.cert_file, Some(PathBuf::from("cert.pem")));
        assert_eq!(tls.key_file, None);
    }

    #[tokio::test]
    async fn test_download_chart_to_writer() {
        let server = MockServer::start().await;
        let payload = vec![0x1f, 0x8b, 0x08, 0x00, 0xff];
        Mock::given(method("GET"))
            .and(path("/museum/charts/foo-1.0.0.tgz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let home = TempDir::new().unwrap();
        let mut out = Vec::new();
        run(
            &cm_url(&server, "/museum/charts/foo-1.0.0.tgz"),
            TlsArgs::default(),
            Settings::default(),
            &isolated_env(home.path()),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(out, payload);
    }

    #[tokio::test]
    async fn test_download_sends_env_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/charts/foo-1.0.0.tgz"))
            .and(header("x-api-key", "t0k"))
            .respond_with(ResponseTemplate::new(200).set_body_string("abc"))
            .expect(1)
            .mount(&server)
            .await;

        let home = TempDir::new().unwrap();
        let env = isolated_env(home.path())
            .with_var("HELM_REPO_ACCESS_TOKEN", "t0k")
            .with_var("HELM_REPO_AUTH_HEADER", "X-Api-Key");

        let mut out = Vec::new();
        run(
            &cm_url(&server, "/charts/foo-1.0.0.tgz"),
            TlsArgs::default(),
            Settings::default(),
            &env,
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(out, b"abc");
    }

    #[tokio::test]
    async fn test_download_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"error":"not found"}"#))
            .mount(&server)
            .await;

        let home = TempDir::new().unwrap();
        let mut out = Vec::new();
        let err = run(
            &cm_url(&server, "/charts/missing-0.0.1.tgz"),
            TlsArgs::default(),
            Settings::default(),
            &isolated_env(home.path()),
            &mut out,
        )
        .await
        .unwrap_err();

        insta::assert_snapshot!(err.to_string(), @"404: not found");
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_download_rejects_url_without_file() {
        let home = TempDir::new().unwrap();
        let mut out = Vec::new();
        let err = run(
            "cm://charts.example.com",
            TlsArgs::default(),
            Settings::default(),
            &isolated_env(home.path()),
            &mut out,
        )
        .await
        .unwrap_err();

        insta::assert_snapshot!(err.to_string(), @"invalid file url: cm://charts.example.com");
    }

    #[tokio::test]
    async fn test_download_with_unreadable_ca_file() {
        let home = TempDir::new().unwrap();
        let mut out = Vec::new();
        let err = run(
            "cm://charts.example.com/charts/foo-1.0.0.tgz",
            TlsArgs::new("", "", home.path().join("missing-ca.pem").to_str().unwrap()),
            Settings::default(),
            &isolated_env(home.path()),
            &mut out,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, crate::error::CliError::Repository { help: Some(_), .. }));
    }
}
