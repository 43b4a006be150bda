//! Push command - package a chart and upload it to a chart repository

use std::io::Write;
use std::path::Path;

use cmpush_chart::LoadedChart;
use cmpush_repo::settings::INSECURE_ENV;
use cmpush_repo::{
    ChartRepositoryClient, ClientOptions, Environment, Repository, Settings,
    handle_upload_response,
};
use console::style;

use crate::error::Result;

const TEMP_DIR_PREFIX: &str = "helm-push-";

/// Push `chart` (a directory or packaged archive) to `repository`
pub async fn run(
    chart: &str,
    repository: &str,
    settings: Settings,
    env: &dyn Environment,
    out: &mut dyn Write,
) -> Result<()> {
    run_in(chart, repository, settings, env, &std::env::temp_dir(), out).await
}

/// Same as [`run`], packaging inside a scratch directory under `temp_root`
pub async fn run_in(
    chart: &str,
    repository: &str,
    settings: Settings,
    env: &dyn Environment,
    temp_root: &Path,
    out: &mut dyn Write,
) -> Result<()> {
    let mut settings = settings.resolve(env);
    let repo = Repository::locate(repository, env)?;

    // Registry TLS entries sit below flags and environment
    settings.fill_tls_files(
        repo.ca_file.clone(),
        repo.cert_file.clone(),
        repo.key_file.clone(),
    );
    if repo.insecure_skip_tls_verify
        && !settings.insecure_skip_verify
        && env.var(INSECURE_ENV).is_none()
    {
        settings.insecure_skip_verify = true;
    }

    let mut chart = LoadedChart::load(chart)?;
    if let Some(version) = settings.chart_version.as_deref().filter(|v| !v.is_empty()) {
        tracing::debug!("overriding chart version {} with {}", chart.version(), version);
        chart.set_version(version);
    }

    let username = settings
        .username
        .clone()
        .or_else(|| repo.username().map(String::from));
    let password = settings
        .password
        .clone()
        .or_else(|| repo.password().map(String::from));

    let endpoint = repo.endpoint(settings.use_http);
    tracing::debug!("repository endpoint: {}", endpoint);
    let client = ChartRepositoryClient::new(
        ClientOptions::from_settings(endpoint, &settings).with_basic_auth(username, password),
    )?;

    // Removed on drop, whichever way this function returns
    let scratch = tempfile::Builder::new()
        .prefix(TEMP_DIR_PREFIX)
        .tempdir_in(temp_root)?;

    let archive = cmpush_chart::package(&chart, scratch.path())?;
    let file_name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    writeln!(
        out,
        "{} {} to {}...",
        style("Pushing").bold(),
        file_name,
        repo.display_name()
    )?;

    let response = client.upload_chart_package(&archive, settings.force).await?;
    handle_upload_response(response).await?;

    writeln!(out, "Done.")?;
    Ok(())
}
