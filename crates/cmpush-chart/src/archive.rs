//! Chart packaging
//!
//! Produces the `<name>-<version>.tgz` layout chart repositories expect:
//! every entry lives under a `<name>/` directory, `Chart.yaml` first.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tar::{Builder, Header};

use crate::chart::{CHART_FILE, LoadedChart};
use crate::error::Result;

/// Package a loaded chart into `out_dir`
///
/// Returns the path of the created archive. The chart's current metadata is
/// written, so a preceding [`LoadedChart::set_version`] is reflected both in
/// the file name and in the packaged `Chart.yaml`.
pub fn package(chart: &LoadedChart, out_dir: &Path) -> Result<PathBuf> {
    let output = out_dir.join(archive_file_name(chart));
    let name = chart.name();

    let file = File::create(&output)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = Builder::new(encoder);

    let chart_yaml = chart.metadata.to_yaml()?;
    add_bytes_to_archive(
        &mut builder,
        &format!("{}/{}", name, CHART_FILE),
        chart_yaml.as_bytes(),
    )?;

    for file in &chart.files {
        add_bytes_to_archive(&mut builder, &format!("{}/{}", name, file.path), &file.data)?;
    }

    let encoder = builder.into_inner()?;
    encoder.finish()?;

    tracing::debug!(
        chart = %name,
        version = %chart.version(),
        "packaged chart to {}",
        output.display()
    );

    Ok(output)
}

/// Archive file name for a chart, e.g. `mychart-0.1.0.tgz`
#[must_use]
pub fn archive_file_name(chart: &LoadedChart) -> String {
    format!("{}-{}.tgz", chart.name(), chart.version())
}

/// Add bytes to a tar archive with a given path
fn add_bytes_to_archive<W: Write>(
    builder: &mut Builder<W>,
    archive_path: &str,
    content: &[u8],
) -> Result<()> {
    let mut header = Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0); // Reproducible builds: use epoch time
    header.set_cksum();

    builder.append_data(&mut header, archive_path, content)?;

    Ok(())
}
