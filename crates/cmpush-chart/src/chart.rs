//! Chart definition and loading

use flate2::read::GzDecoder;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tar::Archive;
use walkdir::WalkDir;

use crate::error::{ChartError, Result};
use crate::ignore::IgnoreRules;

/// Chart metadata file name
pub const CHART_FILE: &str = "Chart.yaml";

/// Contents of `Chart.yaml`
///
/// Only `name` and `version` are interpreted; every other key is carried
/// through untouched so a repackaged chart keeps its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartMetadata {
    /// Chart name (required)
    #[serde(default, deserialize_with = "scalar_string")]
    pub name: String,

    /// Chart version (required)
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: String,

    /// Remaining keys, in file order
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl ChartMetadata {
    pub fn from_yaml(content: &str) -> Result<Self> {
        let metadata: Self = serde_yaml::from_str(content)?;
        metadata.validate()?;
        Ok(metadata)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ChartError::MissingField {
                field: "name".to_string(),
            });
        }
        if self.version.trim().is_empty() {
            return Err(ChartError::MissingField {
                field: "version".to_string(),
            });
        }
        Ok(())
    }
}

/// Accept `version: 1.0` as well as `version: "1.0"`
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "expected a scalar, found {:?}",
            other
        ))),
    }
}

/// A file belonging to a chart, other than `Chart.yaml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartFile {
    /// Path relative to the chart root, `/`-separated
    pub path: String,
    pub data: Vec<u8>,
}

/// A chart loaded into memory from a directory or a packaged archive
#[derive(Debug, Clone)]
pub struct LoadedChart {
    pub metadata: ChartMetadata,
    pub files: Vec<ChartFile>,
    /// Where the chart was loaded from
    pub source: PathBuf,
}

impl LoadedChart {
    /// Load a chart from a directory or a `.tgz` archive
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.is_dir() {
            Self::load_dir(path)
        } else if path.is_file() {
            Self::load_archive(path)
        } else {
            Err(ChartError::ChartNotFound {
                path: path.display().to_string(),
            })
        }
    }

    /// Load a chart directory, honouring its `.helmignore`
    pub fn load_dir(root: &Path) -> Result<Self> {
        let chart_file = root.join(CHART_FILE);
        if !chart_file.is_file() {
            return Err(ChartError::InvalidChart {
                message: format!("{} not found in {}", CHART_FILE, root.display()),
            });
        }

        let metadata = ChartMetadata::from_yaml(&std::fs::read_to_string(&chart_file)?)?;
        let ignore = IgnoreRules::load(root)?;

        let walker = WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let rel = relative_path(root, entry.path());
                !ignore.is_ignored(&rel, entry.file_type().is_dir())
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = relative_path(root, entry.path());
            if rel == CHART_FILE {
                continue;
            }
            files.push(ChartFile {
                path: rel,
                data: std::fs::read(entry.path())?,
            });
        }

        tracing::debug!(
            chart = %metadata.name,
            files = files.len(),
            "loaded chart directory {}",
            root.display()
        );

        Ok(Self {
            metadata,
            files,
            source: root.to_path_buf(),
        })
    }

    /// Load a packaged chart (`<name>/Chart.yaml` and friends inside a tar.gz)
    pub fn load_archive(archive_path: &Path) -> Result<Self> {
        let file = File::open(archive_path)?;
        let mut archive = Archive::new(GzDecoder::new(file));

        let mut metadata = None;
        let mut files = Vec::new();

        for entry in archive.entries().map_err(|e| invalid_archive(archive_path, e))? {
            let mut entry = entry.map_err(|e| invalid_archive(archive_path, e))?;
            if !entry.header().entry_type().is_file() {
                continue;
            }

            // Drop the leading chart directory
            let path = entry.path()?.into_owned();
            let rel: Vec<String> = path
                .components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                    _ => None,
                })
                .skip(1)
                .collect();
            if rel.is_empty() {
                continue;
            }
            let rel = rel.join("/");

            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;

            if rel == CHART_FILE {
                let content = String::from_utf8(data).map_err(|_| ChartError::InvalidChart {
                    message: format!("{} is not valid UTF-8", CHART_FILE),
                })?;
                metadata = Some(ChartMetadata::from_yaml(&content)?);
            } else {
                files.push(ChartFile { path: rel, data });
            }
        }

        let metadata = metadata.ok_or_else(|| ChartError::InvalidChart {
            message: format!("{} not found in {}", CHART_FILE, archive_path.display()),
        })?;

        Ok(Self {
            metadata,
            files,
            source: archive_path.to_path_buf(),
        })
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn version(&self) -> &str {
        &self.metadata.version
    }

    /// Override the declared version before packaging
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.metadata.version = version.into();
    }

    /// Look up a file by its chart-relative path
    pub fn file(&self, path: &str) -> Option<&ChartFile> {
        self.files.iter().find(|f| f.path == path)
    }
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn invalid_archive(path: &Path, e: std::io::Error) -> ChartError {
    ChartError::InvalidChart {
        message: format!("{} is not a chart archive: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_chart(dir: &Path) {
        std::fs::write(
            dir.join("Chart.yaml"),
            "apiVersion: v2\nname: mychart\ndescription: A test chart\nversion: 0.1.0\nappVersion: \"1.16.0\"\n",
        )
        .unwrap();
        std::fs::write(dir.join("values.yaml"), "replicaCount: 1\n").unwrap();
        std::fs::create_dir_all(dir.join("templates")).unwrap();
        std::fs::write(
            dir.join("templates").join("deployment.yaml"),
            "apiVersion: apps/v1\nkind: Deployment\n",
        )
        .unwrap();
    }

    #[test]
    fn test_load_dir() {
        let temp = TempDir::new().unwrap();
        create_test_chart(temp.path());

        let chart = LoadedChart::load(temp.path()).unwrap();
        assert_eq!(chart.name(), "mychart");
        assert_eq!(chart.version(), "0.1.0");

        let paths: Vec<_> = chart.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["templates/deployment.yaml", "values.yaml"]);
    }

    #[test]
    fn test_load_missing_path() {
        let temp = TempDir::new().unwrap();
        let err = LoadedChart::load(temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, ChartError::ChartNotFound { .. }));
    }

    #[test]
    fn test_load_dir_without_chart_yaml() {
        let temp = TempDir::new().unwrap();
        let err = LoadedChart::load(temp.path()).unwrap_err();
        assert!(matches!(err, ChartError::InvalidChart { .. }));
    }

    #[test]
    fn test_load_dir_respects_helmignore() {
        let temp = TempDir::new().unwrap();
        create_test_chart(temp.path());
        std::fs::write(temp.path().join(".helmignore"), "*.bak\nci/\n").unwrap();
        std::fs::write(temp.path().join("values.yaml.bak"), "old").unwrap();
        std::fs::create_dir_all(temp.path().join("ci")).unwrap();
        std::fs::write(temp.path().join("ci").join("test-values.yaml"), "x: 1").unwrap();

        let chart = LoadedChart::load(temp.path()).unwrap();
        assert!(chart.file("values.yaml.bak").is_none());
        assert!(chart.file("ci/test-values.yaml").is_none());
        assert!(chart.file(".helmignore").is_some());
        assert!(chart.file("values.yaml").is_some());
    }

    #[test]
    fn test_missing_version() {
        let err = ChartMetadata::from_yaml("name: mychart\n").unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"Missing required field: version");
    }

    #[test]
    fn test_numeric_version() {
        let metadata = ChartMetadata::from_yaml("name: mychart\nversion: 1.0\n").unwrap();
        assert_eq!(metadata.version, "1.0");
    }

    #[test]
    fn test_set_version_keeps_other_keys() {
        let mut metadata =
            ChartMetadata::from_yaml("apiVersion: v2\nname: mychart\nversion: 0.1.0\nkeywords: [a, b]\n")
                .unwrap();
        metadata.version = "7c4d121".to_string();

        let yaml = metadata.to_yaml().unwrap();
        let reparsed = ChartMetadata::from_yaml(&yaml).unwrap();
        assert_eq!(reparsed.version, "7c4d121");
        assert_eq!(reparsed.extra.get("apiVersion").and_then(|v| v.as_str()), Some("v2"));
        assert!(reparsed.extra.contains_key("keywords"));
    }
}
