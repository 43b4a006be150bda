//! cmpush Chart - chart loading and packaging
//!
//! This crate provides the chart handling the push plugin needs:
//! - `LoadedChart`: a chart read from a directory or a packaged `.tgz`
//! - `ChartMetadata`: `Chart.yaml`, with a mutable version
//! - `package`: write a chart to `<name>-<version>.tgz`
//! - `IgnoreRules`: `.helmignore` handling

pub mod archive;
pub mod chart;
pub mod error;
pub mod ignore;

pub use archive::{archive_file_name, package};
pub use chart::{ChartFile, ChartMetadata, LoadedChart};
pub use error::{ChartError, Result};
pub use ignore::IgnoreRules;
