//! Log setup
//!
//! Logs go to stderr: stdout carries downloaded file contents.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// `--debug` forces the `debug` level; otherwise `RUST_LOG` applies, falling
/// back to `warn`.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .try_init();
}
