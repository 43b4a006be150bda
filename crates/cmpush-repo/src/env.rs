//! Process environment access
//!
//! Settings resolution never touches `std::env` directly; it goes through an
//! [`Environment`] so tests can supply fixed values.

use std::collections::HashMap;
use std::path::PathBuf;

/// Source of environment variables and well-known directories
pub trait Environment {
    /// Value of an environment variable, `None` when unset
    fn var(&self, key: &str) -> Option<String>;

    /// The user's home directory
    fn home_dir(&self) -> Option<PathBuf>;

    /// The user's configuration directory (`~/.config` on Linux)
    fn config_dir(&self) -> Option<PathBuf>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn config_dir(&self) -> Option<PathBuf> {
        dirs::config_dir()
    }
}

/// A fixed environment
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    vars: HashMap<String, String>,
    home: Option<PathBuf>,
    config: Option<PathBuf>,
}

impl StaticEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config = Some(dir.into());
        self
    }
}

impl Environment for StaticEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.config.clone()
    }
}
