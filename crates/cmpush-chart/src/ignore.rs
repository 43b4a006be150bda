//! `.helmignore` rules
//!
//! One glob per line. Blank lines and `#` comments are skipped, a leading `!`
//! re-includes paths excluded by earlier rules, a trailing `/` restricts the
//! rule to directories. Patterns without a `/` are matched against the base
//! name only; the rest are matched against the chart-relative path.

use glob::{MatchOptions, Pattern};
use std::path::Path;

use crate::error::{ChartError, Result};

// `*` and `?` never cross a `/`
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// File name looked up in the chart root
pub const HELMIGNORE: &str = ".helmignore";

#[derive(Debug, Clone)]
struct Rule {
    pattern: Pattern,
    negate: bool,
    dir_only: bool,
    base_name_only: bool,
}

/// Parsed ignore rules for a chart directory
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    rules: Vec<Rule>,
}

impl IgnoreRules {
    /// Load rules from `<root>/.helmignore`, empty if the file is absent
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(HELMIGNORE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Self::parse(&content)
    }

    /// Parse rules from `.helmignore` content
    pub fn parse(content: &str) -> Result<Self> {
        let mut rules = Vec::new();

        for line in content.lines() {
            let mut line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let negate = match line.strip_prefix('!') {
                Some(rest) => {
                    line = rest;
                    true
                }
                None => false,
            };

            let dir_only = line.len() > 1 && line.ends_with('/');
            let line = line.trim_end_matches('/').trim_start_matches("./");
            if line.is_empty() {
                continue;
            }

            let pattern = Pattern::new(line).map_err(|e| ChartError::InvalidIgnorePattern {
                pattern: line.to_string(),
                message: e.to_string(),
            })?;

            rules.push(Rule {
                pattern,
                negate,
                dir_only,
                base_name_only: !line.contains('/'),
            });
        }

        Ok(Self { rules })
    }

    /// Whether `rel_path` (chart-relative, `/`-separated) is ignored
    ///
    /// Later rules take precedence over earlier ones.
    pub fn is_ignored(&self, rel_path: &str, is_dir: bool) -> bool {
        let base_name = rel_path.rsplit('/').next().unwrap_or(rel_path);
        let mut ignored = false;

        for rule in &self.rules {
            if rule.dir_only && !is_dir {
                continue;
            }
            let candidate = if rule.base_name_only {
                base_name
            } else {
                rel_path
            };
            if rule.pattern.matches_with(candidate, MATCH_OPTIONS) {
                ignored = !rule.negate;
            }
        }

        ignored
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
