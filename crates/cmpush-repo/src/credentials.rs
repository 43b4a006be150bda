//! Credentials: the `~/.cfconfig` token store and request authentication
//!
//! Authentication precedence for every request:
//! custom token header > bearer token > basic auth > anonymous.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::env::Environment;
use crate::error::Result;

/// Credentials file name, relative to the home directory
pub const CF_CONFIG_FILE: &str = ".cfconfig";

/// `~/.cfconfig`: named contexts, one of which is current
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CfConfig {
    #[serde(rename = "current-context", default)]
    pub current_context: String,

    #[serde(default)]
    pub contexts: HashMap<String, CfContext>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CfContext {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub token: String,
}

impl CfConfig {
    /// Load from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Default location under the home directory
    pub fn default_path(env: &dyn Environment) -> Option<PathBuf> {
        env.home_dir().map(|home| home.join(CF_CONFIG_FILE))
    }

    /// Token of the context whose `name` equals `current-context`
    ///
    /// Contexts are unordered; if several share the current name, whichever
    /// is found first wins.
    pub fn current_token(&self) -> Option<&str> {
        self.contexts
            .values()
            .find(|ctx| ctx.name == self.current_context)
            .map(|ctx| ctx.token.as_str())
            .filter(|token| !token.is_empty())
    }
}

/// Look up the current context's token in `~/.cfconfig`
///
/// A missing, unreadable or malformed file means no token.
pub fn token_from_cfconfig(env: &dyn Environment) -> Option<String> {
    let path = CfConfig::default_path(env)?;
    if !path.exists() {
        return None;
    }

    match CfConfig::load_from(&path) {
        Ok(config) => {
            let token = config.current_token().map(String::from);
            if token.is_some() {
                tracing::debug!("using access token from {}", path.display());
            }
            token
        }
        Err(e) => {
            tracing::warn!("ignoring {}: {}", path.display(), e);
            None
        }
    }
}

/// Credentials ready to attach to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedCredentials {
    /// Token sent verbatim in a custom header
    Header { name: String, token: String },
    Bearer { token: String },
    Basic { username: String, password: String },
    Anonymous,
}

impl ResolvedCredentials {
    /// Pick the authentication scheme from whatever is configured
    ///
    /// A custom header name only applies when there is a token to send.
    /// Basic auth needs both a username and a password.
    pub fn select(
        username: Option<&str>,
        password: Option<&str>,
        access_token: Option<&str>,
        auth_header: Option<&str>,
    ) -> Self {
        let non_empty = |v: Option<&str>| v.filter(|s| !s.is_empty()).map(String::from);

        if let Some(token) = non_empty(access_token) {
            return match non_empty(auth_header) {
                Some(name) => ResolvedCredentials::Header { name, token },
                None => ResolvedCredentials::Bearer { token },
            };
        }

        match (non_empty(username), non_empty(password)) {
            (Some(username), Some(password)) => ResolvedCredentials::Basic { username, password },
            _ => ResolvedCredentials::Anonymous,
        }
    }

    /// Header name and value to send, if any
    pub fn auth_header(&self) -> Option<(String, String)> {
        match self {
            ResolvedCredentials::Header { name, token } => Some((name.clone(), token.clone())),
            ResolvedCredentials::Bearer { token } => Some((
                reqwest::header::AUTHORIZATION.as_str().to_string(),
                format!("Bearer {}", token),
            )),
            ResolvedCredentials::Basic { username, password } => {
                let encoded = base64::Engine::encode(
                    &base64::engine::general_purpose::STANDARD,
                    format!("{}:{}", username, password),
                );
                Some((
                    reqwest::header::AUTHORIZATION.as_str().to_string(),
                    format!("Basic {}", encoded),
                ))
            }
            ResolvedCredentials::Anonymous => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::StaticEnvironment;
    use tempfile::TempDir;

    const CFCONFIG: &str = r#"current-context: prod
contexts:
  a:
    name: staging
    token: staging-token
  b:
    name: prod
    token: prod-token
"#;

    #[test]
    fn test_current_token() {
        let config: CfConfig = serde_yaml::from_str(CFCONFIG).unwrap();
        assert_eq!(config.current_token(), Some("prod-token"));
    }

    #[test]
    fn test_no_matching_context() {
        let config: CfConfig =
            serde_yaml::from_str("current-context: dev\ncontexts:\n  a:\n    name: prod\n    token: t\n")
                .unwrap();
        assert_eq!(config.current_token(), None);
    }

    #[test]
    fn test_token_from_home() {
        let home = TempDir::new().unwrap();
        std::fs::write(home.path().join(CF_CONFIG_FILE), CFCONFIG).unwrap();

        let env = StaticEnvironment::new().with_home(home.path());
        assert_eq!(token_from_cfconfig(&env).as_deref(), Some("prod-token"));
    }

    #[test]
    fn test_missing_cfconfig_is_not_an_error() {
        let home = TempDir::new().unwrap();
        let env = StaticEnvironment::new().with_home(home.path());
        assert_eq!(token_from_cfconfig(&env), None);

        assert_eq!(token_from_cfconfig(&StaticEnvironment::new()), None);
    }

    #[test]
    fn test_malformed_cfconfig_is_not_an_error() {
        let home = TempDir::new().unwrap();
        std::fs::write(home.path().join(CF_CONFIG_FILE), "contexts: [not, a, map").unwrap();

        let env = StaticEnvironment::new().with_home(home.path());
        assert_eq!(token_from_cfconfig(&env), None);
    }

    #[test]
    fn test_select_precedence() {
        assert_eq!(
            ResolvedCredentials::select(Some("u"), Some("p"), Some("tok"), Some("X-Api-Key")),
            ResolvedCredentials::Header {
                name: "X-Api-Key".to_string(),
                token: "tok".to_string()
            }
        );
        assert_eq!(
            ResolvedCredentials::select(Some("u"), Some("p"), Some("tok"), None),
            ResolvedCredentials::Bearer {
                token: "tok".to_string()
            }
        );
        assert_eq!(
            ResolvedCredentials::select(Some("u"), Some("p"), None, Some("X-Api-Key")),
            ResolvedCredentials::Basic {
                username: "u".to_string(),
                password: "p".to_string()
            }
        );
        assert_eq!(
            ResolvedCredentials::select(Some("u"), None, Some(""), None),
            ResolvedCredentials::Anonymous
        );
    }

    #[test]
    fn test_basic_auth_header() {
        let creds = ResolvedCredentials::Basic {
            username: "user".to_string(),
            password: "pass".to_string(),
        };
        let (name, value) = creds.auth_header().unwrap();
        assert_eq!(name, "authorization");
        assert_eq!(value, "Basic dXNlcjpwYXNz");
    }
}
