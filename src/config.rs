//! Application configuration
//!
//! Read from an optional TOML file, then overridden by environment variables:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:3000"
//!
//! [auth]
//! user = "quizmaster"      # AUTH_USER
//! password = "..."         # AUTH_PASS
//!
//! [study]
//! api_key = "sk-..."       # OPENAI_API_KEY
//! api_base = "https://api.openai.com/v1"
//! model = "gpt-3.5-turbo"
//! max_tokens = 500
//! timeout_secs = 60
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not render config: {0}")]
    Render(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

const REDACTED: &str = "********";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub study: StudyConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Basic authentication secrets for the access gate
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("user", &self.user.as_ref().map(|_| REDACTED))
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .finish()
    }
}

/// Study material lookup settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// Bearer token for the chat completions API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible API, without `/chat/completions`
    pub api_base: String,
    pub model: String,
    pub max_tokens: u32,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 500,
            timeout_secs: 60,
        }
    }
}

impl fmt::Debug for StudyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudyConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// `<config_dir>/answer-tracker/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("answer-tracker").join("config.toml"))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load configuration for the process.
    ///
    /// An explicit path must exist. Without one the default path is used if
    /// present, otherwise built-in defaults. Environment variables win.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(default) => Self::from_file(&default)?,
                None => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a key lookup, usually the process environment
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(bind) = lookup("ANSWER_TRACKER_BIND") {
            self.server.bind = bind;
        }
        if let Some(user) = lookup("AUTH_USER") {
            self.auth.user = Some(user);
        }
        if let Some(password) = lookup("AUTH_PASS") {
            self.auth.password = Some(password);
        }
        if let Some(api_key) = lookup("OPENAI_API_KEY") {
            self.study.api_key = Some(api_key);
        }
        if let Some(api_base) = lookup("OPENAI_API_BASE") {
            self.study.api_base = api_base;
        }
    }

    /// TOML rendering with secrets masked
    pub fn to_redacted_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        let mask = |v: &mut Option<String>| {
            if v.is_some() {
                *v = Some(REDACTED.to_string());
            }
        };
        mask(&mut shown.auth.user);
        mask(&mut shown.auth.password);
        mask(&mut shown.study.api_key);
        Ok(toml::to_string_pretty(&shown)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert_eq!(config.study.model, "gpt-3.5-turbo");
        assert_eq!(config.study.max_tokens, 500);
        assert!(config.study.api_key.is_none());
        assert!(config.auth.user.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [study]
            model = "gpt-4o-mini"
            "#,
        )
        .unwrap();

        assert_eq!(config.study.model, "gpt-4o-mini");
        assert_eq!(config.study.max_tokens, 500);
        assert_eq!(config.server.bind, "127.0.0.1:3000");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nbind = \"0.0.0.0:8080\"\n[auth]\nuser = \"alex\"").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.auth.user.as_deref(), Some("alex"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            AppConfig::load(Some(&missing)),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        assert!(matches!(
            AppConfig::from_toml_str("[study]\nmax_tokens = \"lots\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_overrides_win_and_blank_values_are_ignored() {
        let mut config = AppConfig::from_toml_str("[study]\napi_key = \"from-file\"").unwrap();
        let env: HashMap<&str, &str> = [
            ("AUTH_USER", "user"),
            ("AUTH_PASS", "pass"),
            ("OPENAI_API_KEY", "   "),
            ("ANSWER_TRACKER_BIND", "127.0.0.1:9999"),
        ]
        .into_iter()
        .collect();

        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.auth.user.as_deref(), Some("user"));
        assert_eq!(config.auth.password.as_deref(), Some("pass"));
        assert_eq!(config.study.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.server.bind, "127.0.0.1:9999");
    }

    #[test]
    fn test_secrets_are_redacted() {
        let mut config = AppConfig::default();
        config.auth.password = Some("hunter2".to_string());
        config.study.api_key = Some("sk-secret".to_string());

        let rendered = config.to_redacted_toml().unwrap();
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains(REDACTED));

        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("sk-secret"));
    }
}
