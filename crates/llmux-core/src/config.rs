//! Client configuration
//!
//! Configuration is read from a TOML file or from the environment. Environment
//! access goes through [`EnvSource`] so credential lookup can be exercised in
//! tests without touching the process environment.

use crate::error::{LlmuxError, LlmuxResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Model used when a request does not name one
pub const DEFAULT_MODEL: &str = "gpt-4.1";

/// Environment variable overriding [`DEFAULT_MODEL`]
pub const DEFAULT_MODEL_ENV: &str = "LLMUX_DEFAULT_MODEL";

/// Environment variable overriding the fallback provider
pub const DEFAULT_PROVIDER_ENV: &str = "LLMUX_DEFAULT_PROVIDER";

/// Read-only view of environment variables
pub trait EnvSource: Send + Sync {
    /// Look up a variable. Empty values are treated as absent.
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.trim().is_empty())
    }
}

/// A fixed set of variables, used for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvSource for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars
            .get(name)
            .filter(|v| !v.trim().is_empty())
            .cloned()
    }
}

/// Timeout configuration for provider requests
///
/// Only the connection phase is bounded by default. Generation requests can
/// legitimately run for minutes, so the overall request timeout is opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Connection timeout in seconds
    #[serde(default = "TimeoutConfig::default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// End-to-end request timeout in seconds (unbounded when absent)
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl TimeoutConfig {
    const fn default_connection_timeout() -> u64 {
        30
    }

    pub fn new() -> Self {
        Self::default()
    }

    /// Set connection timeout in seconds
    pub fn with_connection_timeout_secs(mut self, secs: u64) -> Self {
        self.connection_timeout_secs = secs;
        self
    }

    /// Set request timeout in seconds
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Validate timeout configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.connection_timeout_secs == 0 {
            return Err("Connection timeout must be greater than 0".to_string());
        }
        match self.request_timeout_secs {
            Some(0) => Err("Request timeout must be greater than 0".to_string()),
            Some(req) if req < self.connection_timeout_secs => Err(
                "Request timeout must be greater than or equal to connection timeout".to_string(),
            ),
            _ => Ok(()),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connection_timeout_secs: Self::default_connection_timeout(),
            request_timeout_secs: None,
        }
    }
}

/// Top-level configuration for [`crate::Llmux`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Model used when a request does not specify one
    pub default_model: String,
    /// Provider used when no registered prefix matches the model name
    pub default_provider: String,
    /// Timeouts for generation requests
    pub timeouts: TimeoutConfig,
    /// Timeout for fetching remote images that must be inlined
    pub image_fetch_timeout_secs: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL.to_string(),
            default_provider: "openai".to_string(),
            timeouts: TimeoutConfig::default(),
            image_fetch_timeout_secs: 30,
            user_agent: format!("llmux/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with `LLMUX_*` variables from the process environment
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(&ProcessEnv)
    }

    /// Apply `LLMUX_*` overrides from the given environment
    pub fn with_env_overrides(mut self, env: &dyn EnvSource) -> Self {
        if let Some(model) = env.var(DEFAULT_MODEL_ENV) {
            self.default_model = model;
        }
        if let Some(provider) = env.var(DEFAULT_PROVIDER_ENV) {
            self.default_provider = provider.to_lowercase();
        }
        self
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> LlmuxResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> LlmuxResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LlmuxError::io_with_path(
                format!("Failed to read config file: {}", e),
                path.display().to_string(),
            )
        })?;
        Self::from_toml_str(&content)
    }

    /// Set the default model
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Set the fallback provider
    pub fn with_default_provider(mut self, provider: impl Into<String>) -> Self {
        self.default_provider = provider.into();
        self
    }

    /// Set timeouts
    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn image_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.image_fetch_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> LlmuxResult<()> {
        if self.default_model.trim().is_empty() {
            return Err(LlmuxError::config("default_model must not be empty"));
        }
        if self.default_provider.trim().is_empty() {
            return Err(LlmuxError::config("default_provider must not be empty"));
        }
        if self.image_fetch_timeout_secs == 0 {
            return Err(LlmuxError::config(
                "image_fetch_timeout_secs must be greater than 0",
            ));
        }
        self.timeouts.validate().map_err(LlmuxError::config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.default_model, "gpt-4.1");
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.timeouts.connection_timeout(), Duration::from_secs(30));
        assert_eq!(config.timeouts.request_timeout(), None);
        assert_eq!(config.image_fetch_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env = MapEnv::new()
            .with(DEFAULT_MODEL_ENV, "claude-sonnet-4")
            .with(DEFAULT_PROVIDER_ENV, "Anthropic");
        let config = ClientConfig::default().with_env_overrides(&env);
        assert_eq!(config.default_model, "claude-sonnet-4");
        assert_eq!(config.default_provider, "anthropic");
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let env = MapEnv::new().with(DEFAULT_MODEL_ENV, "   ");
        let config = ClientConfig::default().with_env_overrides(&env);
        assert_eq!(config.default_model, DEFAULT_MODEL);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml_str(
            r#"
            default_model = "gemini-2.5-flash"

            [timeouts]
            request_timeout_secs = 600
            "#,
        )
        .unwrap();
        assert_eq!(config.default_model, "gemini-2.5-flash");
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.timeouts.connection_timeout_secs, 30);
        assert_eq!(
            config.timeouts.request_timeout(),
            Some(Duration::from_secs(600))
        );
    }

    #[test]
    fn test_invalid_timeouts_rejected() {
        let err = ClientConfig::from_toml_str(
            r#"
            [timeouts]
            connection_timeout_secs = 60
            request_timeout_secs = 10
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, LlmuxError::Config(_)));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = ClientConfig::from_toml_str("default_model = [").unwrap_err();
        assert!(matches!(err, LlmuxError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_provider = \"google\"").unwrap();
        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.default_provider, "google");
    }

    #[test]
    fn test_load_missing_file() {
        let err = ClientConfig::load("/nonexistent/llmux.toml").unwrap_err();
        assert!(matches!(err, LlmuxError::Io { path: Some(_), .. }));
    }
}
