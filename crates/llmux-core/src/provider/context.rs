//! Shared resources handed to every adapter

use crate::config::{ClientConfig, EnvSource, ProcessEnv};
use crate::error::{LlmuxError, LlmuxResult};
use reqwest::Client;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// HTTP client, environment and limits shared by all adapters
///
/// Cloning is cheap; the HTTP connection pool is shared between clones.
#[derive(Clone)]
pub struct ProviderContext {
    pub(crate) http: Client,
    pub(crate) env: Arc<dyn EnvSource>,
    pub(crate) image_fetch_timeout: Duration,
}

impl ProviderContext {
    /// Build the HTTP client described by `config`
    pub fn new(config: &ClientConfig) -> LlmuxResult<Self> {
        config.validate()?;

        let mut builder = Client::builder()
            .connect_timeout(config.timeouts.connection_timeout())
            .user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeouts.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| LlmuxError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            env: Arc::new(ProcessEnv),
            image_fetch_timeout: config.image_fetch_timeout(),
        })
    }

    /// Replace the environment used for credential lookup
    pub fn with_env(mut self, env: Arc<dyn EnvSource>) -> Self {
        self.env = env;
        self
    }

    /// Replace the HTTP client
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_image_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.image_fetch_timeout = timeout;
        self
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn env(&self) -> &dyn EnvSource {
        self.env.as_ref()
    }
}

impl fmt::Debug for ProviderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderContext")
            .field("image_fetch_timeout", &self.image_fetch_timeout)
            .finish_non_exhaustive()
    }
}
