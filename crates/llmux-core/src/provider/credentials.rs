//! Endpoint and API key resolution

use super::context::ProviderContext;
use crate::error::{LlmuxError, LlmuxResult};
use crate::options::CallOptions;

/// Where a request goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Endpoint {
    /// Base URL without a trailing slash
    pub base_url: String,
    /// The caller overrode the adapter's default base URL
    pub custom: bool,
}

impl Endpoint {
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

pub(crate) fn resolve_endpoint(options: &CallOptions, default_base_url: &str) -> Endpoint {
    let default = default_base_url.trim_end_matches('/');
    match options.base_url.as_deref().map(|u| u.trim().trim_end_matches('/')) {
        Some(base) if !base.is_empty() => Endpoint {
            base_url: base.to_string(),
            custom: base != default,
        },
        _ => Endpoint {
            base_url: default.to_string(),
            custom: false,
        },
    }
}

/// Resolve the API key for a call
///
/// An explicit key wins over the environment. A missing key is an error
/// unless the call targets a custom endpoint, where local and self-hosted
/// servers commonly run without authentication.
pub(crate) fn resolve_api_key(
    ctx: &ProviderContext,
    provider: &str,
    env_var: &str,
    options: &CallOptions,
    endpoint: &Endpoint,
) -> LlmuxResult<Option<String>> {
    if let Some(key) = options.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        return Ok(Some(key.to_string()));
    }
    if let Some(key) = ctx.env.var(env_var) {
        return Ok(Some(key));
    }
    if endpoint.custom {
        tracing::debug!(provider, "no API key for custom endpoint, sending unauthenticated");
        return Ok(None);
    }
    Err(LlmuxError::missing_credential(provider, env_var))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientConfig, MapEnv};
    use std::sync::Arc;

    fn context(env: MapEnv) -> ProviderContext {
        ProviderContext::new(&ClientConfig::default())
            .unwrap()
            .with_env(Arc::new(env))
    }

    #[test]
    fn test_default_endpoint() {
        let endpoint = resolve_endpoint(&CallOptions::new(), "https://api.openai.com/v1/");
        assert_eq!(endpoint.base_url, "https://api.openai.com/v1");
        assert!(!endpoint.custom);
        assert_eq!(
            endpoint.url("/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_same_url_is_not_custom() {
        let options = CallOptions::new().with_base_url("https://api.openai.com/v1/");
        assert!(!resolve_endpoint(&options, "https://api.openai.com/v1").custom);
    }

    #[test]
    fn test_explicit_key_wins() {
        let ctx = context(MapEnv::new().with("OPENAI_API_KEY", "from-env"));
        let options = CallOptions::new().with_api_key("explicit");
        let endpoint = resolve_endpoint(&options, "https://api.openai.com/v1");
        let key = resolve_api_key(&ctx, "openai", "OPENAI_API_KEY", &options, &endpoint).unwrap();
        assert_eq!(key.as_deref(), Some("explicit"));
    }

    #[test]
    fn test_missing_key_names_variable() {
        let ctx = context(MapEnv::new());
        let options = CallOptions::new();
        let endpoint = resolve_endpoint(&options, "https://api.openai.com/v1");
        let err = resolve_api_key(&ctx, "openai", "OPENAI_API_KEY", &options, &endpoint)
            .unwrap_err();
        assert_eq!(err, LlmuxError::missing_credential("openai", "OPENAI_API_KEY"));
    }

    #[test]
    fn test_custom_endpoint_tolerates_missing_key() {
        let ctx = context(MapEnv::new());
        let options = CallOptions::new().with_base_url("http://localhost:11434/v1");
        let endpoint = resolve_endpoint(&options, "https://api.openai.com/v1");
        assert!(endpoint.custom);
        let key = resolve_api_key(&ctx, "openai-compatible", "OPENAI_API_KEY", &options, &endpoint)
            .unwrap();
        assert_eq!(key, None);
    }
}
