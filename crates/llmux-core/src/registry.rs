//! Model name to adapter resolution

use crate::error::{LlmuxError, LlmuxResult};
use crate::provider::{
    AnthropicProvider, GoogleProvider, OpenAiProvider, OpenAiResponsesProvider, Provider,
    ProviderContext,
};
use std::fmt;
use std::sync::Arc;

/// Adapters addressable by model prefix or provider name
///
/// Prefixes are matched in insertion order, so an earlier prefix wins when
/// several match.
#[derive(Clone)]
pub struct ProviderRegistry {
    prefixes: Vec<(String, Arc<dyn Provider>)>,
    names: Vec<(String, Arc<dyn Provider>)>,
    default: Arc<dyn Provider>,
    compatible: Arc<dyn Provider>,
}

impl ProviderRegistry {
    /// An empty registry
    ///
    /// `default` serves models no prefix matches; `compatible` serves calls
    /// that target a custom endpoint.
    pub fn new(default: Arc<dyn Provider>, compatible: Arc<dyn Provider>) -> Self {
        Self {
            prefixes: Vec::new(),
            names: Vec::new(),
            default,
            compatible,
        }
    }

    /// The built-in adapters, falling back to `default_provider` on a prefix miss
    pub fn with_defaults(ctx: &ProviderContext, default_provider: &str) -> LlmuxResult<Self> {
        let anthropic: Arc<dyn Provider> = Arc::new(AnthropicProvider::new(ctx.clone()));
        let google: Arc<dyn Provider> = Arc::new(GoogleProvider::new(ctx.clone()));
        let openai: Arc<dyn Provider> = Arc::new(OpenAiProvider::openai(ctx.clone()));
        let responses: Arc<dyn Provider> = Arc::new(OpenAiResponsesProvider::new(ctx.clone()));
        let deepseek: Arc<dyn Provider> = Arc::new(OpenAiProvider::deepseek(ctx.clone()));
        let together: Arc<dyn Provider> = Arc::new(OpenAiProvider::together(ctx.clone()));
        let xai: Arc<dyn Provider> = Arc::new(OpenAiProvider::xai(ctx.clone()));
        let groq: Arc<dyn Provider> = Arc::new(OpenAiProvider::groq(ctx.clone()));
        let compatible: Arc<dyn Provider> = Arc::new(OpenAiProvider::compatible(ctx.clone()));

        let mut registry = Self::new(openai.clone(), compatible.clone())
            .with_prefix("claude", anthropic.clone())
            .with_prefix("gemini", google.clone())
            .with_prefix("gpt", openai.clone())
            .with_prefix("deepseek", deepseek.clone())
            .with_prefix("together", together.clone())
            .with_prefix("grok", xai.clone())
            .with_name("anthropic", anthropic.clone())
            .with_name("claude", anthropic)
            .with_name("google", google.clone())
            .with_name("gemini", google)
            .with_name("openai", openai.clone())
            .with_name("gpt", openai)
            .with_name("openai-responses", responses.clone())
            .with_name("responses", responses)
            .with_name("deepseek", deepseek)
            .with_name("together", together)
            .with_name("xai", xai.clone())
            .with_name("grok", xai)
            .with_name("groq", groq)
            .with_name("openai-compatible", compatible.clone())
            .with_name("custom", compatible);

        registry.default = registry.by_name(default_provider)?;
        Ok(registry)
    }

    /// Register a model prefix, matched case-insensitively
    pub fn with_prefix(mut self, prefix: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        self.prefixes.push((prefix.into().to_lowercase(), provider));
        self
    }

    /// Register a provider name or alias, replacing any earlier entry
    pub fn with_name(mut self, name: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        let name = name.into().to_lowercase();
        self.names.retain(|(existing, _)| *existing != name);
        self.names.push((name, provider));
        self
    }

    pub fn with_default(mut self, provider: Arc<dyn Provider>) -> Self {
        self.default = provider;
        self
    }

    /// Registered provider names and aliases, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|(name, _)| name.as_str())
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(|(prefix, _)| prefix.as_str())
    }

    pub fn default_provider(&self) -> &Arc<dyn Provider> {
        &self.default
    }

    /// Look up an adapter by provider name or alias
    pub fn by_name(&self, name: &str) -> LlmuxResult<Arc<dyn Provider>> {
        let wanted = name.trim().to_lowercase();
        self.names
            .iter()
            .find(|(registered, _)| *registered == wanted)
            .map(|(_, provider)| provider.clone())
            .ok_or_else(|| LlmuxError::unknown_provider(name, self.names()))
    }

    /// First adapter whose prefix starts `model`
    pub fn by_prefix(&self, model: &str) -> Option<Arc<dyn Provider>> {
        let model = model.to_lowercase();
        self.prefixes
            .iter()
            .find(|(prefix, _)| model.starts_with(prefix.as_str()))
            .map(|(_, provider)| provider.clone())
    }

    /// Pick the adapter for a call
    ///
    /// A custom endpoint always goes to the OpenAI-compatible adapter. An
    /// explicit provider name must be registered. Otherwise the model prefix
    /// decides, and an unmatched model falls back to the default adapter with
    /// a warning.
    pub fn resolve(
        &self,
        model: &str,
        explicit_provider: Option<&str>,
        custom_endpoint: Option<&str>,
    ) -> LlmuxResult<Arc<dyn Provider>> {
        if custom_endpoint.is_some_and(|url| !url.trim().is_empty()) {
            if explicit_provider.is_some() {
                tracing::debug!(model, "custom endpoint given, ignoring explicit provider");
            }
            return Ok(self.compatible.clone());
        }

        if let Some(name) = explicit_provider.filter(|n| !n.trim().is_empty()) {
            return self.by_name(name);
        }

        if let Some(provider) = self.by_prefix(model) {
            return Ok(provider);
        }

        let known: Vec<&str> = self.prefixes().collect();
        tracing::warn!(
            model,
            fallback = self.default.name(),
            "No provider found for model, supported prefixes are {:?}",
            known
        );
        Ok(self.default.clone())
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("prefixes", &self.prefixes().collect::<Vec<_>>())
            .field("names", &self.names().collect::<Vec<_>>())
            .field("default", &self.default.name())
            .finish()
    }
}
