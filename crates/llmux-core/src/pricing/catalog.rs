//! Static per-model prices

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Price per 1M tokens
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenPrice {
    /// Price per 1M input tokens (USD)
    pub input: f64,
    /// Price per 1M output tokens (USD)
    pub output: f64,
}

impl TokenPrice {
    pub const fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }

    /// Whether input and output tokens cost the same
    pub fn is_flat(&self) -> bool {
        (self.input - self.output).abs() < 1e-12
    }
}

/// Catalog entry for one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub model_id: String,
    /// Vendor that publishes the price
    pub provider: String,
    pub price: TokenPrice,
}

impl ModelPricing {
    pub fn new(model_id: impl Into<String>, provider: impl Into<String>, price: TokenPrice) -> Self {
        Self {
            model_id: model_id.into(),
            provider: provider.into(),
            price,
        }
    }
}

/// Ordered table of model prices
#[derive(Debug, Clone, Default)]
pub struct PricingCatalog {
    models: Vec<ModelPricing>,
}

impl PricingCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog with the built-in prices
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        catalog.register_defaults();
        catalog
    }

    pub fn register(&mut self, pricing: ModelPricing) {
        self.models.push(pricing);
    }

    /// Find pricing for a model id
    ///
    /// Exact ids win. Otherwise the segment after the last `/` is tried, so
    /// vendor-qualified ids such as `openai/gpt-5` resolve to `gpt-5`.
    pub fn get(&self, model_id: &str) -> Option<&ModelPricing> {
        if model_id.is_empty() {
            return None;
        }
        if let Some(found) = self.find_exact(model_id) {
            return Some(found);
        }
        let simple = model_id.rsplit('/').next().unwrap_or(model_id);
        if simple == model_id {
            return None;
        }
        self.find_exact(simple)
    }

    fn find_exact(&self, model_id: &str) -> Option<&ModelPricing> {
        self.models.iter().find(|p| p.model_id == model_id)
    }

    pub fn list_models(&self) -> impl Iterator<Item = &ModelPricing> {
        self.models.iter()
    }

    pub fn list_by_provider<'a>(
        &'a self,
        provider: &'a str,
    ) -> impl Iterator<Item = &'a ModelPricing> {
        self.models
            .iter()
            .filter(move |p| p.provider.eq_ignore_ascii_case(provider))
    }

    fn register_defaults(&mut self) {
        const DEFAULTS: &[(&str, &str, f64, f64)] = &[
            // Google
            ("google", "gemini-2.5-pro", 1.25, 10.00),
            ("google", "gemini-2.5-flash", 0.30, 2.50),
            ("google", "gemini-2.5-flash-lite", 0.10, 0.40),
            // Anthropic
            ("anthropic", "claude-opus-4.1", 15.00, 75.00),
            ("anthropic", "claude-sonnet-4", 3.00, 15.00),
            ("anthropic", "claude-haiku-3.5", 0.80, 4.00),
            // Together.ai
            ("together", "llama-3.1-405b-instruct-turbo", 3.50, 3.50),
            ("together", "deepseek-r1", 3.00, 7.00),
            ("together", "qwen3-coder-480b-a35b-instruct", 2.00, 2.00),
            // Groq
            ("groq", "llama-4-maverick", 0.20, 0.60),
            ("groq", "moonshotai/kimi-k2-instruct-0905", 1.00, 3.00),
            ("groq", "llama-3-8b-8k", 0.05, 0.08),
            // OpenAI
            ("openai", "gpt-5", 1.25, 10.00),
            ("openai", "gpt-5-mini", 0.25, 2.00),
            ("openai", "gpt-5-nano", 0.05, 0.40),
            ("openai", "gpt-4.1", 2.00, 8.00),
            ("openai", "gpt-4o", 2.50, 10.00),
            ("openai", "gpt-4o-mini", 0.15, 0.60),
            // DeepSeek
            ("deepseek", "deepseek-chat", 0.56, 1.68),
            ("deepseek", "deepseek-reasoner", 3.00, 7.00),
        ];

        for &(provider, model_id, input, output) in DEFAULTS {
            self.register(ModelPricing::new(
                model_id,
                provider,
                TokenPrice::new(input, output),
            ));
        }
    }
}

static CATALOG: Lazy<PricingCatalog> = Lazy::new(PricingCatalog::with_defaults);

/// The process-wide built-in catalog
pub fn catalog() -> &'static PricingCatalog {
    &CATALOG
}

/// Look up built-in pricing for a model id
pub fn lookup_pricing(model_id: &str) -> Option<TokenPrice> {
    CATALOG.get(model_id).map(|p| p.price)
}
