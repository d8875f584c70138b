//! Cost estimation from usage or character counts

use super::catalog::lookup_pricing;
use super::usage::UsageInfo;
use serde::{Deserialize, Serialize};

/// How trustworthy an estimate is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingSource {
    /// No catalog entry for the model
    Unknown,
    /// Priced, but at least one token count was derived from characters
    Approximate,
    /// Priced from exact token counts
    Known,
}

/// Input or output half of an estimate
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostComponent {
    pub tokens: Option<u64>,
    pub unit_price_per_million: Option<f64>,
    pub cost: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub currency: String,
    pub model_id: Option<String>,
    pub provider: Option<String>,
    pub pricing_source: PricingSource,
    pub input: CostComponent,
    pub output: CostComponent,
    pub total: Option<f64>,
}

/// Approximate token count, four characters per token rounded up
pub fn approx_tokens(chars: u64) -> u64 {
    chars.div_ceil(4)
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

fn component_cost(tokens: u64, price_per_million: f64) -> f64 {
    tokens as f64 / 1_000_000.0 * price_per_million
}

/// Estimate the USD cost of one request
///
/// Exact token counts from `usage` are preferred. A missing count is
/// approximated from the matching character count when one is given, which
/// marks the estimate [`PricingSource::Approximate`].
pub fn estimate_cost(
    model: Option<&str>,
    usage: Option<&UsageInfo>,
    prompt_chars: Option<u64>,
    completion_chars: Option<u64>,
    provider: Option<&str>,
) -> CostEstimate {
    let pricing = model.and_then(lookup_pricing);
    let usage = usage.copied().unwrap_or_default();

    let mut approximated = false;
    let prompt_tokens = usage.prompt_tokens.or_else(|| {
        prompt_chars.map(|chars| {
            approximated = true;
            approx_tokens(chars)
        })
    });
    let completion_tokens = usage.completion_tokens.or_else(|| {
        completion_chars.map(|chars| {
            approximated = true;
            approx_tokens(chars)
        })
    });

    let pricing_source = match pricing {
        None => PricingSource::Unknown,
        Some(_) if approximated => PricingSource::Approximate,
        Some(_) => PricingSource::Known,
    };

    let mut estimate = CostEstimate {
        currency: "USD".to_string(),
        model_id: model.map(str::to_string),
        provider: provider.map(str::to_string),
        pricing_source,
        input: CostComponent {
            tokens: prompt_tokens,
            unit_price_per_million: pricing.map(|p| p.input),
            cost: None,
        },
        output: CostComponent {
            tokens: completion_tokens,
            unit_price_per_million: pricing.map(|p| p.output),
            cost: None,
        },
        total: None,
    };

    let Some(price) = pricing else {
        return estimate;
    };

    let input_cost = prompt_tokens.map(|t| component_cost(t, price.input));
    let output_cost = completion_tokens.map(|t| component_cost(t, price.output));
    estimate.input.cost = input_cost.map(round6);
    estimate.output.cost = output_cost.map(round6);

    estimate.total = match (input_cost, output_cost, usage.total_tokens) {
        (Some(i), Some(o), _) => Some(round6(i + o)),
        (_, _, Some(total)) if price.is_flat() => Some(round6(component_cost(total, price.input))),
        _ => None,
    };

    estimate
}
