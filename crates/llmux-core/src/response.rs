//! Completed responses

use crate::pricing::{CostEstimate, UsageInfo, estimate_cost};
use serde::{Deserialize, Serialize};

/// A completed generation with the metadata needed to price it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    pub usage: Option<UsageInfo>,
    /// Model id the request was sent with
    pub model: String,
    /// Registry name of the provider that served the request
    pub provider: String,
    /// Characters of prompt text sent, used when usage is missing
    pub prompt_chars: u64,
}

impl Response {
    /// Estimate the cost of this response
    ///
    /// Token counts from `usage` are used when present; missing counts are
    /// approximated from the prompt and reply lengths.
    pub fn cost_estimate(&self) -> CostEstimate {
        estimate_cost(
            Some(&self.model),
            self.usage.as_ref(),
            Some(self.prompt_chars),
            Some(self.text.chars().count() as u64),
            Some(&self.provider),
        )
    }

    /// Total estimated cost in USD, if the model is priced
    pub fn cost(&self) -> Option<f64> {
        self.cost_estimate().total
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::PricingSource;

    fn response(usage: Option<UsageInfo>) -> Response {
        Response {
            text: "x".repeat(40),
            usage,
            model: "gpt-5".to_string(),
            provider: "openai".to_string(),
            prompt_chars: 400,
        }
    }

    #[test]
    fn test_cost_from_usage() {
        let r = response(Some(UsageInfo::new(Some(1_000_000), Some(1_000_000), None)));
        assert_eq!(r.cost(), Some(11.25));
        assert_eq!(r.cost_estimate().pricing_source, PricingSource::Known);
    }

    #[test]
    fn test_cost_falls_back_to_characters() {
        let estimate = response(None).cost_estimate();
        assert_eq!(estimate.pricing_source, PricingSource::Approximate);
        assert_eq!(estimate.input.tokens, Some(100));
        assert_eq!(estimate.output.tokens, Some(10));
    }

    #[test]
    fn test_unpriced_model_has_no_cost() {
        let mut r = response(None);
        r.model = "local-llama".to_string();
        assert_eq!(r.cost(), None);
    }
}
