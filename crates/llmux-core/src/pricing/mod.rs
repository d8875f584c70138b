//! Pricing catalog and cost estimation
//!
//! # Example
//!
//! ```rust
//! use llmux_core::pricing::{UsageInfo, estimate_cost, lookup_pricing};
//!
//! assert!(lookup_pricing("openai/gpt-5").is_some());
//!
//! let usage = UsageInfo::new(Some(1_000_000), Some(1_000_000), None);
//! let estimate = estimate_cost(Some("gpt-5"), Some(&usage), None, None, Some("openai"));
//! assert_eq!(estimate.total, Some(11.25));
//! ```

pub mod catalog;
pub mod estimate;
pub mod usage;

pub use catalog::{ModelPricing, PricingCatalog, TokenPrice, lookup_pricing};
pub use estimate::{CostComponent, CostEstimate, PricingSource, approx_tokens, estimate_cost};
pub use usage::{UsageInfo, normalize_usage};
