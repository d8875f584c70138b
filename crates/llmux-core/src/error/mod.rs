//! Error types for llmux
//!
//! Every failure a call can surface is a variant of [`LlmuxError`]. Errors are
//! returned to the immediate caller unchanged; the core never retries.

mod constructors;
mod conversions;
mod sanitize;
mod types;

pub use sanitize::sanitize_error_body;
pub use types::{LlmuxError, LlmuxResult};
