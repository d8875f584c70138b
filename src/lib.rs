//! llmux
//!
//! Facade over [`llmux_core`]; see that crate for the full API.

pub use llmux_core::*;
