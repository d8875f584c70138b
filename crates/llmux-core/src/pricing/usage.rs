//! Token usage normalization

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Token counts in a provider-neutral shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

impl UsageInfo {
    pub fn new(
        prompt_tokens: Option<u64>,
        completion_tokens: Option<u64>,
        total_tokens: Option<u64>,
    ) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prompt_tokens.is_none()
            && self.completion_tokens.is_none()
            && self.total_tokens.is_none()
    }

    /// Overlay the known counts of `newer` onto `self`
    ///
    /// Streaming providers report usage across several frames (Anthropic sends
    /// input tokens first and output tokens last), so counts are merged rather
    /// than replaced. The total is recomputed when both halves are known.
    pub fn merge(&mut self, newer: UsageInfo) {
        if newer.prompt_tokens.is_some() {
            self.prompt_tokens = newer.prompt_tokens;
        }
        if newer.completion_tokens.is_some() {
            self.completion_tokens = newer.completion_tokens;
        }
        if newer.total_tokens.is_some() {
            self.total_tokens = newer.total_tokens;
        }
        if let (Some(p), Some(c)) = (self.prompt_tokens, self.completion_tokens) {
            if newer.total_tokens.is_none() {
                self.total_tokens = Some(p + c);
            }
        }
    }
}

fn has_any(usage: &Value, keys: &[&str]) -> bool {
    keys.iter().any(|k| usage.get(k).is_some())
}

fn count(usage: &Value, key: &str) -> Option<u64> {
    usage.get(key).and_then(Value::as_u64)
}

/// Normalize a raw provider usage object
///
/// Recognized shapes, detected by key presence:
/// - OpenAI: `prompt_tokens`, `completion_tokens`, `total_tokens`
/// - Anthropic and OpenAI responses: `input_tokens`, `output_tokens`
/// - Google: `promptTokenCount`, `candidatesTokenCount`, `totalTokenCount`
///
/// Anything else yields all-unknown counts.
pub fn normalize_usage(raw: &Value) -> UsageInfo {
    if !raw.is_object() {
        return UsageInfo::default();
    }

    if has_any(raw, &["prompt_tokens", "completion_tokens"])
        || (raw.get("total_tokens").is_some() && !has_any(raw, &["input_tokens", "output_tokens"]))
    {
        return UsageInfo::new(
            count(raw, "prompt_tokens"),
            count(raw, "completion_tokens"),
            count(raw, "total_tokens"),
        );
    }

    if has_any(raw, &["input_tokens", "output_tokens"]) {
        let prompt = count(raw, "input_tokens");
        let completion = count(raw, "output_tokens");
        let total = match (prompt, completion) {
            (Some(p), Some(c)) => Some(p + c),
            _ => count(raw, "total_tokens"),
        };
        return UsageInfo::new(prompt, completion, total);
    }

    if has_any(raw, &["promptTokenCount", "candidatesTokenCount", "totalTokenCount"]) {
        return UsageInfo::new(
            count(raw, "promptTokenCount"),
            count(raw, "candidatesTokenCount"),
            count(raw, "totalTokenCount"),
        );
    }

    UsageInfo::default()
}
