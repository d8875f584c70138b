//! Redaction of provider error bodies before they are stored in errors.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const MAX_ERROR_BODY_CHARS: usize = 2_048;
const REDACTED: &str = "[REDACTED]";

static BEARER_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bBearer\s+[A-Za-z0-9._\-+/=]{8,}").expect("valid bearer token regex")
});

static KEY_VALUE_SECRET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(api[_-]?key|key|access[_-]?token|token|secret|password|x-api-key)\b\s*[:=]\s*["']?[^"'&,\s}]+"#,
    )
    .expect("valid key/value secret regex")
});

/// Redact credentials from an error body and truncate oversized payloads.
///
/// JSON bodies keep their structure with sensitive fields replaced; anything
/// else is treated as plain text.
pub fn sanitize_error_body(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "<empty error response body>".to_string();
    }

    if let Ok(mut json) = serde_json::from_str::<Value>(trimmed) {
        if redact_json_value(&mut json) {
            let serialized = serde_json::to_string(&json)
                .unwrap_or_else(|_| "<unserializable error body>".to_string());
            return truncate(serialized);
        }
        return truncate(trimmed.to_string());
    }

    truncate(redact_inline(trimmed))
}

/// Returns true when anything was redacted.
fn redact_json_value(value: &mut Value) -> bool {
    match value {
        Value::Object(map) => {
            let mut changed = false;
            for (key, val) in map.iter_mut() {
                if is_sensitive_key(key) && !val.is_null() {
                    *val = Value::String(REDACTED.to_string());
                    changed = true;
                } else {
                    changed |= redact_json_value(val);
                }
            }
            changed
        }
        Value::Array(items) => items
            .iter_mut()
            .fold(false, |changed, item| redact_json_value(item) || changed),
        Value::String(s) => {
            let redacted = redact_inline(s);
            let changed = redacted != *s;
            *s = redacted;
            changed
        }
        _ => false,
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.to_ascii_lowercase().replace(['-', ' '], "_");
    normalized.contains("api_key")
        || normalized.contains("token")
        || normalized.contains("secret")
        || normalized.contains("password")
        || normalized.contains("authorization")
}

fn redact_inline(input: &str) -> String {
    let without_bearer = BEARER_TOKEN_RE.replace_all(input, "Bearer [REDACTED]");
    KEY_VALUE_SECRET_RE
        .replace_all(&without_bearer, "$1=[REDACTED]")
        .into_owned()
}

fn truncate(input: String) -> String {
    let char_count = input.chars().count();
    if char_count <= MAX_ERROR_BODY_CHARS {
        return input;
    }

    let truncated: String = input.chars().take(MAX_ERROR_BODY_CHARS).collect();
    format!(
        "{}... [truncated {} chars]",
        truncated,
        char_count - MAX_ERROR_BODY_CHARS
    )
}
