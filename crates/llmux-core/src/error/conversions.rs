//! From trait implementations for LlmuxError conversions

use super::types::LlmuxError;

impl From<std::io::Error> for LlmuxError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for LlmuxError {
    fn from(error: serde_json::Error) -> Self {
        Self::decode("json", error.to_string())
    }
}

impl From<reqwest::Error> for LlmuxError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            return Self::decode("http", error.to_string());
        }
        Self::transport(error.to_string())
    }
}

impl From<toml::de::Error> for LlmuxError {
    fn from(error: toml::de::Error) -> Self {
        Self::config(error.to_string())
    }
}
