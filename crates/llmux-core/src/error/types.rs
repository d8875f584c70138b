//! Core error type for llmux

use thiserror::Error;

/// Result type alias for llmux operations
pub type LlmuxResult<T> = Result<T, LlmuxError>;

/// Main error type for llmux
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmuxError {
    /// The provider's API key was neither passed explicitly nor found in the environment
    #[error("{provider}: API key not found, set {env_var} or pass an explicit api key")]
    MissingCredential { provider: String, env_var: String },

    /// An image source whose shape cannot be classified
    #[error("Unsupported content source: {0}")]
    UnsupportedContentSource(String),

    /// A content item that is neither a string nor a tagged part
    #[error("Unsupported content item: {0}")]
    UnsupportedContentItem(String),

    /// Normalization produced a message with no parts
    #[error("No content provided: supply a prompt, content, or messages")]
    NoContentProvided,

    /// An explicit provider name that is not registered
    #[error("Unknown provider '{name}' (known providers: {known})")]
    UnknownProvider { name: String, known: String },

    /// The provider answered with a non-2xx status
    #[error("{provider} API error (status {status}): {body}")]
    Http {
        provider: String,
        status: u16,
        body: String,
    },

    /// A capability the adapter deliberately does not offer
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Connection, timeout or body-read failure
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        provider: Option<String>,
    },

    /// The response body did not have the expected shape
    #[error("Failed to decode {provider} response: {message}")]
    Decode { provider: String, message: String },

    /// Local file access failed (image paths, config files)
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
    },

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
