//! Constructor and classifier methods for LlmuxError

use super::sanitize::sanitize_error_body;
use super::types::LlmuxError;

impl LlmuxError {
    /// Create a missing credential error
    pub fn missing_credential(provider: impl Into<String>, env_var: impl Into<String>) -> Self {
        Self::MissingCredential {
            provider: provider.into(),
            env_var: env_var.into(),
        }
    }

    /// Create an HTTP status error. The body is sanitized before it is stored.
    pub fn http(provider: impl Into<String>, status: u16, body: &str) -> Self {
        Self::Http {
            provider: provider.into(),
            status,
            body: sanitize_error_body(body),
        }
    }

    /// Create a transport error without provider attribution
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            provider: None,
        }
    }

    /// Create a transport error attributed to a provider
    pub fn transport_with_provider(message: impl Into<String>, provider: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            provider: Some(provider.into()),
        }
    }

    /// Create a decode error
    pub fn decode(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: None,
        }
    }

    /// Create an IO error for a specific path
    pub fn io_with_path(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a not-implemented error
    pub fn not_implemented(feature: impl Into<String>) -> Self {
        Self::NotImplemented(feature.into())
    }

    /// Create an unknown provider error listing the registered names
    pub fn unknown_provider<'a>(
        name: impl Into<String>,
        known: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self::UnknownProvider {
            name: name.into(),
            known: known.into_iter().collect::<Vec<_>>().join(", "),
        }
    }

    /// HTTP status code, if this error came from a non-2xx response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Provider the error is attributed to, if any
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::MissingCredential { provider, .. }
            | Self::Http { provider, .. }
            | Self::Decode { provider, .. } => Some(provider),
            Self::Transport { provider, .. } => provider.as_deref(),
            _ => None,
        }
    }

    /// Whether the failure happened below the protocol layer
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Whether the error was caused by caller input rather than the network
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedContentSource(_)
                | Self::UnsupportedContentItem(_)
                | Self::NoContentProvided
                | Self::UnknownProvider { .. }
        )
    }
}
