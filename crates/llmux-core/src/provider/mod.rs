//! Provider adapters
//!
//! Each adapter translates canonical [`Message`]s into one vendor's wire
//! format, sends the request and parses the result. Adapters hold no per-call
//! state and can be shared across concurrent calls.

mod anthropic;
mod context;
mod credentials;
mod google;
mod http;
mod media;
mod openai;
mod openai_responses;

#[cfg(test)]
mod openai_tests;

pub use anthropic::AnthropicProvider;
pub use context::ProviderContext;
pub use google::GoogleProvider;
pub use openai::OpenAiProvider;
pub use openai_responses::OpenAiResponsesProvider;

use crate::error::LlmuxResult;
use crate::message::Message;
use crate::options::CallOptions;
use crate::pricing::UsageInfo;
use crate::streaming::FrameStream;
use async_trait::async_trait;

/// One call as seen by an adapter
#[derive(Debug, Clone, Copy)]
pub struct ProviderRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub system_prompt: Option<&'a str>,
    pub options: &'a CallOptions,
}

impl<'a> ProviderRequest<'a> {
    pub fn new(model: &'a str, messages: &'a [Message], options: &'a CallOptions) -> Self {
        Self {
            model,
            messages,
            system_prompt: None,
            options,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: Option<&'a str>) -> Self {
        self.system_prompt = system_prompt.filter(|s| !s.is_empty());
        self
    }
}

/// Result of a non-streaming call
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub text: String,
    pub usage: Option<UsageInfo>,
}

/// Result of [`Provider::call`]
pub enum ProviderOutput {
    Complete(ProviderResponse),
    Stream(FrameStream),
}

impl std::fmt::Debug for ProviderOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete(response) => f.debug_tuple("Complete").field(response).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Contract implemented by every backend
#[async_trait]
pub trait Provider: Send + Sync {
    /// Registry name, also used to attribute errors
    fn name(&self) -> &str;

    /// Environment variable holding the API key
    fn api_key_env(&self) -> &str;

    /// Base URL used when the call does not override it
    fn default_base_url(&self) -> &str;

    /// Send a request and wait for the full reply
    async fn complete(&self, request: ProviderRequest<'_>) -> LlmuxResult<ProviderResponse>;

    /// Send a request and return the reply as a lazy stream
    async fn stream(&self, request: ProviderRequest<'_>) -> LlmuxResult<FrameStream>;

    async fn call(&self, request: ProviderRequest<'_>, stream: bool) -> LlmuxResult<ProviderOutput> {
        if stream {
            Ok(ProviderOutput::Stream(self.stream(request).await?))
        } else {
            Ok(ProviderOutput::Complete(self.complete(request).await?))
        }
    }
}

/// Join the text of all system turns, with the explicit system prompt first
pub(crate) fn collect_system_text(request: &ProviderRequest<'_>) -> Option<String> {
    let mut sections: Vec<String> = Vec::new();
    if let Some(system) = request.system_prompt {
        sections.push(system.to_string());
    }
    sections.extend(
        request
            .messages
            .iter()
            .filter(|m| m.role == crate::message::Role::System)
            .map(Message::text)
            .filter(|t| !t.is_empty()),
    );
    if sections.is_empty() {
        None
    } else {
        Some(sections.join("\n\n"))
    }
}
