//! High-level client facade

use crate::config::ClientConfig;
use crate::content::Content;
use crate::error::LlmuxResult;
use crate::message::{ImageEntry, Message, MessageInput, NormalizeInput, normalize_messages};
use crate::options::{CallOptions, GenerationOptions};
use crate::provider::{Provider, ProviderContext, ProviderOutput, ProviderRequest};
use crate::registry::ProviderRegistry;
use crate::response::Response;
use crate::streaming::{ResponseStream, StreamItem};
use std::sync::Arc;
use tracing::instrument;

/// Everything needed for one generation call
///
/// # Examples
///
/// ```
/// use llmux_core::{ChatRequest, GenerationOptions};
///
/// let request = ChatRequest::prompt("Summarize this page")
///     .with_model("claude-sonnet-4")
///     .with_system("Answer in one sentence.")
///     .with_image("https://example.com/page.png")
///     .with_options(GenerationOptions::new().with_temperature(0.2));
/// assert_eq!(request.model(), Some("claude-sonnet-4"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    model: Option<String>,
    system: Option<String>,
    input: NormalizeInput,
    options: GenerationOptions,
    provider: Option<String>,
    base_url: Option<String>,
    api_key: Option<String>,
    stream: bool,
}

impl ChatRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// A request with a single plain-text prompt
    pub fn prompt(text: impl Into<String>) -> Self {
        Self::new().with_prompt(text)
    }

    /// A request carrying an explicit conversation
    pub fn messages<I, M>(messages: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<MessageInput>,
    {
        Self::new().with_messages(messages)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_prompt(mut self, text: impl Into<String>) -> Self {
        self.input.prompt_text = Some(text.into());
        self
    }

    /// Rich content for the single user turn, preferred over the prompt text
    pub fn with_content(mut self, content: impl Into<Content>) -> Self {
        self.input.content = Some(content.into());
        self
    }

    /// Replace the conversation; prompt, content and images are then ignored
    pub fn with_messages<I, M>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<MessageInput>,
    {
        self.input.messages = messages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_message(mut self, message: impl Into<MessageInput>) -> Self {
        self.input.messages.push(message.into());
        self
    }

    /// Attach an image to the single user turn
    pub fn with_image(mut self, image: impl Into<ImageEntry>) -> Self {
        self.input.images.push(image.into());
        self
    }

    pub fn with_images<I, E>(mut self, images: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<ImageEntry>,
    {
        self.input.images.extend(images.into_iter().map(Into::into));
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Bypass prefix resolution and use a registered provider by name
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Send to an OpenAI-compatible endpoint at this base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Only consulted by [`Llmux::call`]
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn system(&self) -> Option<&str> {
        self.system.as_deref()
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    pub fn is_stream(&self) -> bool {
        self.stream
    }

    fn call_options(&self) -> CallOptions {
        CallOptions {
            generation: self.options.clone(),
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

/// Result of [`Llmux::call`]
#[derive(Debug)]
pub enum CallOutput {
    Complete(Response),
    Stream(ResponseStream),
}

impl CallOutput {
    /// Wait for the full response, draining a stream if necessary
    pub async fn into_response(self) -> LlmuxResult<Response> {
        match self {
            Self::Complete(response) => Ok(response),
            Self::Stream(stream) => stream.finalize().await,
        }
    }
}

/// A request resolved against the registry and normalized
struct Prepared {
    model: String,
    messages: Vec<Message>,
    options: CallOptions,
    provider: Arc<dyn Provider>,
    prompt_chars: u64,
}

/// Unified client over every registered provider
///
/// Owns one HTTP connection pool and the provider registry; cheap to clone
/// and safe to share across tasks.
#[derive(Debug, Clone)]
pub struct Llmux {
    config: ClientConfig,
    registry: ProviderRegistry,
}

impl Llmux {
    /// Build a client with the built-in providers
    pub fn new(config: ClientConfig) -> LlmuxResult<Self> {
        let ctx = ProviderContext::new(&config)?;
        Self::with_context(config, ctx)
    }

    /// Configuration from `LLMUX_*` environment variables
    pub fn from_env() -> LlmuxResult<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// Build a client around an existing provider context
    pub fn with_context(config: ClientConfig, ctx: ProviderContext) -> LlmuxResult<Self> {
        config.validate()?;
        let registry = ProviderRegistry::with_defaults(&ctx, &config.default_provider)?;
        Ok(Self { config, registry })
    }

    /// Replace the registry, e.g. to add a custom adapter
    pub fn with_registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    fn prepare(&self, request: &ChatRequest) -> LlmuxResult<Prepared> {
        let model = request
            .model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.config.default_model.clone());
        let messages = normalize_messages(&request.input)?;
        let provider = self.registry.resolve(
            &model,
            request.provider.as_deref(),
            request.base_url.as_deref(),
        )?;

        let system_chars = request.system.as_deref().map_or(0, |s| s.chars().count());
        let prompt_chars = messages.iter().map(Message::text_chars).sum::<usize>() + system_chars;

        tracing::debug!(
            model = %model,
            provider = provider.name(),
            messages = messages.len(),
            "dispatching request"
        );

        Ok(Prepared {
            model,
            messages,
            options: request.call_options(),
            provider,
            prompt_chars: prompt_chars as u64,
        })
    }

    /// Send a request, streaming when [`ChatRequest::with_stream`] asked for it
    #[instrument(skip(self, request), fields(stream = request.stream), level = "debug")]
    pub async fn call(&self, request: ChatRequest) -> LlmuxResult<CallOutput> {
        let prepared = self.prepare(&request)?;
        let provider_request =
            ProviderRequest::new(&prepared.model, &prepared.messages, &prepared.options)
                .with_system_prompt(request.system.as_deref());

        let output = prepared.provider.call(provider_request, request.stream).await?;
        let provider_name = prepared.provider.name().to_string();
        Ok(match output {
            ProviderOutput::Complete(response) => CallOutput::Complete(Response {
                text: response.text,
                usage: response.usage,
                model: prepared.model,
                provider: provider_name,
                prompt_chars: prepared.prompt_chars,
            }),
            ProviderOutput::Stream(frames) => CallOutput::Stream(ResponseStream::new(
                frames,
                prepared.model,
                provider_name,
                prepared.prompt_chars,
            )),
        })
    }

    /// Send a request and wait for the full reply
    pub async fn chat(&self, request: ChatRequest) -> LlmuxResult<Response> {
        match self.call(request.with_stream(false)).await? {
            CallOutput::Complete(response) => Ok(response),
            CallOutput::Stream(stream) => stream.finalize().await,
        }
    }

    /// Send a request and return the reply as a stream of fragments
    pub async fn chat_stream(&self, request: ChatRequest) -> LlmuxResult<ResponseStream> {
        match self.call(request.with_stream(true)).await? {
            CallOutput::Stream(stream) => Ok(stream),
            CallOutput::Complete(response) => {
                // adapters always honor the stream flag; kept total for custom ones
                let items: Vec<LlmuxResult<StreamItem>> =
                    vec![Ok(StreamItem::Text(response.text.clone()))];
                let frames = futures::stream::iter(items);
                Ok(ResponseStream::new(
                    Box::pin(frames),
                    response.model,
                    response.provider,
                    response.prompt_chars,
                ))
            }
        }
    }

    /// One-shot prompt with the default model
    pub async fn prompt(&self, text: impl Into<String>) -> LlmuxResult<Response> {
        self.chat(ChatRequest::prompt(text)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapEnv;
    use crate::error::LlmuxError;
    use crate::pricing::{PricingSource, UsageInfo};
    use crate::provider::test_support::context;
    use futures::StreamExt;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(env: MapEnv) -> Llmux {
        Llmux::with_context(ClientConfig::default(), context(env)).unwrap()
    }

    #[test]
    fn test_request_builder() {
        let request = ChatRequest::prompt("hi")
            .with_model("gpt-5")
            .with_system("sys")
            .with_provider("openai")
            .with_stream(true);
        assert_eq!(request.model(), Some("gpt-5"));
        assert_eq!(request.system(), Some("sys"));
        assert!(request.is_stream());
    }

    #[tokio::test]
    async fn test_empty_request_fails_before_network() {
        let err = client(MapEnv::new()).chat(ChatRequest::new()).await.unwrap_err();
        assert_eq!(err, LlmuxError::NoContentProvided);
    }

    #[tokio::test]
    async fn test_chat_against_custom_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({
                "model": "llama3",
                "messages": [
                    {"role": "system", "content": "Be nice."},
                    {"role": "user", "content": "Hello"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "Hi!"}}]
            })))
            .mount(&server)
            .await;

        let request = ChatRequest::prompt("Hello")
            .with_model("llama3")
            .with_system("Be nice.")
            .with_base_url(format!("{}/v1", server.uri()));
        let response = client(MapEnv::new()).chat(request).await.unwrap();

        assert_eq!(response.text, "Hi!");
        assert_eq!(response.provider, "openai-compatible");
        assert_eq!(response.model, "llama3");
        assert_eq!(response.prompt_chars, 13);
        // unpriced model, no usage
        assert_eq!(response.cost_estimate().pricing_source, PricingSource::Unknown);
        assert_eq!(response.cost(), None);
    }

    #[tokio::test]
    async fn test_chat_stream_records_usage() {
        let server = MockServer::start().await;
        let sse = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Good \"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"day\"}}]}\n\n",
            "data: {\"choices\":[],\"usage\":{\"prompt_tokens\":1000000,\"completion_tokens\":1000000,\"total_tokens\":2000000}}\n\n",
            "data: [DONE]\n\n",
        );
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
            .mount(&server)
            .await;

        let request = ChatRequest::prompt("Greet me")
            .with_model("deepseek-chat")
            .with_base_url(server.uri());
        let mut stream = client(MapEnv::new())
            .chat_stream(request)
            .await
            .unwrap();

        let mut fragments = Vec::new();
        while let Some(event) = stream.next().await {
            fragments.push(event.unwrap().text);
        }
        assert_eq!(fragments, vec!["Good ", "day"]);

        let response = stream.finalize().await.unwrap();
        assert_eq!(response.text, "Good day");
        assert_eq!(
            response.usage,
            Some(UsageInfo::new(Some(1_000_000), Some(1_000_000), Some(2_000_000)))
        );
        // deepseek-chat: 0.56 in + 1.68 out per million
        assert_eq!(response.cost(), Some(2.24));
    }

    #[tokio::test]
    async fn test_call_honors_stream_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "done"}}]
            })))
            .mount(&server)
            .await;

        let request = ChatRequest::prompt("x").with_base_url(server.uri());
        let output = client(MapEnv::new()).call(request).await.unwrap();
        assert!(matches!(output, CallOutput::Complete(_)));
        assert_eq!(output.into_response().await.unwrap().text, "done");
    }

    #[tokio::test]
    async fn test_responses_stream_is_not_implemented() {
        let request = ChatRequest::prompt("x")
            .with_model("gpt-5")
            .with_provider("responses")
            .with_api_key("k");
        let err = client(MapEnv::new()).chat_stream(request).await.unwrap_err();
        assert!(matches!(err, LlmuxError::NotImplemented(_)));
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let request = ChatRequest::prompt("x").with_provider("acme");
        let err = client(MapEnv::new()).chat(request).await.unwrap_err();
        assert!(matches!(err, LlmuxError::UnknownProvider { .. }));
    }

    #[tokio::test]
    async fn test_missing_credential_names_variable() {
        let request = ChatRequest::prompt("x").with_model("claude-sonnet-4");
        let err = client(MapEnv::new()).chat(request).await.unwrap_err();
        assert_eq!(
            err,
            LlmuxError::missing_credential("anthropic", "ANTHROPIC_API_KEY")
        );
    }
}
