//! OpenAI chat-completions adapter
//!
//! Also serves every backend that speaks the same protocol: DeepSeek,
//! Together.ai, xAI, Groq and arbitrary OpenAI-compatible endpoints.

use super::context::ProviderContext;
use super::credentials::{Endpoint, resolve_api_key, resolve_endpoint};
use super::http::{merge_extra, read_json, send_checked, text_at};
use super::media::load_image;
use super::{Provider, ProviderRequest, ProviderResponse};
use crate::content::{ContentPart, ImageSource};
use crate::error::LlmuxResult;
use crate::message::Message;
use crate::pricing::normalize_usage;
use crate::streaming::{FrameStream, OpenAiFrames, decode_stream};
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::instrument;

/// Chat-completions adapter
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    name: &'static str,
    api_key_env: &'static str,
    base_url: &'static str,
    /// Ask for a trailing usage chunk when streaming
    stream_usage: bool,
    ctx: ProviderContext,
}

impl OpenAiProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    /// An adapter for any chat-completions backend
    pub fn new(
        name: &'static str,
        api_key_env: &'static str,
        base_url: &'static str,
        ctx: ProviderContext,
    ) -> Self {
        Self {
            name,
            api_key_env,
            base_url,
            stream_usage: false,
            ctx,
        }
    }

    pub fn openai(ctx: ProviderContext) -> Self {
        Self::new("openai", "OPENAI_API_KEY", Self::DEFAULT_BASE_URL, ctx).with_stream_usage(true)
    }

    /// Target for caller-supplied endpoints; authenticates with
    /// `OPENAI_API_KEY` when it is set
    pub fn compatible(ctx: ProviderContext) -> Self {
        Self::new(
            "openai-compatible",
            "OPENAI_API_KEY",
            Self::DEFAULT_BASE_URL,
            ctx,
        )
    }

    pub fn deepseek(ctx: ProviderContext) -> Self {
        Self::new("deepseek", "DEEPSEEK_API_KEY", "https://api.deepseek.com/v1", ctx)
    }

    pub fn together(ctx: ProviderContext) -> Self {
        Self::new("together", "TOGETHER_API_KEY", "https://api.together.xyz/v1", ctx)
    }

    pub fn xai(ctx: ProviderContext) -> Self {
        Self::new("xai", "XAI_API_KEY", "https://api.x.ai/v1", ctx)
    }

    pub fn groq(ctx: ProviderContext) -> Self {
        Self::new("groq", "GROQ_API_KEY", "https://api.groq.com/openai/v1", ctx)
    }

    pub fn with_stream_usage(mut self, enabled: bool) -> Self {
        self.stream_usage = enabled;
        self
    }

    async fn convert_message(&self, message: &Message) -> LlmuxResult<Value> {
        let role = message.role.as_str();
        if let [ContentPart::Text { value }] = message.parts.as_slice() {
            return Ok(json!({"role": role, "content": value}));
        }

        let mut parts = Vec::with_capacity(message.parts.len());
        for part in &message.parts {
            match part {
                ContentPart::Text { value } => parts.push(json!({"type": "text", "text": value})),
                ContentPart::Image(image) => {
                    let url = match &image.source {
                        ImageSource::Url(url) => url.clone(),
                        _ => load_image(&self.ctx, image, self.name).await?.data_url(),
                    };
                    let mut image_url = json!({"url": url});
                    if let Some(detail) = &image.detail {
                        image_url["detail"] = json!(detail);
                    }
                    parts.push(json!({"type": "image_url", "image_url": image_url}));
                }
            }
        }
        Ok(json!({"role": role, "content": parts}))
    }

    pub(crate) async fn build_payload(
        &self,
        request: &ProviderRequest<'_>,
        stream: bool,
    ) -> LlmuxResult<Value> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = request.system_prompt {
            messages.push(json!({"role": "system", "content": system}));
        }
        for message in request.messages {
            messages.push(self.convert_message(message).await?);
        }

        let mut body = json!({
            "model": request.model,
            "messages": messages,
            "stream": stream,
        });

        let options = &request.options.generation;
        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(temperature) = options.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(top_p) = options.top_p {
            body["top_p"] = json!(top_p);
        }
        if let Some(stop) = &options.stop {
            body["stop"] = json!(stop);
        }
        if options.top_k.is_some() {
            tracing::debug!(provider = self.name, "top_k is not supported by chat completions, dropping it");
        }
        if stream && self.stream_usage {
            body["stream_options"] = json!({"include_usage": true});
        }

        merge_extra(&mut body, &options.extra);
        Ok(body)
    }

    async fn send(&self, request: &ProviderRequest<'_>, stream: bool) -> LlmuxResult<reqwest::Response> {
        let endpoint: Endpoint = resolve_endpoint(request.options, self.base_url);
        let api_key = resolve_api_key(
            &self.ctx,
            self.name,
            self.api_key_env,
            request.options,
            &endpoint,
        )?;
        let body = self.build_payload(request, stream).await?;
        let url = endpoint.url("chat/completions");
        tracing::debug!(provider = self.name, url = %url, stream, "sending chat completion request");

        let mut http_request = self.ctx.http.post(&url).json(&body);
        if let Some(api_key) = api_key {
            http_request = http_request.bearer_auth(api_key);
        }
        send_checked(http_request, self.name).await
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn api_key_env(&self) -> &str {
        self.api_key_env
    }

    fn default_base_url(&self) -> &str {
        self.base_url
    }

    #[instrument(skip(self, request), fields(provider = self.name, model = request.model), level = "debug")]
    async fn complete(&self, request: ProviderRequest<'_>) -> LlmuxResult<ProviderResponse> {
        let response = self.send(&request, false).await?;
        let body = read_json(response, self.name).await?;

        let text = text_at(&body, "/choices/0/message/content", self.name)?;
        let usage = body
            .get("usage")
            .map(normalize_usage)
            .filter(|u| !u.is_empty());
        Ok(ProviderResponse { text, usage })
    }

    #[instrument(skip(self, request), fields(provider = self.name, model = request.model), level = "debug")]
    async fn stream(&self, request: ProviderRequest<'_>) -> LlmuxResult<FrameStream> {
        let response = self.send(&request, true).await?;
        Ok(decode_stream(response.bytes_stream(), OpenAiFrames, self.name))
    }
}
