//! Anthropic messages adapter

use super::context::ProviderContext;
use super::credentials::{resolve_api_key, resolve_endpoint};
use super::http::{merge_extra, read_json, send_checked, text_at};
use super::media::load_image;
use super::{Provider, ProviderRequest, ProviderResponse, collect_system_text};
use crate::content::{ContentPart, ImageSource};
use crate::error::LlmuxResult;
use crate::message::{Message, Role};
use crate::pricing::normalize_usage;
use crate::streaming::{AnthropicFrames, FrameStream, decode_stream};
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::instrument;

/// Anthropic messages API adapter
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    ctx: ProviderContext,
}

impl AnthropicProvider {
    pub const NAME: &'static str = "anthropic";
    pub const API_KEY_ENV: &'static str = "ANTHROPIC_API_KEY";
    pub const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com/v1";
    pub const API_VERSION: &'static str = "2023-06-01";
    /// `max_tokens` is mandatory for this API
    pub const DEFAULT_MAX_TOKENS: u32 = 4096;

    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    async fn convert_message(&self, message: &Message) -> LlmuxResult<Value> {
        let role = message.role.as_str();
        if let [ContentPart::Text { value }] = message.parts.as_slice() {
            return Ok(json!({"role": role, "content": value}));
        }

        let mut blocks = Vec::with_capacity(message.parts.len());
        for part in &message.parts {
            match part {
                ContentPart::Text { value } => blocks.push(json!({"type": "text", "text": value})),
                ContentPart::Image(image) => {
                    let source = match &image.source {
                        ImageSource::Url(url) => json!({"type": "url", "url": url}),
                        _ => {
                            let inline = load_image(&self.ctx, image, Self::NAME).await?;
                            json!({
                                "type": "base64",
                                "media_type": inline.mime,
                                "data": inline.base64(),
                            })
                        }
                    };
                    blocks.push(json!({"type": "image", "source": source}));
                }
            }
        }
        Ok(json!({"role": role, "content": blocks}))
    }

    pub(crate) async fn build_payload(
        &self,
        request: &ProviderRequest<'_>,
        stream: bool,
    ) -> LlmuxResult<Value> {
        let mut messages = Vec::with_capacity(request.messages.len());
        for message in request.messages.iter().filter(|m| m.role != Role::System) {
            messages.push(self.convert_message(message).await?);
        }

        let options = &request.options.generation;
        let mut body = json!({
            "model": request.model,
            "messages": messages,
            "max_tokens": options.max_tokens.unwrap_or(Self::DEFAULT_MAX_TOKENS),
        });

        if let Some(system) = collect_system_text(request) {
            body["system"] = json!(system);
        }
        // The API rejects temperature and top_p together; temperature wins
        if let Some(temperature) = options.temperature {
            body["temperature"] = json!(temperature);
        } else if let Some(top_p) = options.top_p {
            body["top_p"] = json!(top_p);
        }
        if let Some(top_k) = options.top_k {
            body["top_k"] = json!(top_k);
        }
        if let Some(stop) = &options.stop {
            body["stop_sequences"] = json!(stop);
        }
        if stream {
            body["stream"] = json!(true);
        }

        merge_extra(&mut body, &options.extra);
        Ok(body)
    }

    async fn send(&self, request: &ProviderRequest<'_>, stream: bool) -> LlmuxResult<reqwest::Response> {
        let endpoint = resolve_endpoint(request.options, Self::DEFAULT_BASE_URL);
        let api_key = resolve_api_key(
            &self.ctx,
            Self::NAME,
            Self::API_KEY_ENV,
            request.options,
            &endpoint,
        )?;
        let body = self.build_payload(request, stream).await?;
        let url = endpoint.url("messages");
        tracing::debug!(url = %url, stream, "sending Anthropic request");

        let mut http_request = self
            .ctx
            .http
            .post(&url)
            .header("anthropic-version", Self::API_VERSION)
            .json(&body);
        if let Some(api_key) = api_key {
            http_request = http_request.header("x-api-key", api_key);
        }
        send_checked(http_request, Self::NAME).await
    }

    /// Text of a messages response
    ///
    /// Text blocks of `content` are concatenated. Gateways that translate the
    /// reply into the chat-completions shape are read from
    /// `choices[0].message.content` instead.
    fn extract_text(body: &Value) -> LlmuxResult<String> {
        if let Some(blocks) = body.get("content").and_then(Value::as_array) {
            return Ok(blocks
                .iter()
                .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect());
        }
        text_at(body, "/choices/0/message/content", Self::NAME)
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn api_key_env(&self) -> &str {
        Self::API_KEY_ENV
    }

    fn default_base_url(&self) -> &str {
        Self::DEFAULT_BASE_URL
    }

    #[instrument(skip(self, request), fields(model = request.model), level = "debug")]
    async fn complete(&self, request: ProviderRequest<'_>) -> LlmuxResult<ProviderResponse> {
        let response = self.send(&request, false).await?;
        let body = read_json(response, Self::NAME).await?;

        let text = Self::extract_text(&body)?;
        let usage = body
            .get("usage")
            .map(normalize_usage)
            .filter(|u| !u.is_empty());
        Ok(ProviderResponse { text, usage })
    }

    #[instrument(skip(self, request), fields(model = request.model), level = "debug")]
    async fn stream(&self, request: ProviderRequest<'_>) -> LlmuxResult<FrameStream> {
        let response = self.send(&request, true).await?;
        Ok(decode_stream(response.bytes_stream(), AnthropicFrames, Self::NAME))
    }
}
