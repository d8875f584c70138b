//! OpenAI responses adapter

use super::context::ProviderContext;
use super::credentials::{resolve_api_key, resolve_endpoint};
use super::http::{merge_extra, read_json, send_checked};
use super::media::load_image;
use super::openai::OpenAiProvider;
use super::{Provider, ProviderRequest, ProviderResponse};
use crate::content::{ContentPart, ImageSource};
use crate::error::{LlmuxError, LlmuxResult};
use crate::message::{Message, Role};
use crate::pricing::normalize_usage;
use crate::streaming::FrameStream;
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::instrument;

/// Adapter for the `/responses` endpoint
///
/// Only complete calls are supported. Streaming fails with
/// [`LlmuxError::NotImplemented`] before any request is sent.
#[derive(Debug, Clone)]
pub struct OpenAiResponsesProvider {
    ctx: ProviderContext,
}

impl OpenAiResponsesProvider {
    pub const NAME: &'static str = "openai-responses";
    pub const API_KEY_ENV: &'static str = "OPENAI_API_KEY";

    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    async fn convert_message(&self, message: &Message) -> LlmuxResult<Value> {
        // assistant turns are replayed as model output
        let text_type = match message.role {
            Role::Assistant => "output_text",
            _ => "input_text",
        };

        let mut content = Vec::with_capacity(message.parts.len());
        for part in &message.parts {
            match part {
                ContentPart::Text { value } => {
                    content.push(json!({"type": text_type, "text": value}))
                }
                ContentPart::Image(image) => {
                    let url = match &image.source {
                        ImageSource::Url(url) => url.clone(),
                        _ => load_image(&self.ctx, image, Self::NAME).await?.data_url(),
                    };
                    let mut item = json!({"type": "input_image", "image_url": url});
                    if let Some(detail) = &image.detail {
                        item["detail"] = json!(detail);
                    }
                    content.push(item);
                }
            }
        }
        Ok(json!({"role": message.role.as_str(), "content": content}))
    }

    pub(crate) async fn build_payload(&self, request: &ProviderRequest<'_>) -> LlmuxResult<Value> {
        let mut input = Vec::with_capacity(request.messages.len());
        for message in request.messages {
            input.push(self.convert_message(message).await?);
        }

        let mut body = json!({
            "model": request.model,
            "input": input,
        });
        if let Some(system) = request.system_prompt {
            body["instructions"] = json!(system);
        }

        let options = &request.options.generation;
        if let Some(max_tokens) = options.max_tokens {
            body["max_output_tokens"] = json!(max_tokens);
        }
        if let Some(temperature) = options.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(top_p) = options.top_p {
            body["top_p"] = json!(top_p);
        }
        if options.top_k.is_some() || options.stop.is_some() {
            tracing::debug!("top_k and stop are not supported by the responses endpoint, dropping them");
        }

        merge_extra(&mut body, &options.extra);
        Ok(body)
    }

    /// Text of a responses reply
    ///
    /// Reads `output[0].content[0].text`. Reasoning models put a `reasoning`
    /// item first, so the first `message` item's `output_text` is the fallback.
    fn extract_text(body: &Value) -> LlmuxResult<String> {
        if let Some(text) = body.pointer("/output/0/content/0/text").and_then(Value::as_str) {
            return Ok(text.to_string());
        }

        body.get("output")
            .and_then(Value::as_array)
            .and_then(|items| {
                items
                    .iter()
                    .find(|item| item.get("type").and_then(Value::as_str) == Some("message"))
            })
            .and_then(|message| message.get("content").and_then(Value::as_array))
            .and_then(|parts| {
                parts
                    .iter()
                    .find(|p| p.get("type").and_then(Value::as_str) == Some("output_text"))
            })
            .and_then(|part| part.get("text").and_then(Value::as_str))
            .map(str::to_string)
            .ok_or_else(|| {
                LlmuxError::decode(Self::NAME, "response has no output text at /output/0/content/0/text")
            })
    }
}

#[async_trait]
impl Provider for OpenAiResponsesProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn api_key_env(&self) -> &str {
        Self::API_KEY_ENV
    }

    fn default_base_url(&self) -> &str {
        OpenAiProvider::DEFAULT_BASE_URL
    }

    #[instrument(skip(self, request), fields(model = request.model), level = "debug")]
    async fn complete(&self, request: ProviderRequest<'_>) -> LlmuxResult<ProviderResponse> {
        let endpoint = resolve_endpoint(request.options, OpenAiProvider::DEFAULT_BASE_URL);
        let api_key = resolve_api_key(
            &self.ctx,
            Self::NAME,
            Self::API_KEY_ENV,
            request.options,
            &endpoint,
        )?;
        let body = self.build_payload(&request).await?;
        let url = endpoint.url("responses");
        tracing::debug!(url = %url, "sending responses request");

        let mut http_request = self.ctx.http.post(&url).json(&body);
        if let Some(api_key) = api_key {
            http_request = http_request.bearer_auth(api_key);
        }
        let response = send_checked(http_request, Self::NAME).await?;
        let body = read_json(response, Self::NAME).await?;

        let text = Self::extract_text(&body)?;
        let usage = body
            .get("usage")
            .map(normalize_usage)
            .filter(|u| !u.is_empty());
        Ok(ProviderResponse { text, usage })
    }

    async fn stream(&self, _request: ProviderRequest<'_>) -> LlmuxResult<FrameStream> {
        Err(LlmuxError::not_implemented(
            "streaming is not supported for the OpenAI responses endpoint",
        ))
    }
}
