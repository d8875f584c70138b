//! Google Gemini adapter

use super::context::ProviderContext;
use super::credentials::{resolve_api_key, resolve_endpoint};
use super::http::{merge_extra, read_json, send_checked, text_at};
use super::media::load_image;
use super::{Provider, ProviderRequest, ProviderResponse, collect_system_text};
use crate::content::ContentPart;
use crate::error::LlmuxResult;
use crate::message::{Message, Role};
use crate::pricing::normalize_usage;
use crate::streaming::{FrameStream, GoogleFrames, decode_stream};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::instrument;

/// Option keys that belong in `generationConfig` when passed as extras
const GENERATION_CONFIG_KEYS: [&str; 4] = ["temperature", "topP", "topK", "maxOutputTokens"];

/// Gemini `generateContent` adapter
#[derive(Debug, Clone)]
pub struct GoogleProvider {
    ctx: ProviderContext,
}

impl GoogleProvider {
    pub const NAME: &'static str = "google";
    pub const API_KEY_ENV: &'static str = "GEMINI_API_KEY";
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";

    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    async fn convert_parts(&self, message: &Message) -> LlmuxResult<Vec<Value>> {
        let mut parts = Vec::with_capacity(message.parts.len());
        for part in &message.parts {
            match part {
                ContentPart::Text { value } => parts.push(json!({"text": value})),
                ContentPart::Image(image) => {
                    // Gemini only accepts inline data here, so URLs are fetched
                    let inline = load_image(&self.ctx, image, Self::NAME).await?;
                    parts.push(json!({
                        "inline_data": {"mime_type": inline.mime, "data": inline.base64()}
                    }));
                }
            }
        }
        Ok(parts)
    }

    fn generation_config(request: &ProviderRequest<'_>, extra: &mut Map<String, Value>) -> Map<String, Value> {
        let options = &request.options.generation;
        let mut config = Map::new();

        for key in GENERATION_CONFIG_KEYS {
            if let Some(value) = extra.remove(key) {
                config.insert(key.to_string(), value);
            }
        }
        if let Some(temperature) = options.temperature {
            config.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(top_p) = options.top_p {
            config.insert("topP".to_string(), json!(top_p));
        }
        if let Some(top_k) = options.top_k {
            config.insert("topK".to_string(), json!(top_k));
        }
        if let Some(max_tokens) = options.max_tokens {
            config.insert("maxOutputTokens".to_string(), json!(max_tokens));
        }
        if let Some(stop) = &options.stop {
            config.insert("stopSequences".to_string(), json!(stop));
        }
        config
    }

    pub(crate) async fn build_payload(&self, request: &ProviderRequest<'_>) -> LlmuxResult<Value> {
        let mut contents = Vec::with_capacity(request.messages.len());
        for message in request.messages {
            let role = match message.role {
                Role::System => continue,
                Role::User => "user",
                Role::Assistant => "model",
            };
            contents.push(json!({"role": role, "parts": self.convert_parts(message).await?}));
        }

        let mut body = json!({"contents": contents});
        if let Some(system) = collect_system_text(request) {
            body["system_instruction"] = json!({"parts": [{"text": system}]});
        }

        let mut extra = request.options.generation.extra.clone();
        let config = Self::generation_config(request, &mut extra);
        if !config.is_empty() {
            body["generationConfig"] = Value::Object(config);
        }

        merge_extra(&mut body, &extra);
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
        let body = self.build_payload(request).await?;

        let method = if stream {
            "streamGenerateContent"
        } else {
            "generateContent"
        };
        let url = endpoint.url(&format!("models/{}:{}", request.model, method));
        // the key travels as a query parameter, so log the URL before it is added
        tracing::debug!(url = %url, stream, "sending Gemini request");

        let mut query: Vec<(&str, &str)> = Vec::new();
        if stream {
            query.push(("alt", "sse"));
        }
        if let Some(api_key) = api_key.as_deref() {
            query.push(("key", api_key));
        }

        let http_request = self.ctx.http.post(&url).query(&query).json(&body);
        send_checked(http_request, Self::NAME).await
    }
}

#[async_trait]
impl Provider for GoogleProvider {
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

        let text = text_at(&body, "/candidates/0/content/parts/0/text", Self::NAME)?;
        let usage = body
            .get("usageMetadata")
            .map(normalize_usage)
            .filter(|u| !u.is_empty());
        Ok(ProviderResponse { text, usage })
    }

    #[instrument(skip(self, request), fields(model = request.model), level = "debug")]
    async fn stream(&self, request: ProviderRequest<'_>) -> LlmuxResult<FrameStream> {
        let response = self.send(&request, true).await?;
        Ok(decode_stream(response.bytes_stream(), GoogleFrames, Self::NAME))
    }
}
