//! Request sending and response reading shared by the adapters

use crate::error::{LlmuxError, LlmuxResult};
use reqwest::{RequestBuilder, Response};
use serde_json::{Map, Value};

fn request_error(provider: &str, error: reqwest::Error) -> LlmuxError {
    if error.is_decode() {
        return LlmuxError::decode(provider, error.to_string());
    }
    LlmuxError::transport_with_provider(format!("{} request failed: {}", provider, error), provider)
}

/// Send a request, turning non-2xx statuses into [`LlmuxError::Http`]
pub(crate) async fn send_checked(request: RequestBuilder, provider: &str) -> LlmuxResult<Response> {
    let response = request
        .send()
        .await
        .map_err(|e| request_error(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(provider, status = status.as_u16(), "provider returned error status");
        return Err(LlmuxError::http(provider, status.as_u16(), &body));
    }
    Ok(response)
}

/// Read a response body as JSON
pub(crate) async fn read_json(response: Response, provider: &str) -> LlmuxResult<Value> {
    let body = response
        .text()
        .await
        .map_err(|e| request_error(provider, e))?;
    serde_json::from_str(&body)
        .map_err(|e| LlmuxError::decode(provider, format!("response is not valid JSON: {}", e)))
}

/// Merge passthrough options into the top level of a payload
pub(crate) fn merge_extra(payload: &mut Value, extra: &Map<String, Value>) {
    if let Some(object) = payload.as_object_mut() {
        for (key, value) in extra {
            object.insert(key.clone(), value.clone());
        }
    }
}

/// Extract a string at a JSON pointer
///
/// `null` is read as empty text, which is what providers send when a turn
/// produced no text.
pub(crate) fn text_at(body: &Value, pointer: &str, provider: &str) -> LlmuxResult<String> {
    match body.pointer(pointer) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Null) => Ok(String::new()),
        _ => Err(LlmuxError::decode(
            provider,
            format!("missing text at {}", pointer),
        )),
    }
}
