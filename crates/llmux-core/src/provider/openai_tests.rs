//! OpenAI chat-completions adapter against a mock server

use super::test_support::context;
use super::{OpenAiProvider, Provider, ProviderRequest};
use crate::config::MapEnv;
use crate::content::{image, text};
use crate::error::LlmuxError;
use crate::message::{Message, Role};
use crate::options::{CallOptions, GenerationOptions};
use crate::pricing::UsageInfo;
use crate::streaming::StreamItem;
use futures::TryStreamExt;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(env: MapEnv) -> OpenAiProvider {
    OpenAiProvider::openai(context(env))
}

fn keyed() -> MapEnv {
    MapEnv::new().with("OPENAI_API_KEY", "test-api-key")
}

fn mock_response(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test123",
        "object": "chat.completion",
        "model": "gpt-4.1",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30}
    })
}

#[tokio::test]
async fn test_complete_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-api-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4.1",
            "stream": false,
            "messages": [
                {"role": "system", "content": "Be brief."},
                {"role": "user", "content": "Hello!"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(mock_response("Hi there.")))
        .mount(&server)
        .await;

    let messages = vec![Message::user("Hello!")];
    let options = CallOptions::new().with_base_url(server.uri());
    let request =
        ProviderRequest::new("gpt-4.1", &messages, &options).with_system_prompt(Some("Be brief."));

    let response = provider(keyed()).complete(request).await.unwrap();
    assert_eq!(response.text, "Hi there.");
    assert_eq!(response.usage, Some(UsageInfo::new(Some(10), Some(20), Some(30))));
}

#[tokio::test]
async fn test_known_options_and_passthrough() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "temperature": 0.5,
            "top_p": 0.9,
            "max_tokens": 64,
            "seed": 42,
            "response_format": {"type": "json_object"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(mock_response("{}")))
        .mount(&server)
        .await;

    let messages = vec![Message::user("json please")];
    let options = CallOptions::new().with_base_url(server.uri()).with_generation(
        GenerationOptions::new()
            .with_temperature(0.5)
            .with_top_p(0.9)
            .with_max_tokens(64)
            .with_extra("seed", 42)
            .with_extra("response_format", json!({"type": "json_object"})),
    );
    let response = provider(keyed())
        .complete(ProviderRequest::new("gpt-4.1", &messages, &options))
        .await
        .unwrap();
    assert_eq!(response.text, "{}");
}

#[tokio::test]
async fn test_multimodal_message_uses_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": "What is this?"},
                    {"type": "image_url", "image_url": {"url": "https://example.com/cat.png", "detail": "low"}},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,AQI="}}
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(mock_response("A cat.")))
        .mount(&server)
        .await;

    let messages = vec![Message::new(
        Role::User,
        vec![
            text("What is this?"),
            image("https://example.com/cat.png", None, Some("low")).unwrap(),
            image(vec![1u8, 2], Some("image/png"), None).unwrap(),
        ],
    )];
    let options = CallOptions::new().with_base_url(server.uri());
    let response = provider(keyed())
        .complete(ProviderRequest::new("gpt-4.1", &messages, &options))
        .await
        .unwrap();
    assert_eq!(response.text, "A cat.");
}

#[tokio::test]
async fn test_missing_credential_on_default_endpoint() {
    let messages = vec![Message::user("hi")];
    let options = CallOptions::new();
    let err = provider(MapEnv::new())
        .complete(ProviderRequest::new("gpt-4.1", &messages, &options))
        .await
        .unwrap_err();
    assert_eq!(err, LlmuxError::missing_credential("openai", "OPENAI_API_KEY"));
}

#[tokio::test]
async fn test_custom_endpoint_without_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(mock_response("local")))
        .mount(&server)
        .await;

    let messages = vec![Message::user("hi")];
    let options = CallOptions::new().with_base_url(format!("{}/v1/", server.uri()));
    let response = OpenAiProvider::compatible(context(MapEnv::new()))
        .complete(ProviderRequest::new("llama3", &messages, &options))
        .await
        .unwrap();
    assert_eq!(response.text, "local");

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_error_status_carries_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Invalid API key", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let messages = vec![Message::user("hi")];
    let options = CallOptions::new().with_base_url(server.uri());
    let err = provider(keyed())
        .complete(ProviderRequest::new("gpt-4.1", &messages, &options))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(401));
    assert_eq!(err.provider(), Some("openai"));
    assert!(err.to_string().contains("Invalid API key"));
}

#[tokio::test]
async fn test_unexpected_shape_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let messages = vec![Message::user("hi")];
    let options = CallOptions::new().with_base_url(server.uri());
    let err = provider(keyed())
        .complete(ProviderRequest::new("gpt-4.1", &messages, &options))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmuxError::Decode { .. }));
}

#[tokio::test]
async fn test_stream_yields_fragments_and_usage() {
    let server = MockServer::start().await;
    let sse = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
        "data: {\"choices\":[],\"usage\":{\"prompt_tokens\":3,\"completion_tokens\":2,\"total_tokens\":5}}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "stream": true,
            "stream_options": {"include_usage": true}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .mount(&server)
        .await;

    let messages = vec![Message::user("hi")];
    let options = CallOptions::new().with_base_url(server.uri());
    let stream = provider(keyed())
        .stream(ProviderRequest::new("gpt-4.1", &messages, &options))
        .await
        .unwrap();
    let items: Vec<StreamItem> = stream.try_collect().await.unwrap();
    assert_eq!(
        items,
        vec![
            StreamItem::Text("Hel".to_string()),
            StreamItem::Text("lo".to_string()),
            StreamItem::Usage(UsageInfo::new(Some(3), Some(2), Some(5))),
        ]
    );
}

#[tokio::test]
async fn test_compatible_backends_do_not_request_stream_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("data: [DONE]\n\n", "text/event-stream"),
        )
        .mount(&server)
        .await;

    let messages = vec![Message::user("hi")];
    let options = CallOptions::new().with_base_url(server.uri());
    let env = MapEnv::new().with("DEEPSEEK_API_KEY", "ds-key");
    let stream = OpenAiProvider::deepseek(context(env))
        .stream(ProviderRequest::new("deepseek-chat", &messages, &options))
        .await
        .unwrap();
    let items: Vec<StreamItem> = stream.try_collect().await.unwrap();
    assert!(items.is_empty());

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["stream"], json!(true));
    assert!(body.get("stream_options").is_none());
    assert_eq!(
        requests[0].headers.get("authorization").unwrap(),
        "Bearer ds-key"
    );
}
