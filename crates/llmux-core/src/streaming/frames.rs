//! Per-provider frame parsers

use super::decode::StreamItem;
use super::sse::SseFrame;
use crate::error::LlmuxError;
use crate::pricing::normalize_usage;
use serde_json::Value;

/// What to do with one decoded frame
#[derive(Debug)]
pub enum FrameAction {
    /// Yield these items in order
    Emit(Vec<StreamItem>),
    /// Well-formed but carries nothing of interest
    Skip,
    /// Could not be decoded; logged and skipped
    Malformed(String),
    /// The server signalled the end of the stream
    Done,
    /// The server reported a failure in-band
    Fail(LlmuxError),
}

impl FrameAction {
    fn from_items(items: Vec<StreamItem>) -> Self {
        if items.is_empty() {
            Self::Skip
        } else {
            Self::Emit(items)
        }
    }
}

/// Turns one provider frame into stream items
pub trait FrameParser: Send + 'static {
    fn parse(&mut self, frame: &SseFrame) -> FrameAction;
}

fn parse_json(data: &str) -> Result<Value, FrameAction> {
    serde_json::from_str(data.trim()).map_err(|e| FrameAction::Malformed(e.to_string()))
}

fn push_text(items: &mut Vec<StreamItem>, text: Option<&str>) {
    if let Some(text) = text.filter(|t| !t.is_empty()) {
        items.push(StreamItem::Text(text.to_string()));
    }
}

fn push_usage(items: &mut Vec<StreamItem>, raw: Option<&Value>) {
    if let Some(raw) = raw {
        let usage = normalize_usage(raw);
        if !usage.is_empty() {
            items.push(StreamItem::Usage(usage));
        }
    }
}

/// OpenAI chat-completions chunks
///
/// Fragments come from `choices[0].delta.content`; `[DONE]` ends the stream.
/// The final chunk may carry `usage` when `stream_options.include_usage` was
/// requested.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenAiFrames;

impl FrameParser for OpenAiFrames {
    fn parse(&mut self, frame: &SseFrame) -> FrameAction {
        if frame.data.trim() == "[DONE]" {
            return FrameAction::Done;
        }
        let chunk = match parse_json(&frame.data) {
            Ok(v) => v,
            Err(action) => return action,
        };

        let mut items = Vec::new();
        push_text(
            &mut items,
            chunk.pointer("/choices/0/delta/content").and_then(Value::as_str),
        );
        push_usage(&mut items, chunk.get("usage").filter(|u| u.is_object()));
        FrameAction::from_items(items)
    }
}

/// Gemini `streamGenerateContent?alt=sse` chunks
#[derive(Debug, Default, Clone, Copy)]
pub struct GoogleFrames;

impl FrameParser for GoogleFrames {
    fn parse(&mut self, frame: &SseFrame) -> FrameAction {
        let chunk = match parse_json(&frame.data) {
            Ok(v) => v,
            Err(action) => return action,
        };

        let mut items = Vec::new();
        push_text(
            &mut items,
            chunk
                .pointer("/candidates/0/content/parts/0/text")
                .and_then(Value::as_str),
        );
        push_usage(&mut items, chunk.get("usageMetadata"));
        FrameAction::from_items(items)
    }
}

/// Anthropic messages events
///
/// Input tokens arrive in `message_start`, text in `content_block_delta`,
/// output tokens in `message_delta`, and `message_stop` ends the stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnthropicFrames;

impl FrameParser for AnthropicFrames {
    fn parse(&mut self, frame: &SseFrame) -> FrameAction {
        let data = match parse_json(&frame.data) {
            Ok(v) => v,
            Err(action) => return action,
        };
        let event_type = frame
            .event
            .as_deref()
            .or_else(|| data.get("type").and_then(Value::as_str));

        let mut items = Vec::new();
        match event_type {
            Some("message_start") => {
                push_usage(&mut items, data.pointer("/message/usage"));
            }
            Some("content_block_delta") => {
                if data.pointer("/delta/type").and_then(Value::as_str) == Some("text_delta") {
                    push_text(&mut items, data.pointer("/delta/text").and_then(Value::as_str));
                }
            }
            Some("message_delta") => {
                push_usage(&mut items, data.get("usage"));
            }
            Some("message_stop") => return FrameAction::Done,
            Some("error") => {
                let message = data
                    .pointer("/error/message")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown error");
                return FrameAction::Fail(LlmuxError::transport_with_provider(
                    format!("stream error: {}", message),
                    "anthropic",
                ));
            }
            _ => {}
        }
        FrameAction::from_items(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::UsageInfo;

    fn texts(action: FrameAction) -> Vec<String> {
        match action {
            FrameAction::Emit(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    StreamItem::Text(t) => Some(t),
                    StreamItem::Usage(_) => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn test_openai_delta_and_done() {
        let mut parser = OpenAiFrames;
        let frame = SseFrame::new(r#"{"choices":[{"delta":{"content":"Hi"}}]}"#);
        assert_eq!(texts(parser.parse(&frame)), vec!["Hi"]);

        let role_only = SseFrame::new(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#);
        assert!(matches!(parser.parse(&role_only), FrameAction::Skip));

        assert!(matches!(parser.parse(&SseFrame::new("[DONE]")), FrameAction::Done));
        assert!(matches!(
            parser.parse(&SseFrame::new("{not json")),
            FrameAction::Malformed(_)
        ));
    }

    #[test]
    fn test_openai_usage_chunk() {
        let mut parser = OpenAiFrames;
        let frame = SseFrame::new(
            r#"{"choices":[],"usage":{"prompt_tokens":5,"completion_tokens":2,"total_tokens":7}}"#,
        );
        match parser.parse(&frame) {
            FrameAction::Emit(items) => assert_eq!(
                items,
                vec![StreamItem::Usage(UsageInfo::new(Some(5), Some(2), Some(7)))]
            ),
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_google_text_and_usage() {
        let mut parser = GoogleFrames;
        let frame = SseFrame::new(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hola"}]}}],"usageMetadata":{"promptTokenCount":3,"candidatesTokenCount":1,"totalTokenCount":4}}"#,
        );
        match parser.parse(&frame) {
            FrameAction::Emit(items) => {
                assert_eq!(items[0], StreamItem::Text("Hola".to_string()));
                assert_eq!(
                    items[1],
                    StreamItem::Usage(UsageInfo::new(Some(3), Some(1), Some(4)))
                );
            }
            other => panic!("unexpected action: {:?}", other),
        }

        let no_text = SseFrame::new(r#"{"candidates":[{"finishReason":"STOP"}]}"#);
        assert!(matches!(parser.parse(&no_text), FrameAction::Skip));
    }

    #[test]
    fn test_anthropic_event_sequence() {
        let mut parser = AnthropicFrames;
        let start = SseFrame::with_event(
            "message_start",
            r#"{"type":"message_start","message":{"usage":{"input_tokens":25,"output_tokens":1}}}"#,
        );
        assert!(matches!(parser.parse(&start), FrameAction::Emit(_)));

        let delta = SseFrame::with_event(
            "content_block_delta",
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hello"}}"#,
        );
        assert_eq!(texts(parser.parse(&delta)), vec!["Hello"]);

        let ping = SseFrame::with_event("ping", r#"{"type":"ping"}"#);
        assert!(matches!(parser.parse(&ping), FrameAction::Skip));

        let stop = SseFrame::new(r#"{"type":"message_stop"}"#);
        assert!(matches!(parser.parse(&stop), FrameAction::Done));
    }

    #[test]
    fn test_anthropic_error_event_fails() {
        let mut parser = AnthropicFrames;
        let frame = SseFrame::with_event(
            "error",
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        );
        match parser.parse(&frame) {
            FrameAction::Fail(err) => {
                assert!(err.is_transport());
                assert!(err.to_string().contains("Overloaded"));
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }
}
