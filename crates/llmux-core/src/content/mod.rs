//! Content parts and their normalization
//!
//! Every adapter consumes the same two part shapes: text, and an image
//! reference whose [`SourceKind`] is decided once when the part is built.

mod reader;

pub use reader::ImageReader;

use crate::error::{LlmuxError, LlmuxResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Value;
use std::fmt;
use std::io::Read;
use std::path::PathBuf;

/// How an image part refers to its bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Path,
    Url,
    Bytes,
    Stream,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Path => "path",
            Self::Url => "url",
            Self::Bytes => "bytes",
            Self::Stream => "stream",
        };
        write!(f, "{}", name)
    }
}

/// A classified image source
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Path(PathBuf),
    Url(String),
    Bytes(Vec<u8>),
    Stream(ImageReader),
}

impl ImageSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Path(_) => SourceKind::Path,
            Self::Url(_) => SourceKind::Url,
            Self::Bytes(_) => SourceKind::Bytes,
            Self::Stream(_) => SourceKind::Stream,
        }
    }

    /// Classify a string: `http://` and `https://` (any case) are URLs,
    /// everything else is a filesystem path.
    fn from_string(value: String) -> Self {
        let lower = value.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(value)
        } else {
            Self::Path(PathBuf::from(value))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImagePart {
    pub source: ImageSource,
    pub mime: Option<String>,
    pub detail: Option<String>,
}

/// One element of a message body
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text { value: String },
    Image(ImagePart),
}

impl ContentPart {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { value } => Some(value),
            Self::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImagePart> {
        match self {
            Self::Image(image) => Some(image),
            Self::Text { .. } => None,
        }
    }

    /// Parse an already-tagged JSON part
    ///
    /// Accepted shapes:
    /// - `{"type": "text", "text": "..."}`
    /// - `{"type": "image", "source": {"kind": "url" | "path" | "bytes", "value": ...}, "mime"?, "detail"?}`
    /// - `{"type": "image", "source": "<url or path>"}`
    ///
    /// A bare JSON string is treated as text.
    pub fn from_value(value: &Value) -> LlmuxResult<Self> {
        if let Some(s) = value.as_str() {
            return Ok(text(s));
        }
        let tag = value.get("type").and_then(Value::as_str).ok_or_else(|| {
            LlmuxError::UnsupportedContentItem(
                "Use strings or parts created via text() or image()".to_string(),
            )
        })?;

        match tag {
            "text" => {
                let value = match value.get("text") {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                Ok(Self::Text { value })
            }
            "image" => {
                let source = value.get("source").ok_or_else(|| {
                    LlmuxError::UnsupportedContentSource("image part has no source".to_string())
                })?;
                let mime = value.get("mime").and_then(Value::as_str);
                let detail = value.get("detail").and_then(Value::as_str);
                image(ImageInput::Value(source.clone()), mime, detail)
            }
            other => Err(LlmuxError::UnsupportedContentItem(format!(
                "unknown part type '{}'",
                other
            ))),
        }
    }
}

/// Anything [`image`] can classify
#[derive(Debug, Clone)]
pub enum ImageInput {
    Text(String),
    Path(PathBuf),
    Bytes(Vec<u8>),
    Reader(ImageReader),
    /// Loosely-typed source, typically from JSON input
    Value(Value),
}

impl ImageInput {
    /// Wrap any reader as a stream source
    pub fn reader(reader: impl Read + Send + 'static) -> Self {
        Self::Reader(ImageReader::new(reader))
    }
}

impl From<&str> for ImageInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ImageInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<PathBuf> for ImageInput {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&std::path::Path> for ImageInput {
    fn from(value: &std::path::Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageInput {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for ImageInput {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl From<ImageReader> for ImageInput {
    fn from(value: ImageReader) -> Self {
        Self::Reader(value)
    }
}

impl From<Value> for ImageInput {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Build a text part
pub fn text(value: impl Into<String>) -> ContentPart {
    ContentPart::Text {
        value: value.into(),
    }
}

/// Build an image part, classifying the source
pub fn image(
    source: impl Into<ImageInput>,
    mime: Option<&str>,
    detail: Option<&str>,
) -> LlmuxResult<ContentPart> {
    let source = classify(source.into())?;
    Ok(ContentPart::Image(ImagePart {
        source,
        mime: mime.filter(|m| !m.is_empty()).map(str::to_string),
        detail: detail.filter(|d| !d.is_empty()).map(str::to_string),
    }))
}

fn classify(input: ImageInput) -> LlmuxResult<ImageSource> {
    match input {
        ImageInput::Reader(reader) => Ok(ImageSource::Stream(reader)),
        ImageInput::Bytes(bytes) => Ok(ImageSource::Bytes(bytes)),
        ImageInput::Text(s) => Ok(ImageSource::from_string(s)),
        ImageInput::Path(path) => match path.into_os_string().into_string() {
            Ok(s) => Ok(ImageSource::from_string(s)),
            Err(os) => Ok(ImageSource::Path(PathBuf::from(os))),
        },
        ImageInput::Value(value) => classify_value(value),
    }
}

fn classify_value(value: Value) -> LlmuxResult<ImageSource> {
    match value {
        Value::String(s) => Ok(ImageSource::from_string(s)),
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
            .collect::<Option<Vec<u8>>>()
            .map(ImageSource::Bytes)
            .ok_or_else(unsupported_source),
        Value::Object(map) => {
            let kind = map.get("kind").and_then(Value::as_str).unwrap_or_default();
            let inner = map.get("value").cloned().unwrap_or(Value::Null);
            match (kind, inner) {
                ("url" | "path", Value::String(s)) => Ok(ImageSource::from_string(s)),
                ("bytes", Value::String(encoded)) => BASE64
                    .decode(encoded.as_bytes())
                    .map(ImageSource::Bytes)
                    .map_err(|e| {
                        LlmuxError::UnsupportedContentSource(format!(
                            "bytes source is not valid base64: {}",
                            e
                        ))
                    }),
                ("bytes", array @ Value::Array(_)) => classify_value(array),
                _ => Err(unsupported_source()),
            }
        }
        _ => Err(unsupported_source()),
    }
}

fn unsupported_source() -> LlmuxError {
    LlmuxError::UnsupportedContentSource(
        "Use a path, URL, bytes, or a readable stream".to_string(),
    )
}

/// Caller-supplied message body before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(String),
    Items(Vec<ContentItem>),
    /// Loosely-typed body: null, a string, or an array of items
    Json(Value),
}

/// One element of [`Content::Items`]
#[derive(Debug, Clone, PartialEq)]
pub enum ContentItem {
    Text(String),
    Part(ContentPart),
    Value(Value),
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<ContentItem>> for Content {
    fn from(value: Vec<ContentItem>) -> Self {
        Self::Items(value)
    }
}

impl From<Vec<ContentPart>> for Content {
    fn from(value: Vec<ContentPart>) -> Self {
        Self::Items(value.into_iter().map(ContentItem::Part).collect())
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<&str> for ContentItem {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ContentItem {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<ContentPart> for ContentItem {
    fn from(value: ContentPart) -> Self {
        Self::Part(value)
    }
}

impl From<Value> for ContentItem {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Normalize caller content into an ordered list of parts
pub fn normalize_to_parts(content: Option<Content>) -> LlmuxResult<Vec<ContentPart>> {
    match content {
        None => Ok(Vec::new()),
        Some(Content::Text(s)) => Ok(vec![text(s)]),
        Some(Content::Items(items)) => items.into_iter().map(normalize_item).collect(),
        Some(Content::Json(value)) => match value {
            Value::Null => Ok(Vec::new()),
            Value::String(s) => Ok(vec![text(s)]),
            Value::Array(items) => items
                .into_iter()
                .map(|v| normalize_item(ContentItem::Value(v)))
                .collect(),
            _ => Err(LlmuxError::UnsupportedContentItem(
                "Use a string or a list of parts".to_string(),
            )),
        },
    }
}

fn normalize_item(item: ContentItem) -> LlmuxResult<ContentPart> {
    match item {
        ContentItem::Text(s) => Ok(text(s)),
        ContentItem::Part(part) => Ok(part),
        ContentItem::Value(value) if value.is_string() || value.is_object() => {
            ContentPart::from_value(&value)
        }
        ContentItem::Value(other) => Err(LlmuxError::UnsupportedContentItem(format!(
            "Use strings or parts created via text() or image(), got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    #[test]
    fn test_plain_string_becomes_single_text_part() {
        let parts = normalize_to_parts(Some("hi".into())).unwrap();
        assert_eq!(parts, vec![text("hi")]);
    }

    #[test]
    fn test_none_is_empty() {
        assert!(normalize_to_parts(None).unwrap().is_empty());
        assert!(normalize_to_parts(Some(Content::Json(Value::Null))).unwrap().is_empty());
    }

    #[test]
    fn test_mixed_items_keep_order() {
        let img = image("https://example.com/cat.png", None, None).unwrap();
        let parts = normalize_to_parts(Some(Content::Items(vec![
            "describe".into(),
            img.clone().into(),
            json!({"type": "text", "text": "briefly"}).into(),
        ])))
        .unwrap();
        assert_eq!(parts, vec![text("describe"), img, text("briefly")]);
    }

    #[test]
    fn test_untagged_item_is_rejected() {
        let err = normalize_to_parts(Some(Content::Json(json!(["ok", 42])))).unwrap_err();
        assert!(matches!(err, LlmuxError::UnsupportedContentItem(_)));

        let err = normalize_to_parts(Some(Content::Json(json!([{"text": "no tag"}])))).unwrap_err();
        assert!(matches!(err, LlmuxError::UnsupportedContentItem(_)));
    }

    #[test]
    fn test_non_list_json_is_rejected() {
        let err = normalize_to_parts(Some(Content::Json(json!(3.5)))).unwrap_err();
        assert!(matches!(err, LlmuxError::UnsupportedContentItem(_)));
    }

    #[test]
    fn test_image_classification() {
        let kind = |part: ContentPart| part.as_image().unwrap().source.kind();

        assert_eq!(kind(image("https://x.test/a.png", None, None).unwrap()), SourceKind::Url);
        assert_eq!(kind(image("HTTP://x.test/a.png", None, None).unwrap()), SourceKind::Url);
        assert_eq!(kind(image(vec![0xffu8, 0xd8], None, None).unwrap()), SourceKind::Bytes);
        assert_eq!(
            kind(image(ImageInput::reader(Cursor::new(vec![1u8])), None, None).unwrap()),
            SourceKind::Stream
        );
        assert_eq!(kind(image("photos/cat.jpg", None, None).unwrap()), SourceKind::Path);
        assert_eq!(
            kind(image(PathBuf::from("/tmp/cat.jpg"), None, None).unwrap()),
            SourceKind::Path
        );
    }

    #[test]
    fn test_image_keeps_mime_and_detail() {
        let part = image("a.webp", Some("image/webp"), Some("low")).unwrap();
        let image = part.as_image().unwrap();
        assert_eq!(image.mime.as_deref(), Some("image/webp"));
        assert_eq!(image.detail.as_deref(), Some("low"));
    }

    #[test]
    fn test_unsupported_image_source() {
        let err = image(json!(true), None, None).unwrap_err();
        assert!(matches!(err, LlmuxError::UnsupportedContentSource(_)));

        let err = image(json!({"kind": "stream", "value": "x"}), None, None).unwrap_err();
        assert!(matches!(err, LlmuxError::UnsupportedContentSource(_)));
    }

    #[test]
    fn test_tagged_image_part_from_json() {
        let part = ContentPart::from_value(&json!({
            "type": "image",
            "source": {"kind": "bytes", "value": "AAEC"},
            "mime": "image/png"
        }))
        .unwrap();
        let image = part.as_image().unwrap();
        assert_eq!(image.source, ImageSource::Bytes(vec![0, 1, 2]));
        assert_eq!(image.mime.as_deref(), Some("image/png"));
    }
}
