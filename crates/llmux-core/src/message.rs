//! Canonical conversation turns

use crate::content::{self, Content, ContentPart, ImageInput};
use crate::error::{LlmuxError, LlmuxResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Speaker of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    #[default]
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = LlmuxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(Self::System),
            "user" => Ok(Self::User),
            "assistant" | "model" => Ok(Self::Assistant),
            other => Err(LlmuxError::UnsupportedContentItem(format!(
                "unknown role '{}'",
                other
            ))),
        }
    }
}

/// A normalized turn, consumed by every adapter
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<ContentPart>,
}

impl Message {
    pub fn new(role: Role, parts: Vec<ContentPart>) -> Self {
        Self { role, parts }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, vec![content::text(text)])
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![content::text(text)])
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![content::text(text)])
    }

    /// Concatenated text of all text parts
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(ContentPart::as_text).collect()
    }

    /// Number of characters across text parts
    pub fn text_chars(&self) -> usize {
        self.parts
            .iter()
            .filter_map(ContentPart::as_text)
            .map(|t| t.chars().count())
            .sum()
    }

    pub fn has_images(&self) -> bool {
        self.parts.iter().any(|p| p.as_image().is_some())
    }

    /// Whether the body is a single text part
    pub fn is_plain_text(&self) -> bool {
        matches!(self.parts.as_slice(), [ContentPart::Text { .. }])
    }
}

/// A caller-supplied turn before normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageInput {
    /// Defaults to [`Role::User`]
    pub role: Option<Role>,
    pub content: Option<Content>,
}

impl MessageInput {
    pub fn new(role: Role, content: impl Into<Content>) -> Self {
        Self {
            role: Some(role),
            content: Some(content.into()),
        }
    }

    /// A turn without an explicit role
    pub fn content(content: impl Into<Content>) -> Self {
        Self {
            role: None,
            content: Some(content.into()),
        }
    }
}

impl From<Message> for MessageInput {
    fn from(message: Message) -> Self {
        Self::new(message.role, message.parts)
    }
}

/// An entry of the `images` convenience list
#[derive(Debug, Clone)]
pub enum ImageEntry {
    /// An already-built part, passed through
    Part(ContentPart),
    /// A raw source, classified with [`content::image`]
    Source(ImageInput),
}

impl From<ContentPart> for ImageEntry {
    fn from(part: ContentPart) -> Self {
        Self::Part(part)
    }
}

impl From<ImageInput> for ImageEntry {
    fn from(source: ImageInput) -> Self {
        Self::Source(source)
    }
}

impl From<&str> for ImageEntry {
    fn from(source: &str) -> Self {
        Self::Source(source.into())
    }
}

impl From<String> for ImageEntry {
    fn from(source: String) -> Self {
        Self::Source(source.into())
    }
}

impl From<PathBuf> for ImageEntry {
    fn from(source: PathBuf) -> Self {
        Self::Source(source.into())
    }
}

impl From<Vec<u8>> for ImageEntry {
    fn from(source: Vec<u8>) -> Self {
        Self::Source(source.into())
    }
}

/// Everything a caller may supply to describe the conversation
#[derive(Debug, Clone, Default)]
pub struct NormalizeInput {
    pub prompt_text: Option<String>,
    /// Preferred over `prompt_text` when both are set
    pub content: Option<Content>,
    /// When non-empty, the other fields are ignored
    pub messages: Vec<MessageInput>,
    pub images: Vec<ImageEntry>,
}

/// Normalize caller input into canonical messages
///
/// Explicit messages are converted one to one, preserving order. Otherwise a
/// single user turn is built from `content` (or `prompt_text`) followed by the
/// convenience images, and an empty result is rejected.
pub fn normalize_messages(input: &NormalizeInput) -> LlmuxResult<Vec<Message>> {
    if !input.messages.is_empty() {
        return input
            .messages
            .iter()
            .map(|m| {
                Ok(Message {
                    role: m.role.unwrap_or_default(),
                    parts: content::normalize_to_parts(m.content.clone())?,
                })
            })
            .collect();
    }

    let primary = input
        .content
        .clone()
        .or_else(|| input.prompt_text.clone().map(Content::Text));
    let mut parts = content::normalize_to_parts(primary)?;

    for entry in &input.images {
        let part = match entry {
            ImageEntry::Part(part) => part.clone(),
            ImageEntry::Source(source) => content::image(source.clone(), None, None)?,
        };
        parts.push(part);
    }

    if parts.is_empty() {
        return Err(LlmuxError::NoContentProvided);
    }

    Ok(vec![Message::new(Role::User, parts)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ImageSource, SourceKind, text};
    use serde_json::json;

    #[test]
    fn test_prompt_text_builds_single_user_turn() {
        let input = NormalizeInput {
            prompt_text: Some("hello".to_string()),
            ..Default::default()
        };
        let messages = normalize_messages(&input).unwrap();
        assert_eq!(messages, vec![Message::user("hello")]);
    }

    #[test]
    fn test_content_wins_over_prompt_text() {
        let input = NormalizeInput {
            prompt_text: Some("ignored".to_string()),
            content: Some("used".into()),
            ..Default::default()
        };
        let messages = normalize_messages(&input).unwrap();
        assert_eq!(messages[0].text(), "used");
    }

    #[test]
    fn test_images_are_appended_after_text() {
        let input = NormalizeInput {
            prompt_text: Some("what is this?".to_string()),
            images: vec!["https://example.com/a.png".into(), "local.jpg".into()],
            ..Default::default()
        };
        let messages = normalize_messages(&input).unwrap();
        assert_eq!(messages.len(), 1);
        let parts = &messages[0].parts;
        assert_eq!(parts[0], text("what is this?"));
        assert_eq!(parts[1].as_image().unwrap().source.kind(), SourceKind::Url);
        assert_eq!(parts[2].as_image().unwrap().source.kind(), SourceKind::Path);
    }

    #[test]
    fn test_images_alone_are_enough() {
        let input = NormalizeInput {
            images: vec![vec![1u8, 2, 3].into()],
            ..Default::default()
        };
        let messages = normalize_messages(&input).unwrap();
        assert_eq!(
            messages[0].parts[0].as_image().unwrap().source,
            ImageSource::Bytes(vec![1, 2, 3])
        );
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let err = normalize_messages(&NormalizeInput::default()).unwrap_err();
        assert_eq!(err, LlmuxError::NoContentProvided);

        let input = NormalizeInput {
            content: Some(Content::Items(vec![])),
            ..Default::default()
        };
        assert_eq!(normalize_messages(&input).unwrap_err(), LlmuxError::NoContentProvided);
    }

    #[test]
    fn test_explicit_messages_default_to_user() {
        let input = NormalizeInput {
            prompt_text: Some("ignored".to_string()),
            messages: vec![
                MessageInput::new(Role::System, "be terse"),
                MessageInput::content(json!(["hi", {"type": "text", "text": "there"}])),
                MessageInput::new(Role::Assistant, "hello"),
            ],
            ..Default::default()
        };
        let messages = normalize_messages(&input).unwrap();
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
        assert_eq!(messages[1].text(), "hithere");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let input = NormalizeInput {
            content: Some(Content::Json(json!(["a", {"type": "image", "source": "b.png"}]))),
            images: vec!["https://example.com/c.png".into()],
            ..Default::default()
        };
        let first = normalize_messages(&input).unwrap();
        let second = normalize_messages(&input).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Assistant".parse::<Role>().unwrap(), Role::Assistant);
        assert_eq!("model".parse::<Role>().unwrap(), Role::Assistant);
        assert!("tool".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::User);
    }
}
