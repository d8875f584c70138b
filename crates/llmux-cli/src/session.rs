//! Conversation state for the interactive chat

use crate::args::Cli;
use llmux_core::{ChatRequest, GenerationOptions, LlmuxResult, Message, Role, image, text};

/// Everything that persists between turns
#[derive(Debug, Clone)]
pub struct Session {
    pub model: String,
    pub provider: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub system: Option<String>,
    pub options: GenerationOptions,
    history: Vec<Message>,
    pending_images: Vec<String>,
}

impl Session {
    pub fn new(cli: &Cli, default_model: &str) -> Self {
        Self {
            model: cli
                .model
                .clone()
                .unwrap_or_else(|| default_model.to_string()),
            provider: cli.provider.clone(),
            base_url: cli.base_url.clone(),
            api_key: cli.api_key.clone(),
            system: cli.system.clone(),
            options: cli.generation_options(),
            history: Vec::new(),
            pending_images: Vec::new(),
        }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn pending_images(&self) -> &[String] {
        &self.pending_images
    }

    /// Forget the conversation but keep the system prompt
    pub fn reset(&mut self) {
        self.history.clear();
        self.pending_images.clear();
    }

    pub fn attach_images(&mut self, paths: Vec<String>) -> usize {
        self.pending_images.extend(paths);
        self.pending_images.len()
    }

    /// Append a user turn, consuming pending images
    ///
    /// Images are classified the same way as library input, so URLs and file
    /// paths both work.
    pub fn push_user(&mut self, line: &str) -> LlmuxResult<()> {
        let mut parts = vec![text(line)];
        for path in &self.pending_images {
            parts.push(image(path.as_str(), None, None)?);
        }
        self.pending_images.clear();
        self.history.push(Message::new(Role::User, parts));
        Ok(())
    }

    /// Drop the last user turn after a failed request
    pub fn discard_last_user(&mut self) {
        if self.history.last().is_some_and(|m| m.role == Role::User) {
            self.history.pop();
        }
    }

    pub fn push_assistant(&mut self, reply: &str) {
        if !reply.is_empty() {
            self.history.push(Message::assistant(reply));
        }
    }

    /// Request carrying the whole history
    pub fn request(&self, stream: bool) -> ChatRequest {
        let mut request = ChatRequest::messages(self.history.iter().cloned())
            .with_model(self.model.clone())
            .with_options(self.options.clone())
            .with_stream(stream);
        if let Some(system) = &self.system {
            request = request.with_system(system.clone());
        }
        if let Some(provider) = &self.provider {
            request = request.with_provider(provider.clone());
        }
        if let Some(base_url) = &self.base_url {
            request = request.with_base_url(base_url.clone());
        }
        if let Some(api_key) = &self.api_key {
            request = request.with_api_key(api_key.clone());
        }
        request
    }
}
