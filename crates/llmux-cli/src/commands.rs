//! Interactive chat commands

/// One line of interactive input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Blank line
    Empty,
    Help,
    Exit,
    /// Clear the conversation history
    Reset,
    /// Replace the system prompt; `None` clears it
    System(Option<String>),
    /// Switch model; `None` means the name was missing
    Model(Option<String>),
    /// Attach image paths to the next user message
    Images(Vec<String>),
    /// A regular user message
    Message(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }

        match line {
            "/exit" | "/quit" | ":q" => return Self::Exit,
            "/help" => return Self::Help,
            "/reset" => return Self::Reset,
            "/system" => return Self::System(None),
            "/model" => return Self::Model(None),
            "/img" => return Self::Images(Vec::new()),
            _ => {}
        }

        if let Some(rest) = line.strip_prefix("/system ") {
            let rest = rest.trim();
            return Self::System((!rest.is_empty()).then(|| rest.to_string()));
        }
        if let Some(rest) = line.strip_prefix("/model ") {
            let rest = rest.trim();
            return Self::Model((!rest.is_empty()).then(|| rest.to_string()));
        }
        if let Some(rest) = line.strip_prefix("/img ") {
            return Self::Images(rest.split_whitespace().map(str::to_string).collect());
        }

        Self::Message(line.to_string())
    }
}

pub const HELP: &str = "\
Commands:
  /help                 Show this help
  /exit | /quit | :q    Exit the chat
  /reset                Reset conversation history
  /system <text>        Set or replace the system prompt for the session
  /model  <name>        Switch model (e.g. \"/model gpt-4o-mini\")
  /img    <path(s)>     Attach one or more image paths to the next user message";
