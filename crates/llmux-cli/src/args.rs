//! CLI argument definitions using clap

use clap::Parser;
use llmux_core::GenerationOptions;

#[derive(Parser, Debug)]
#[command(name = "llmux")]
#[command(about = "Chat with LLMs in your terminal")]
#[command(
    long_about = r#"Chat with LLMs in your terminal

USAGE:
  llmux                                  # Interactive chat with the default model
  llmux -m claude-sonnet-4               # Pick a model, provider inferred from its name
  llmux -q "your prompt"                 # One-shot: send a prompt and exit
  llmux --base-url http://localhost:11434/v1 -m llama3
                                         # Any OpenAI-compatible server

API keys are read from ANTHROPIC_API_KEY, GEMINI_API_KEY, OPENAI_API_KEY,
DEEPSEEK_API_KEY, TOGETHER_API_KEY, XAI_API_KEY or GROQ_API_KEY, including
values from a .env file in the working directory."#
)]
#[command(version)]
pub struct Cli {
    /// Model name (defaults to LLMUX_DEFAULT_MODEL or gpt-4.1)
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Force a provider (openai, anthropic, gemini, deepseek, together, xai, groq, responses)
    #[arg(long)]
    pub provider: Option<String>,

    /// OpenAI-compatible base URL, e.g. http://localhost:11434/v1
    #[arg(long)]
    pub base_url: Option<String>,

    /// Override the API key instead of the provider's environment variable
    #[arg(long)]
    pub api_key: Option<String>,

    /// System prompt for the session
    #[arg(short = 's', long)]
    pub system: Option<String>,

    /// Print whole replies instead of streaming them
    #[arg(long)]
    pub no_stream: bool,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Nucleus sampling probability
    #[arg(long)]
    pub top_p: Option<f64>,

    /// Maximum tokens to generate
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Print token usage after each reply, when the provider reports it
    #[arg(long)]
    pub show_usage: bool,

    /// Print the estimated cost after each reply, when the model is priced
    #[arg(long)]
    pub show_cost: bool,

    /// Send a single prompt and exit
    #[arg(short = 'q', long = "once", value_name = "PROMPT")]
    pub once: Option<String>,
}

impl Cli {
    pub fn stream(&self) -> bool {
        !self.no_stream
    }

    pub fn generation_options(&self) -> GenerationOptions {
        let mut options = GenerationOptions::new();
        if let Some(temperature) = self.temperature {
            options = options.with_temperature(temperature);
        }
        if let Some(top_p) = self.top_p {
            options = options.with_top_p(top_p);
        }
        if let Some(max_tokens) = self.max_tokens {
            options = options.with_max_tokens(max_tokens);
        }
        options
    }
}
