//! llmux terminal client
//!
//! Interactive multi-turn chat, or a single prompt with `-q`, against any
//! provider llmux supports.
//!
//! ```bash
//! llmux -m claude-sonnet-4 -s "Be concise"
//! llmux -q "Explain lifetimes in one paragraph" --show-cost
//! ```

mod args;
mod chat;
mod commands;
mod session;

use anyhow::Context;
use args::Cli;
use clap::Parser;
use llmux_core::{ClientConfig, Llmux};
use session::Session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    // Set RUST_LOG=llmux_core=debug for request logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env();
    let client = Llmux::new(config.clone()).context("Failed to create client")?;

    let output = chat::OutputSettings::from_cli(&cli);
    let mut session = Session::new(&cli, &config.default_model);

    if let Some(prompt) = cli.once.as_deref() {
        let code = chat::run_once(&client, &mut session, prompt, output).await;
        std::process::exit(code);
    }

    chat::run_interactive(&client, &mut session, output).await
}
