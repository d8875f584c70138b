//! One-shot and interactive chat modes

use crate::args::Cli;
use crate::commands::{Command, HELP};
use crate::session::Session;
use colored::*;
use futures::StreamExt;
use llmux_core::{CallOutput, ChatRequest, Llmux, LlmuxResult, Response};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// What to print after each reply
#[derive(Debug, Clone, Copy)]
pub struct OutputSettings {
    pub stream: bool,
    pub show_usage: bool,
    pub show_cost: bool,
}

impl OutputSettings {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            stream: cli.stream(),
            show_usage: cli.show_usage,
            show_cost: cli.show_cost,
        }
    }
}

/// Send one request and print the reply as it arrives
async fn send(
    client: &Llmux,
    request: ChatRequest,
    output: OutputSettings,
) -> LlmuxResult<Response> {
    let response = match client.call(request.with_stream(output.stream)).await? {
        CallOutput::Complete(response) => {
            println!("{}", response.text);
            response
        }
        CallOutput::Stream(mut stream) => {
            let mut stdout = std::io::stdout();
            while let Some(event) = stream.next().await {
                let event = event?;
                print!("{}", event.text);
                let _ = stdout.flush();
            }
            println!();
            stream.finalize().await?
        }
    };

    if output.show_usage {
        if let Some(usage) = &response.usage {
            let usage = serde_json::to_string(usage).unwrap_or_default();
            println!("{} {}", "usage:".dimmed(), usage.dimmed());
        }
    }
    if output.show_cost {
        if let Some(cost) = response.cost() {
            println!("{}", format!("cost: ${:.6}", cost).dimmed());
        }
    }
    Ok(response)
}

fn print_error(err: &dyn std::fmt::Display) {
    eprintln!("{} {}", "Error:".red().bold(), err.to_string().red());
}

/// Send a single prompt; the exit code is 1 on failure
pub async fn run_once(
    client: &Llmux,
    session: &mut Session,
    prompt: &str,
    output: OutputSettings,
) -> i32 {
    if let Err(err) = session.push_user(prompt) {
        print_error(&err);
        return 1;
    }
    match send(client, session.request(output.stream), output).await {
        Ok(_) => 0,
        Err(err) => {
            print_error(&err);
            1
        }
    }
}

/// Line-based chat loop; errors are reported and the loop continues
pub async fn run_interactive(
    client: &Llmux,
    session: &mut Session,
    output: OutputSettings,
) -> anyhow::Result<()> {
    println!("{}", "llmux interactive chat".bold());
    println!("Type /help for commands. Press Ctrl+D or type /exit to quit.");
    match &session.provider {
        Some(provider) => println!("Using model: {} (provider: {})", session.model.cyan(), provider),
        None => println!("Using model: {}", session.model.cyan()),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".green().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match Command::parse(&line) {
            Command::Empty => continue,
            Command::Exit => break,
            Command::Help => println!("{}", HELP),
            Command::Reset => {
                session.reset();
                println!("Conversation reset.");
            }
            Command::System(system) => {
                session.system = system;
                println!("System prompt set.");
            }
            Command::Model(Some(model)) => {
                println!("Switched model to: {}", model.cyan());
                session.model = model;
            }
            Command::Model(None) => println!("Usage: /model <model-name>"),
            Command::Images(paths) if paths.is_empty() => {
                println!("Usage: /img <path1> [path2 ...]")
            }
            Command::Images(paths) => {
                let count = session.attach_images(paths);
                println!("Attached {} image(s) to the next message.", count);
            }
            Command::Message(text) => {
                if let Err(err) = session.push_user(&text) {
                    print_error(&err);
                    continue;
                }

                let request = session.request(output.stream);
                tokio::select! {
                    result = send(client, request, output) => match result {
                        Ok(response) => session.push_assistant(&response.text),
                        Err(err) => {
                            tracing::debug!(error = ?err, "request failed");
                            session.discard_last_user();
                            print_error(&err);
                        }
                    },
                    _ = tokio::signal::ctrl_c() => {
                        session.discard_last_user();
                        println!("\n(Interrupted)");
                    }
                }
            }
        }
    }

    println!("Goodbye.");
    Ok(())
}
