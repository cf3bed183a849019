//! Ghostwriter agent - natural-language front end for Ghostwriter
//!
//! Runs a tool-calling LLM loop over the Ghostwriter GraphQL API so users can
//! search and create clients, projects, reports and findings in plain language.

mod backend;
mod cli;
mod config;
mod conversation;
mod llm;
mod runtime;
mod state_machine;
mod system_prompt;
mod tools;
mod workflow;

use clap::Parser;
use cli::{Cli, Command};
use config::AgentConfig;
use conversation::Conversation;
use runtime::Services;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = AgentConfig::from_env()?;

    // Initialize logging
    let default_filter = if config.debug {
        "ghostwriter_agent=debug"
    } else {
        "ghostwriter_agent=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Some(Command::Workflow) => {
            println!("{}", serde_json::to_string_pretty(workflow::guidance())?);
        }
        Some(Command::Tool { name, args }) => {
            let args = match args {
                Some(raw) => serde_json::from_str(&raw)?,
                None => serde_json::json!({}),
            };
            let services = Services::connect(&config)?;
            let result = services
                .registry
                .invoke(&name, args, services.tool_context.clone())
                .await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Some(Command::Ask { prompt }) => {
            let runtime = Services::connect(&config)?.runtime(&config)?;
            let reply = runtime.run(&prompt.join(" ")).await;
            println!("{}", reply.answer);
        }
        None => {
            let runtime = Services::connect(&config)?.runtime(&config)?;

            // Interactive: every line continues the same conversation
            let mut conversation = Conversation::new();
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                let prompt = line.trim();
                if prompt.is_empty() {
                    continue;
                }
                let reply = runtime
                    .run_with_history(std::mem::take(&mut conversation), prompt)
                    .await;
                println!("{}", reply.answer);
                conversation = reply.conversation;
            }
        }
    }

    Ok(())
}
