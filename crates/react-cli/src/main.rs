//! react-agent CLI
//!
//! Runs one question through the ReAct agent, printing every
//! Thought/Action/Observation as it happens.

mod args;
mod output;
mod signal;

use std::sync::Arc;

use agent_core::{
    AgentError, AgentEvent, CancelToken, LlmProvider, ReActAgentBuilder, ToolRegistry,
};
use agent_runtime::{OllamaProvider, OpenAiProvider};
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::args::{Args, ProviderKind};
use crate::output::{format_outcome, progress_line};

const DEFAULT_LOG_FILTER: &str = "info";

/// Log the full error and surface the friendly message to the user.
fn report(err: &AgentError) -> anyhow::Error {
    tracing::error!(error = %err, "Startup failed");
    anyhow::anyhow!(err.user_message())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment before reading RUST_LOG and provider settings
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let provider: Arc<dyn LlmProvider> = match args.provider {
        ProviderKind::Ollama => Arc::new(OllamaProvider::from_env()),
        ProviderKind::Openai => Arc::new(OpenAiProvider::from_env().map_err(|e| report(&e))?),
    };

    match provider.health_check().await {
        Ok(true) => tracing::info!(provider = provider.name(), "✓ Model provider reachable"),
        Ok(false) => {
            tracing::warn!(provider = provider.name(), "⚠ Model provider not reachable - the run will likely abort");
        }
        Err(e) => {
            tracing::warn!(provider = provider.name(), error = %e, "⚠ {}", e.user_message());
        }
    }

    let mut tools = ToolRegistry::new();
    react_tools::register_defaults(&mut tools)?;
    tracing::info!("Registered {} tools: {}", tools.len(), tools.names().join(", "));

    let (tx, mut rx) = mpsc::unbounded_channel::<AgentEvent>();
    let agent = ReActAgentBuilder::new()
        .provider(provider)
        .tools(tools)
        .model(args.model.clone())
        .temperature(args.temperature)
        .max_steps(args.max_steps)
        .events(tx)
        .build()
        .map_err(|e| report(&e))?;

    let json = args.json;
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let line = progress_line(&event, json);
            if json {
                eprintln!("{line}");
            } else {
                println!("{line}");
            }
        }
    });

    let cancel = CancelToken::new();
    signal::spawn_listener(cancel.clone());

    let outcome = agent.run_with_cancel(&args.question, &cancel).await;

    // Closing the sender lets the printer drain and exit
    drop(agent);
    printer.await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("\n{}", format_outcome(&outcome));
    }

    if !outcome.is_finished() {
        std::process::exit(1);
    }
    Ok(())
}
