//! Command-line arguments

use clap::{Parser, ValueEnum};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    /// Local Ollama server (OLLAMA_HOST / OLLAMA_PORT)
    Ollama,
    /// OpenAI-compatible endpoint (LLM_BASE_URL / LLM_API_KEY)
    Openai,
}

/// Answer a question with a ReAct agent that can search the web and check
/// the weather.
#[derive(Debug, Parser)]
#[command(name = "react-agent", version, about)]
pub struct Args {
    /// Question to answer
    pub question: String,

    /// Model backend
    #[arg(long, value_enum, env = "REACT_PROVIDER", default_value = "ollama")]
    pub provider: ProviderKind,

    /// Model identifier passed to the provider
    #[arg(long, env = "LLM_MODEL_ID", default_value = "llama3.2")]
    pub model: String,

    /// Maximum model calls before giving up
    #[arg(long, default_value_t = 5)]
    pub max_steps: usize,

    /// Sampling temperature
    #[arg(long, default_value_t = 0.7)]
    pub temperature: f32,

    /// Print the final outcome as JSON instead of text
    #[arg(long)]
    pub json: bool,
}
