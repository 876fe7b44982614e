//! Error Types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AgentError {
    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The AI service encountered an error: {msg}"),
            Self::ProviderUnavailable(_) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            Self::ToolExecution(msg) => format!("Tool error: {msg}"),
            Self::Config(msg) => format!("Configuration problem: {msg}"),
        }
    }
}

/// Failures the loop recovers from by feeding an observation back to the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepFailure {
    /// Reply had no well-formed `Action:` directive
    ParseFailure,

    /// Action named a tool absent from the registry
    UnknownTool(String),

    /// Handler returned an error or panicked
    ToolExecutionFailure { tool: String, detail: String },
}

impl StepFailure {
    /// Observation text fed back to the model for this failure.
    pub fn observation(&self) -> String {
        match self {
            Self::ParseFailure => "Unable to parse an Action from the response; reply must follow \
                 'Thought: ... Action: ...' format."
                .into(),
            Self::UnknownTool(name) => format!("Error: tool '{name}' is not defined"),
            Self::ToolExecutionFailure { tool, detail } => {
                format!("Error: tool '{tool}' failed: {detail}")
            }
        }
    }
}

/// Why a run ended without a final answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// The provider errored or returned no text
    ModelUnavailable,

    /// Step budget used up without a `Finish`
    MaxSteps,

    /// Caller signalled the cancel token
    Cancelled,
}

impl AbortReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ModelUnavailable => "model produced no output",
            Self::MaxSteps => "max steps reached",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
