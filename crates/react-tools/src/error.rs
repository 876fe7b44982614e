//! Error Types for Tools

use agent_core::AgentError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{0} is not configured")]
    MissingApiKey(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl From<ToolError> for AgentError {
    fn from(err: ToolError) -> Self {
        Self::ToolExecution(err.to_string())
    }
}
