//! # agent-core
//!
//! Reason + Act agent loop with a provider-agnostic model abstraction and a
//! name-keyed tool registry.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          ReActAgent                              │
//! │  ┌────────────┐  ┌──────────────┐  ┌────────────┐  ┌───────────┐ │
//! │  │ Trajectory │  │ OutputParser │  │   Tools    │  │LlmProvider│ │
//! │  │    Log     │──│ Thought/Act  │──│  Registry  │──│ (Strategy)│ │
//! │  └────────────┘  └──────────────┘  └────────────┘  └───────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each step renders the question plus the trajectory into a prompt, asks the
//! provider for a `Thought: ... Action: ...` reply, parses it, and either
//! finishes or dispatches the named tool and records the observation.

pub mod cancel;
pub mod error;
pub mod event;
pub mod message;
pub mod parser;
pub mod provider;
pub mod reasoning;
pub mod tool;
pub mod trajectory;

pub use cancel::CancelToken;
pub use error::{AbortReason, AgentError, Result, StepFailure};
pub use event::AgentEvent;
pub use message::{Message, Role};
pub use parser::{OutputParser, ParsedDirective, ParsedOutput};
pub use provider::{Completion, GenerationOptions, LlmProvider};
pub use reasoning::{AgentConfig, ReActAgent, ReActAgentBuilder, RunId, RunOutcome, RunStatus};
pub use tool::{FnTool, Tool, ToolRegistry};
pub use trajectory::{TrajectoryEntry, TrajectoryLog};
