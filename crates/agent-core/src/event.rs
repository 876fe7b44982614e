//! Run Events
//!
//! Incremental progress emitted while a run is in flight, so callers can
//! print or stream each step before the run terminates.

use serde::Serialize;

use crate::error::AbortReason;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// A model call is about to be made (1-based)
    StepStarted { step: usize },

    /// Thought section of the reply
    Thought { step: usize, text: String },

    /// Action section of the reply
    Action { step: usize, text: String },

    /// Observation appended to the trajectory
    Observation { step: usize, text: String },

    /// Extra Thought/Action pairs were cut from the reply
    Truncated { step: usize },

    Finished { answer: String, steps_used: usize },

    Aborted { reason: AbortReason, steps_used: usize },
}
