//! Terminal rendering of run progress and outcome

use agent_core::{AgentEvent, RunOutcome, RunStatus};

pub fn format_event(event: &AgentEvent) -> String {
    match event {
        AgentEvent::StepStarted { step } => format!("------ Step {step} ------"),
        AgentEvent::Thought { text, .. } => format!("Thought: {text}"),
        AgentEvent::Action { text, .. } => format!("Action: {text}"),
        AgentEvent::Observation { text, .. } => format!("Observation: {text}"),
        AgentEvent::Truncated { .. } => "(extra Thought/Action pairs in the reply were dropped)".into(),
        AgentEvent::Finished { answer, .. } => format!("Final answer: {answer}"),
        AgentEvent::Aborted { reason, .. } => format!("Run stopped: {reason}"),
    }
}

/// One progress line. In JSON mode events are written as JSON lines to
/// stderr, so stdout carries only the final outcome document.
pub fn progress_line(event: &AgentEvent, json: bool) -> String {
    if json {
        serde_json::to_string(event).unwrap_or_else(|_| format_event(event))
    } else {
        format_event(event)
    }
}

pub fn format_outcome(outcome: &RunOutcome) -> String {
    match (outcome.status, &outcome.answer, outcome.abort_reason) {
        (RunStatus::Finished, Some(answer), _) => {
            format!("{answer}\n({} step(s))", outcome.steps_used)
        }
        (_, _, Some(reason)) => {
            format!("No answer: {reason} after {} step(s)", outcome.steps_used)
        }
        _ => format!("No answer after {} step(s)", outcome.steps_used),
    }
}
