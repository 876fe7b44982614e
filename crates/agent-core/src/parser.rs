//! Output Parser
//!
//! Turns a raw model reply into an optional thought plus a directive.
//!
//! The reply grammar is marker based:
//!
//! ```text
//! Thought: <free text>
//! Action: <ToolName>[<argument>]
//! ```
//!
//! or `Action: Finish[<final answer>]`. Models sometimes keep going and
//! write several steps (even invented observations) in one reply; only the
//! first Thought/Action pair is kept.

use serde::{Deserialize, Serialize};

pub const THOUGHT_MARKER: &str = "Thought:";
pub const ACTION_MARKER: &str = "Action:";
pub const OBSERVATION_MARKER: &str = "Observation:";

const FINISH_PREFIX: &str = "Finish[";

/// What the model asked the loop to do next
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParsedDirective {
    Finish { answer: String },
    ToolCall { name: String, argument: String },
    Unparseable,
}

/// A parsed model reply
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedOutput {
    /// Trimmed Thought section; `Some("")` when the marker has no content
    pub thought: Option<String>,

    /// Trimmed Action section, exactly as recorded in the trajectory
    pub action: Option<String>,

    pub directive: ParsedDirective,

    /// Extra steps after the first Thought/Action pair were discarded
    pub truncated: bool,
}

/// Marker-scanning parser for `Thought: ... Action: ...` replies
pub struct OutputParser;

impl OutputParser {
    pub fn parse(raw: &str) -> ParsedOutput {
        let (text, truncated) = first_pair(raw);
        if truncated {
            tracing::warn!(
                kept = text.len(),
                dropped = raw.len() - text.len(),
                "Reply contained more than one step, truncated to the first Thought/Action pair"
            );
        }

        let action_at = text.find(ACTION_MARKER);
        let thought = parse_thought(text, action_at);
        let action = action_at.map(|at| text[at + ACTION_MARKER.len()..].trim().to_string());
        let directive = action
            .as_deref()
            .map_or(ParsedDirective::Unparseable, Self::classify_action);

        ParsedOutput {
            thought,
            action,
            directive,
            truncated,
        }
    }

    /// Classify the text after `Action:` as a finish or a tool call.
    pub fn classify_action(action: &str) -> ParsedDirective {
        if let Some(rest) = action.strip_prefix(FINISH_PREFIX) {
            if let Some(end) = rest.find(']') {
                return ParsedDirective::Finish {
                    answer: rest[..end].trim().to_string(),
                };
            }
        }

        let name_end = action
            .char_indices()
            .find(|&(_, c)| !is_ident_char(c))
            .map_or(action.len(), |(i, _)| i);
        if name_end == 0 {
            return ParsedDirective::Unparseable;
        }

        let (name, rest) = action.split_at(name_end);
        let Some(body) = rest.strip_prefix('[') else {
            return ParsedDirective::Unparseable;
        };
        // Argument runs to the last `]`, so nested brackets survive intact.
        match body.rfind(']') {
            Some(close) => ParsedDirective::ToolCall {
                name: name.to_string(),
                argument: body[..close].to_string(),
            },
            None => ParsedDirective::Unparseable,
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Thought section: from `Thought:` up to the first `Action:` (or end).
fn parse_thought(text: &str, action_at: Option<usize>) -> Option<String> {
    let scope = action_at.map_or(text, |at| &text[..at]);
    let start = scope.find(THOUGHT_MARKER)? + THOUGHT_MARKER.len();
    Some(scope[start..].trim().to_string())
}

/// Cut the reply right before the first Thought/Action/Observation marker
/// that opens a new section after the first `Action:`.
///
/// A marker opens a section when it leads its line, or when it follows a
/// closed directive on the same line (`Search[x] Thought: ...`). Markers
/// inside an open bracket on the same line stay part of the argument.
///
/// Returns the kept prefix and whether anything was dropped.
fn first_pair(raw: &str) -> (&str, bool) {
    let Some(action_at) = raw.find(ACTION_MARKER) else {
        return (raw, false);
    };
    let body_start = action_at + ACTION_MARKER.len();
    let body = &raw[body_start..];

    let mut markers: Vec<usize> = [THOUGHT_MARKER, ACTION_MARKER, OBSERVATION_MARKER]
        .iter()
        .flat_map(|marker| body.match_indices(marker).map(|(at, _)| at))
        .collect();
    markers.sort_unstable();

    markers
        .into_iter()
        .find(|&at| opens_section(&body[..at]))
        .map_or((raw, false), |at| (&raw[..body_start + at], true))
}

/// `before` is the Action body up to a marker.
fn opens_section(before: &str) -> bool {
    let head = before.trim_end();
    before[head.len()..].contains('\n') || head.ends_with(']')
}
