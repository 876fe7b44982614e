//! Trajectory Log
//!
//! Append-only history of actions and observations for a single run,
//! re-rendered into every subsequent prompt.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum TrajectoryEntry {
    Action(String),
    Observation(String),
}

impl TrajectoryEntry {
    pub fn text(&self) -> &str {
        match self {
            Self::Action(text) | Self::Observation(text) => text,
        }
    }
}

impl std::fmt::Display for TrajectoryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Action(text) => write!(f, "Action:{text}"),
            Self::Observation(text) => write!(f, "Observation:{text}"),
        }
    }
}

/// Ordered entries; there is no way to edit or remove one once appended.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrajectoryLog {
    entries: Vec<TrajectoryEntry>,
}

impl TrajectoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: TrajectoryEntry) {
        self.entries.push(entry);
    }

    /// One `Action:{text}` / `Observation:{text}` line per entry.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn entries(&self) -> &[TrajectoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
