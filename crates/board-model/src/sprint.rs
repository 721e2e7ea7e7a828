//! Sprints

use crate::task::Task;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned sprint identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SprintId(pub u64);

impl fmt::Display for SprintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sprint lifecycle state.
///
/// Unknown server values are kept verbatim rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SprintStatus {
    Planning,
    #[default]
    Active,
    Completed,
    Other(String),
}

impl From<String> for SprintStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "planning" | "planned" => Self::Planning,
            "active" => Self::Active,
            "completed" | "closed" => Self::Completed,
            _ => Self::Other(raw),
        }
    }
}

impl From<SprintStatus> for String {
    fn from(status: SprintStatus) -> Self {
        match status {
            SprintStatus::Planning => "planning".to_string(),
            SprintStatus::Active => "active".to_string(),
            SprintStatus::Completed => "completed".to_string(),
            SprintStatus::Other(raw) => raw,
        }
    }
}

/// A sprint and its ordered tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprint {
    pub id: SprintId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: SprintStatus,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Sprint {
    /// Create an active sprint
    #[must_use]
    pub fn new(id: u64, tasks: Vec<Task>) -> Self {
        Self {
            id: SprintId(id),
            name: String::new(),
            status: SprintStatus::Active,
            tasks,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: SprintStatus) -> Self {
        self.status = status;
        self
    }
}
