//! Tasks as the board caches them

use crate::column::CanonicalColumn;
use crate::status;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned task identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// Person a task is assigned to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignee {
    pub id: u64,
    pub name: String,
}

impl Assignee {
    #[inline]
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A task card.
///
/// `raw_status` is the only status of record. Column membership is derived
/// through [`Task::column`] and never stored alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "status")]
    pub raw_status: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Assignee>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,
    #[serde(default)]
    pub archived: bool,
}

impl Task {
    /// Create a task with default priority and no assignee
    #[must_use]
    pub fn new(id: u64, raw_status: impl Into<String>) -> Self {
        Self {
            id: TaskId(id),
            title: String::new(),
            raw_status: raw_status.into(),
            priority: Priority::default(),
            assignee: None,
            story_points: None,
            archived: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_assignee(mut self, assignee: Assignee) -> Self {
        self.assignee = Some(assignee);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_story_points(mut self, points: u32) -> Self {
        self.story_points = Some(points);
        self
    }

    /// Column this task renders in
    #[inline]
    #[must_use]
    pub fn column(&self) -> CanonicalColumn {
        status::normalize(&self.raw_status)
    }

    /// Relabel the task into `column`, rewriting its status of record
    pub fn set_column(&mut self, column: CanonicalColumn) {
        self.raw_status = column.as_status().to_string();
    }
}

/// Inline field edit.
///
/// `None` leaves a field alone. For the optional fields, `Some(None)` clears
/// the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Option<Assignee>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_points: Option<Option<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

impl TaskPatch {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    #[inline]
    #[must_use]
    pub fn assignee(mut self, assignee: Option<Assignee>) -> Self {
        self.assignee = Some(assignee);
        self
    }

    #[inline]
    #[must_use]
    pub fn story_points(mut self, points: Option<u32>) -> Self {
        self.story_points = Some(points);
        self
    }

    #[inline]
    #[must_use]
    pub fn archived(mut self, archived: bool) -> Self {
        self.archived = Some(archived);
        self
    }

    /// Whether the patch changes nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.priority.is_none()
            && self.assignee.is_none()
            && self.story_points.is_none()
            && self.archived.is_none()
    }

    /// Apply the patch in place
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title.clone_from(title);
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(assignee) = &self.assignee {
            task.assignee.clone_from(assignee);
        }
        if let Some(points) = self.story_points {
            task.story_points = points;
        }
        if let Some(archived) = self.archived {
            task.archived = archived;
        }
    }
}
