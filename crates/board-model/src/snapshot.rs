//! Board snapshots
//!
//! A [`BoardSnapshot`] is everything the client knows about one project's
//! board at a point in time: the active sprints with their ordered tasks and
//! the backlog. The cache holds exactly one per open project.

use crate::columns::BoardColumns;
use crate::sprint::{Sprint, SprintId};
use crate::task::{Task, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Project identifier, the key a board is cached under
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Locally minted ordering token.
///
/// Versions only order local cache writes against each other. They are never
/// sent to the server and never read from it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(pub u64);

impl Version {
    /// Version of a snapshot that has not been stamped yet
    pub const ZERO: Version = Version(0);

    /// How far `self` is ahead of `earlier` (zero if it is not ahead)
    #[inline]
    #[must_use]
    pub fn ahead_of(self, earlier: Version) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Where a task sits in the active sprints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskLocation {
    /// Index into `active_sprints`
    pub sprint: usize,
    /// Index into that sprint's task list
    pub index: usize,
}

/// The cached board of one project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    #[serde(default)]
    pub active_sprints: Vec<Sprint>,
    #[serde(default)]
    pub backlog_tasks: Vec<Task>,
    #[serde(skip)]
    pub version: Version,
}

impl BoardSnapshot {
    #[must_use]
    pub fn new(active_sprints: Vec<Sprint>, backlog_tasks: Vec<Task>) -> Self {
        Self {
            active_sprints,
            backlog_tasks,
            version: Version::ZERO,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Find a task in the active sprints
    #[must_use]
    pub fn locate(&self, task_id: TaskId) -> Option<TaskLocation> {
        self.active_sprints
            .iter()
            .enumerate()
            .find_map(|(sprint, s)| {
                s.tasks
                    .iter()
                    .position(|t| t.id == task_id)
                    .map(|index| TaskLocation { sprint, index })
            })
    }

    /// Find a task in the active sprints or the backlog
    #[must_use]
    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.active_sprints
            .iter()
            .flat_map(|s| s.tasks.iter())
            .chain(self.backlog_tasks.iter())
            .find(|t| t.id == task_id)
    }

    /// Mutable lookup in the active sprints or the backlog
    pub fn task_mut(&mut self, task_id: TaskId) -> Option<&mut Task> {
        self.active_sprints
            .iter_mut()
            .flat_map(|s| s.tasks.iter_mut())
            .chain(self.backlog_tasks.iter_mut())
            .find(|t| t.id == task_id)
    }

    #[must_use]
    pub fn sprint(&self, sprint_id: SprintId) -> Option<&Sprint> {
        self.active_sprints.iter().find(|s| s.id == sprint_id)
    }

    /// Column view of one active sprint
    #[must_use]
    pub fn columns(&self, sprint_id: SprintId) -> Option<BoardColumns> {
        self.sprint(sprint_id)
            .map(|s| BoardColumns::partition(&s.tasks))
    }

    /// Column view of every active sprint merged, in sprint order
    #[must_use]
    pub fn all_columns(&self) -> BoardColumns {
        let tasks: Vec<Task> = self
            .active_sprints
            .iter()
            .flat_map(|s| s.tasks.iter().cloned())
            .collect();
        BoardColumns::from_tasks(tasks)
    }

    /// Ids of every task on the active sprints, sorted
    #[must_use]
    pub fn active_task_ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self
            .active_sprints
            .iter()
            .flat_map(|s| s.tasks.iter().map(|t| t.id))
            .collect();
        ids.sort_unstable();
        ids
    }
}
