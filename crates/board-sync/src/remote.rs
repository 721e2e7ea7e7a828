//! Collaborator interfaces
//!
//! The engine talks to the outside world through two traits:
//! - [`BoardBackend`]: fetch a board, write a task
//! - [`Notifier`]: fire-and-forget user notices
//!
//! Neither assumes a transport.

use crate::error::RemoteError;
use async_trait::async_trait;
use board_model::{BoardSnapshot, ProjectId, Task, TaskId, TaskPatch};
use board_planner::MovePlan;
use serde::{Deserialize, Serialize};

/// Body of a task write.
///
/// For moves, `status` is only set when the task changed lanes, and
/// `position` is the index inside the destination lane. The server decides
/// the final order; `position` is a hint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    #[serde(flatten)]
    pub fields: TaskPatch,
}

impl TaskUpdate {
    /// Update for a planned move
    #[must_use]
    pub fn for_move(plan: &MovePlan) -> Self {
        Self {
            status: plan
                .status_changed
                .then(|| plan.landed.column.as_status().to_string()),
            position: Some(plan.landed.index),
            fields: TaskPatch::default(),
        }
    }

    /// Update for an inline edit
    #[must_use]
    pub fn for_edit(patch: &TaskPatch) -> Self {
        Self {
            status: None,
            position: None,
            fields: patch.clone(),
        }
    }

    /// Whether the update relocates the task
    #[inline]
    #[must_use]
    pub fn is_move(&self) -> bool {
        self.status.is_some() || self.position.is_some()
    }
}

/// Server-side board resource
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BoardBackend: Send + Sync {
    /// Fetch the full board of a project
    async fn fetch_board(&self, project: &ProjectId) -> Result<BoardSnapshot, RemoteError>;

    /// Write a task; the server is the sole arbiter of the result
    async fn update_task(&self, task_id: TaskId, update: &TaskUpdate) -> Result<Task, RemoteError>;
}

/// Kind of notice shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
    Conflict,
}

/// Presentation of user notices.
///
/// Must return promptly; reconciliation calls it inline.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, kind: NoticeKind);
}

/// Notifier that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, kind: NoticeKind) {
        match kind {
            NoticeKind::Success => tracing::info!(notice = message, "board notice"),
            NoticeKind::Error | NoticeKind::Conflict => {
                tracing::warn!(notice = message, ?kind, "board notice");
            }
        }
    }
}
