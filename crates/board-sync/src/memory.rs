//! In-process board backend
//!
//! Holds one project's board in memory and applies writes the way the real
//! server does: the task's status is replaced verbatim, the task is placed at
//! the requested lane index and the board is returned on the next fetch.
//! Individual writes can be delayed or failed through a script, and fetches
//! can be failed one at a time. The simulator and the integration tests use
//! both to stage races.

use crate::error::RemoteError;
use crate::permission::{DefaultMovePolicy, MovePolicy, ProjectRole};
use crate::remote::{BoardBackend, TaskUpdate};
use async_trait::async_trait;
use board_model::{BoardColumns, BoardSnapshot, ProjectId, Task, TaskId, Version};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Scripted behaviour for one `update_task` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateStep {
    /// Latency before the server answers
    pub delay: Duration,
    /// Failure to answer with instead of applying the write
    pub failure: Option<RemoteError>,
}

impl UpdateStep {
    #[must_use]
    pub fn ok() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn fail(error: RemoteError) -> Self {
        Self {
            delay: Duration::ZERO,
            failure: Some(error),
        }
    }

    #[inline]
    #[must_use]
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Board server held in memory
#[derive(Debug)]
pub struct InMemoryBackend {
    project: ProjectId,
    board: Mutex<BoardSnapshot>,
    script: Mutex<VecDeque<UpdateStep>>,
    fetch_failures: Mutex<VecDeque<RemoteError>>,
    caller_role: Mutex<Option<ProjectRole>>,
    fetch_delay: Mutex<Duration>,
    fetches: AtomicUsize,
    updates: AtomicUsize,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new(project: ProjectId, board: BoardSnapshot) -> Self {
        Self {
            project,
            board: Mutex::new(board),
            script: Mutex::new(VecDeque::new()),
            fetch_failures: Mutex::new(VecDeque::new()),
            caller_role: Mutex::new(None),
            fetch_delay: Mutex::new(Duration::ZERO),
            fetches: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
        }
    }

    #[inline]
    #[must_use]
    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    /// Copy of the server's board
    #[must_use]
    pub fn board(&self) -> BoardSnapshot {
        self.board.lock().clone()
    }

    /// Change the server's board directly, as another client would
    pub fn mutate<R>(&self, change: impl FnOnce(&mut BoardSnapshot) -> R) -> R {
        change(&mut self.board.lock())
    }

    /// Queue behaviour for the next unscripted `update_task` call
    pub fn script_update(&self, step: UpdateStep) {
        self.script.lock().push_back(step);
    }

    /// Fail the next write with `error`
    pub fn fail_next_update(&self, error: RemoteError) {
        self.script_update(UpdateStep::fail(error));
    }

    /// Fail the next unscripted `fetch_board` call with `error`. Queued
    /// failures are used up one fetch at a time.
    pub fn fail_next_fetch(&self, error: RemoteError) {
        self.fetch_failures.lock().push_back(error);
    }

    /// Role the server checks moves against. `None` skips the check.
    pub fn set_caller_role(&self, role: Option<ProjectRole>) {
        *self.caller_role.lock() = role;
    }

    /// Latency of every fetch
    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock() = delay;
    }

    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn apply(&self, task_id: TaskId, update: &TaskUpdate) -> Result<Task, RemoteError> {
        if update.is_move() {
            let role = self.caller_role.lock().clone();
            if let Some(role) = role {
                if !DefaultMovePolicy.can_move_task(&role) {
                    return Err(RemoteError::Forbidden(format!("role {role} may not move tasks")));
                }
            }
        }
        if update.status.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(RemoteError::Validation("status must not be empty".to_string()));
        }

        let mut board = self.board.lock();
        if update.is_move() {
            relocate(&mut board, task_id, update)?;
        }

        let task = board
            .task_mut(task_id)
            .ok_or_else(|| RemoteError::NotFound(format!("task {task_id}")))?;
        update.fields.apply_to(task);
        Ok(task.clone())
    }
}

fn relocate(board: &mut BoardSnapshot, task_id: TaskId, update: &TaskUpdate) -> Result<(), RemoteError> {
    let location = board
        .locate(task_id)
        .ok_or_else(|| RemoteError::NotFound(format!("task {task_id} is not on an active sprint")))?;
    let sprint = &mut board.active_sprints[location.sprint];

    let mut task = sprint.tasks.remove(location.index);
    if let Some(status) = &update.status {
        task.raw_status.clone_from(status);
    }

    let mut columns = BoardColumns::partition(&sprint.tasks);
    let lane = columns.get_mut(task.column());
    let index = update.position.map_or(lane.len(), |p| p.min(lane.len()));
    lane.insert(index, task);
    sprint.tasks = columns.into_tasks();
    Ok(())
}

#[async_trait]
impl BoardBackend for InMemoryBackend {
    async fn fetch_board(&self, project: &ProjectId) -> Result<BoardSnapshot, RemoteError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let delay = *self.fetch_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.fetch_failures.lock().pop_front() {
            tracing::debug!(project = %project, %error, "scripted fetch failure");
            return Err(error);
        }
        if *project != self.project {
            return Err(RemoteError::NotFound(format!("project {project}")));
        }
        Ok(self.board().with_version(Version::ZERO))
    }

    async fn update_task(&self, task_id: TaskId, update: &TaskUpdate) -> Result<Task, RemoteError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().pop_front().unwrap_or_default();
        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }

        if let Some(error) = step.failure {
            tracing::debug!(task = %task_id, %error, "scripted write failure");
            return Err(error);
        }
        self.apply(task_id, update)
    }
}
