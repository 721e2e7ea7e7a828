//! Optimistic mutator
//!
//! The only writer of the board cache. Every write follows the same
//! protocol:
//! 1. Pre-flight checks (permission gate for moves)
//! 2. Plan the change against a deep copy of the snapshot and install it,
//!    stamped and provisional, cancelling in-flight fetches
//! 3. Send the write to the backend
//! 4. Settle: commit on success, hand failures to the [`ConflictDetector`]
//! 5. Refetch the board, whatever happened
//!
//! Steps 1-2 are synchronous, so the user sees the change before any network
//! latency. A write, once sent, is always settled; it is never abandoned.

use crate::cache::{BoardCache, RollbackContext};
use crate::conflict::{ConflictDetector, Settlement};
use crate::error::{RemoteError, SyncError};
use crate::fetch::Fetcher;
use crate::permission::{PermissionGate, ProjectRole};
use crate::remote::{BoardBackend, NoticeKind, Notifier, TaskUpdate};
use board_model::{ModelError, ProjectId, Task, TaskId, TaskPatch, Version};
use board_planner::{MovePlan, MovePlanner, MoveRequest, Position};
use std::fmt;
use std::sync::Arc;

/// What a pending write does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteKind {
    /// Drag-and-drop move
    Move {
        request: MoveRequest,
        landed: Position,
    },
    /// Inline field edit
    Edit { patch: TaskPatch },
}

impl WriteKind {
    fn success_message(&self, task_id: TaskId) -> String {
        match self {
            Self::Move { landed, .. } => format!("Task {task_id} moved to {}", landed.column),
            Self::Edit { .. } => format!("Task {task_id} updated"),
        }
    }
}

/// A write applied to the cache but not yet settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    /// Undo information, including the stamped version
    pub context: RollbackContext,
    /// Task being written
    pub task_id: TaskId,
    /// Body sent to the backend
    pub update: TaskUpdate,
    /// Move or edit
    pub kind: WriteKind,
}

impl PendingWrite {
    /// Version this write stamped on the cache
    #[inline]
    #[must_use]
    pub fn version(&self) -> Version {
        self.context.stamped
    }

    #[inline]
    #[must_use]
    pub fn project(&self) -> &ProjectId {
        &self.context.project
    }
}

/// How a write settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Server accepted the write
    Committed { task: Task, version: Version },
    /// Write failed; the pre-write snapshot was restored
    RolledBack { error: RemoteError },
    /// Write failed after newer state landed. The entry is flagged stale
    /// and refetched at once, unless another write is still pending; then
    /// the refetch that follows the last of them replaces it.
    Superseded { error: RemoteError },
    /// Write settled after the board was closed
    Discarded { error: RemoteError },
}

impl WriteOutcome {
    #[inline]
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    /// The write's error, if it failed
    #[must_use]
    pub fn error(&self) -> Option<&RemoteError> {
        match self {
            Self::Committed { .. } => None,
            Self::RolledBack { error } | Self::Superseded { error } | Self::Discarded { error } => {
                Some(error)
            }
        }
    }
}

/// Sole writer of the board cache
pub struct OptimisticMutator {
    cache: Arc<BoardCache>,
    fetcher: Arc<Fetcher>,
    backend: Arc<dyn BoardBackend>,
    notifier: Arc<dyn Notifier>,
    gate: PermissionGate,
    detector: ConflictDetector,
    planner: MovePlanner,
    notify_on_success: bool,
}

impl OptimisticMutator {
    #[must_use]
    pub fn new(
        cache: Arc<BoardCache>,
        fetcher: Arc<Fetcher>,
        backend: Arc<dyn BoardBackend>,
        notifier: Arc<dyn Notifier>,
        gate: PermissionGate,
        detector: ConflictDetector,
    ) -> Self {
        Self {
            cache,
            fetcher,
            backend,
            notifier,
            gate,
            detector,
            planner: MovePlanner::new(),
            notify_on_success: false,
        }
    }

    /// With success notices
    #[inline]
    #[must_use]
    pub fn with_success_notices(mut self, enabled: bool) -> Self {
        self.notify_on_success = enabled;
        self
    }

    /// Move a task and settle the write.
    ///
    /// # Errors
    /// Only pre-flight failures, all of which leave the cache untouched:
    /// - `SyncError::PermissionDenied` if the gate rejects `role`
    /// - `SyncError::BoardNotLoaded` if the board is not cached
    /// - `SyncError::Model` if the task is not on an active sprint
    /// - `SyncError::Plan` if the drag coordinates are stale
    pub async fn move_task(
        &self,
        project: &ProjectId,
        role: Option<&ProjectRole>,
        request: &MoveRequest,
    ) -> Result<WriteOutcome, SyncError> {
        let pending = self.begin_move(project, role, request)?;
        Ok(self.send(pending).await)
    }

    /// Edit a task's fields and settle the write.
    ///
    /// # Errors
    /// - `SyncError::EmptyPatch` if the patch changes nothing
    /// - `SyncError::BoardNotLoaded` if the board is not cached
    /// - `SyncError::Model` if the task is not on the board
    pub async fn edit_task(
        &self,
        project: &ProjectId,
        task_id: TaskId,
        patch: &TaskPatch,
    ) -> Result<WriteOutcome, SyncError> {
        let pending = self.begin_edit(project, task_id, patch)?;
        Ok(self.send(pending).await)
    }

    /// Synchronous half of a move: gate, plan, install.
    ///
    /// # Errors
    /// As [`OptimisticMutator::move_task`].
    pub fn begin_move(
        &self,
        project: &ProjectId,
        role: Option<&ProjectRole>,
        request: &MoveRequest,
    ) -> Result<PendingWrite, SyncError> {
        if let Err(denied) = self.gate.check(role) {
            tracing::info!(project = %project, task = %request.task_id, %denied, "move blocked");
            self.notifier
                .notify("You don't have permission to move tasks", NoticeKind::Error);
            return Err(denied);
        }

        let planner = self.planner;
        let (context, plan) = self.cache.apply_optimistic(project, |snapshot| {
            let location = snapshot
                .locate(request.task_id)
                .ok_or(ModelError::TaskNotFound(request.task_id))?;
            let sprint = &mut snapshot.active_sprints[location.sprint];
            let plan: MovePlan = planner.plan_request(&sprint.tasks, request)?;
            sprint.tasks.clone_from(&plan.tasks);
            Ok(plan)
        })?;
        self.fetcher.cancel(project);

        tracing::info!(
            project = %project,
            task = %request.task_id,
            from = %request.from,
            to = %plan.landed,
            version = %context.stamped,
            "applied optimistic move"
        );

        Ok(PendingWrite {
            context,
            task_id: request.task_id,
            update: TaskUpdate::for_move(&plan),
            kind: WriteKind::Move {
                request: *request,
                landed: plan.landed,
            },
        })
    }

    /// Synchronous half of an edit.
    ///
    /// # Errors
    /// As [`OptimisticMutator::edit_task`].
    pub fn begin_edit(
        &self,
        project: &ProjectId,
        task_id: TaskId,
        patch: &TaskPatch,
    ) -> Result<PendingWrite, SyncError> {
        if patch.is_empty() {
            return Err(SyncError::EmptyPatch(task_id));
        }

        let (context, ()) = self.cache.apply_optimistic(project, |snapshot| {
            let task = snapshot
                .task_mut(task_id)
                .ok_or(ModelError::TaskNotFound(task_id))?;
            patch.apply_to(task);
            Ok(())
        })?;
        self.fetcher.cancel(project);

        tracing::info!(
            project = %project,
            task = %task_id,
            version = %context.stamped,
            "applied optimistic edit"
        );

        Ok(PendingWrite {
            context,
            task_id,
            update: TaskUpdate::for_edit(patch),
            kind: WriteKind::Edit {
                patch: patch.clone(),
            },
        })
    }

    /// Send a pending write and settle it
    pub async fn send(&self, pending: PendingWrite) -> WriteOutcome {
        let result = self.backend.update_task(pending.task_id, &pending.update).await;
        self.settle(pending, result).await
    }

    /// Reconcile a pending write with the backend's answer, then refetch.
    ///
    /// Never fails: whichever branch runs, the cache ends holding a valid
    /// snapshot and a refetch has been issued.
    pub async fn settle(&self, pending: PendingWrite, result: Result<Task, RemoteError>) -> WriteOutcome {
        let project = pending.project().clone();

        match result {
            Ok(task) => {
                let version = pending.version();
                let confirmed = self.cache.commit(&project, version);
                tracing::info!(
                    project = %project,
                    task = %pending.task_id,
                    %version,
                    confirmed,
                    "write committed"
                );
                if self.notify_on_success {
                    self.notifier
                        .notify(&pending.kind.success_message(pending.task_id), NoticeKind::Success);
                }
                self.fetcher.revalidate(&project);
                WriteOutcome::Committed { task, version }
            }
            Err(error) => {
                let settlement =
                    self.detector
                        .on_failure(&self.cache, self.notifier.as_ref(), &error, &pending.context);
                match settlement {
                    Settlement::RolledBack => {
                        self.fetcher.revalidate(&project);
                        WriteOutcome::RolledBack { error }
                    }
                    Settlement::Superseded => {
                        match self.fetcher.refresh(&project).await {
                            Ok(Some(_)) => {}
                            Ok(None) => tracing::debug!(
                                project = %project,
                                pending = self.cache.pending_writes(&project),
                                "refetch after superseded write deferred until pending writes settle"
                            ),
                            Err(fetch_error) => tracing::warn!(
                                project = %project,
                                error = %fetch_error,
                                "refetch after superseded write failed, board left stale"
                            ),
                        }
                        WriteOutcome::Superseded { error }
                    }
                    Settlement::Closed => WriteOutcome::Discarded { error },
                }
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn detector(&self) -> &ConflictDetector {
        &self.detector
    }
}

impl fmt::Debug for OptimisticMutator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimisticMutator")
            .field("cache", &self.cache)
            .field("detector", &self.detector)
            .field("notify_on_success", &self.notify_on_success)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::permission::MockMovePolicy;
    use crate::remote::{MockBoardBackend, MockNotifier};
    use board_model::CanonicalColumn::{InProgress, ToDo};
    use board_model::{BoardSnapshot, Sprint};
    use pretty_assertions::assert_eq;

    fn project() -> ProjectId {
        ProjectId::new("alpha")
    }

    fn board() -> BoardSnapshot {
        BoardSnapshot::new(vec![Sprint::new(1, vec![Task::new(101, "todo")])], vec![])
    }

    fn mutator(
        backend: MockBoardBackend,
        notifier: MockNotifier,
        policy: MockMovePolicy,
    ) -> (OptimisticMutator, Arc<BoardCache>) {
        let cache = Arc::new(BoardCache::new(Arc::new(ManualClock::starting_at(1_000))));
        let backend: Arc<dyn BoardBackend> = Arc::new(backend);
        let fetcher = Arc::new(Fetcher::new(Arc::clone(&backend), Arc::clone(&cache)));
        let mutator = OptimisticMutator::new(
            Arc::clone(&cache),
            fetcher,
            backend,
            Arc::new(notifier),
            PermissionGate::new(Arc::new(policy)),
            ConflictDetector::new(2_000),
        );
        cache.replace(&project(), board());
        (mutator, cache)
    }

    fn drag_101() -> MoveRequest {
        MoveRequest::new(TaskId(101), Position::new(ToDo, 0), Position::new(InProgress, 0))
    }

    #[tokio::test]
    async fn denied_move_never_reaches_cache_or_network() {
        let mut backend = MockBoardBackend::new();
        backend.expect_update_task().never();
        backend.expect_fetch_board().never();

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|_, kind| *kind == NoticeKind::Error)
            .times(1)
            .return_const(());

        let mut policy = MockMovePolicy::new();
        policy.expect_can_move_task().return_const(false);

        let (mutator, cache) = mutator(backend, notifier, policy);
        let before = cache.entry(&project()).unwrap();

        let err = mutator
            .move_task(&project(), Some(&ProjectRole::Viewer), &drag_101())
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::PermissionDenied { .. }));
        assert_eq!(cache.entry(&project()).unwrap(), before);
    }

    #[tokio::test]
    async fn begin_move_is_visible_immediately() {
        let (mutator, cache) = mutator(
            MockBoardBackend::new(),
            MockNotifier::new(),
            MockMovePolicy::new(),
        );

        let pending = mutator.begin_move(&project(), None, &drag_101()).unwrap();

        let columns = cache.snapshot(&project()).unwrap().all_columns();
        assert!(columns.ids(ToDo).is_empty());
        assert_eq!(columns.ids(InProgress), vec![TaskId(101)]);
        assert_eq!(pending.update.status.as_deref(), Some("IN_PROGRESS"));
        assert_eq!(pending.update.position, Some(0));
        assert!(cache.is_provisional(&project()));
    }

    #[tokio::test]
    async fn stale_drag_is_rejected_without_mutation() {
        let (mutator, cache) = mutator(
            MockBoardBackend::new(),
            MockNotifier::new(),
            MockMovePolicy::new(),
        );
        let before = cache.entry(&project()).unwrap();

        let request =
            MoveRequest::new(TaskId(101), Position::new(InProgress, 0), Position::new(ToDo, 0));
        let err = mutator.begin_move(&project(), None, &request).unwrap_err();

        assert!(matches!(err, SyncError::Plan(_)));
        assert_eq!(cache.entry(&project()).unwrap(), before);
    }

    #[tokio::test]
    async fn unknown_task_is_rejected() {
        let (mutator, _cache) = mutator(
            MockBoardBackend::new(),
            MockNotifier::new(),
            MockMovePolicy::new(),
        );

        let request = MoveRequest::new(TaskId(7), Position::new(ToDo, 0), Position::new(ToDo, 1));
        let err = mutator.begin_move(&project(), None, &request).unwrap_err();

        assert!(matches!(err, SyncError::Model(ModelError::TaskNotFound(TaskId(7)))));
    }

    #[tokio::test]
    async fn empty_edit_is_rejected() {
        let (mutator, _cache) = mutator(
            MockBoardBackend::new(),
            MockNotifier::new(),
            MockMovePolicy::new(),
        );

        let err = mutator
            .begin_edit(&project(), TaskId(101), &TaskPatch::new())
            .unwrap_err();
        assert!(matches!(err, SyncError::EmptyPatch(TaskId(101))));
    }

    #[tokio::test]
    async fn success_notice_when_enabled() {
        let mut backend = MockBoardBackend::new();
        backend
            .expect_update_task()
            .times(1)
            .returning(|id, _| Ok(Task::new(id.0, "IN_PROGRESS")));
        backend.expect_fetch_board().returning(|_| Ok(board()));

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|message, kind| *kind == NoticeKind::Success && message.contains("IN_PROGRESS"))
            .times(1)
            .return_const(());

        let (mutator, cache) = mutator(backend, notifier, MockMovePolicy::new());
        let mutator = mutator.with_success_notices(true);

        let outcome = mutator.move_task(&project(), None, &drag_101()).await.unwrap();

        assert!(outcome.is_committed());
        assert!(!cache.is_provisional(&project()));
    }
}
