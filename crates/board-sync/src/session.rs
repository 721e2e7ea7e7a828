//! Board session
//!
//! Handle to one open project board. Created by [`crate::SyncEngine::open`],
//! which loads the board into the cache; [`BoardSession::close`] (or drop)
//! stops polling, aborts fetches and evicts the board.
//!
//! Reads always come from the cache and never block on the network.

use crate::cache::BoardCache;
use crate::error::SyncError;
use crate::fetch::Fetcher;
use crate::mutator::{OptimisticMutator, WriteOutcome};
use crate::permission::ProjectRole;
use board_model::{
    BoardColumns, BoardSnapshot, CanonicalColumn, ProjectId, SprintId, TaskId, TaskPatch, Version,
};
use board_planner::{MoveRequest, Position};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// One open project board
#[derive(Debug)]
pub struct BoardSession {
    project: ProjectId,
    cache: Arc<BoardCache>,
    fetcher: Arc<Fetcher>,
    mutator: Arc<OptimisticMutator>,
    role: RwLock<Option<ProjectRole>>,
    poller: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl BoardSession {
    pub(crate) fn new(
        project: ProjectId,
        cache: Arc<BoardCache>,
        fetcher: Arc<Fetcher>,
        mutator: Arc<OptimisticMutator>,
    ) -> Self {
        Self {
            project,
            cache,
            fetcher,
            mutator,
            role: RwLock::new(None),
            poller: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    #[inline]
    #[must_use]
    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    /// Record the caller's role once membership data has loaded
    pub fn set_role(&self, role: Option<ProjectRole>) {
        *self.role.write() = role;
    }

    #[must_use]
    pub fn role(&self) -> Option<ProjectRole> {
        self.role.read().clone()
    }

    /// Move a task by its drag coordinates and wait for the write to settle.
    ///
    /// The cache reflects the move before this function first suspends.
    ///
    /// # Errors
    /// Pre-flight failures only; see [`OptimisticMutator::move_task`].
    pub async fn move_task(
        &self,
        task_id: TaskId,
        source_column: CanonicalColumn,
        source_index: usize,
        dest_column: CanonicalColumn,
        dest_index: usize,
    ) -> Result<WriteOutcome, SyncError> {
        let request = MoveRequest::new(
            task_id,
            Position::new(source_column, source_index),
            Position::new(dest_column, dest_index),
        );
        self.submit_move(&request).await
    }

    /// [`BoardSession::move_task`] with a prepared request
    ///
    /// # Errors
    /// As [`BoardSession::move_task`], plus `SyncError::SessionClosed`.
    pub async fn submit_move(&self, request: &MoveRequest) -> Result<WriteOutcome, SyncError> {
        self.ensure_open()?;
        let role = self.role();
        self.mutator
            .move_task(&self.project, role.as_ref(), request)
            .await
    }

    /// Change a task's fields and wait for the write to settle
    ///
    /// # Errors
    /// Pre-flight failures only; see [`OptimisticMutator::edit_task`].
    pub async fn edit_task(&self, task_id: TaskId, patch: &TaskPatch) -> Result<WriteOutcome, SyncError> {
        self.ensure_open()?;
        self.mutator.edit_task(&self.project, task_id, patch).await
    }

    /// Fetch the board now, unless a write overtakes the fetch
    ///
    /// # Errors
    /// `SyncError::Fetch` if the backend fails; the cache keeps its snapshot.
    pub async fn refresh(&self) -> Result<Option<Version>, SyncError> {
        self.ensure_open()?;
        Ok(self.fetcher.refresh(&self.project).await?)
    }

    /// Wait for background revalidations to finish
    pub async fn settled(&self) {
        self.fetcher.settled(&self.project).await;
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<BoardSnapshot> {
        self.cache.snapshot(&self.project)
    }

    /// Lanes across every active sprint
    #[must_use]
    pub fn columns(&self) -> Option<BoardColumns> {
        self.snapshot().map(|s| s.all_columns())
    }

    /// Lanes of one active sprint
    #[must_use]
    pub fn sprint_columns(&self, sprint: SprintId) -> Option<BoardColumns> {
        self.snapshot().and_then(|s| s.columns(sprint))
    }

    #[must_use]
    pub fn is_provisional(&self) -> bool {
        self.cache.is_provisional(&self.project)
    }

    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.cache.is_stale(&self.project)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Revalidate the board every `interval`, replacing any previous poller.
    ///
    /// Ticks are skipped while a write is provisional. Must be called inside
    /// a tokio runtime.
    pub fn start_polling(&self, interval: Duration) {
        if interval.is_zero() {
            tracing::warn!(project = %self.project, "ignoring zero polling interval");
            return;
        }
        if self.is_closed() {
            return;
        }

        let project = self.project.clone();
        let cache = Arc::clone(&self.cache);
        let fetcher = Arc::clone(&self.fetcher);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // first tick completes immediately; the board was just loaded
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if !cache.contains(&project) {
                    break;
                }
                if cache.is_provisional(&project) {
                    tracing::debug!(project = %project, "poll skipped, write in flight");
                    continue;
                }
                if let Err(error) = fetcher.refresh(&project).await {
                    tracing::warn!(project = %project, %error, "poll failed");
                }
            }
        });

        if let Some(previous) = self.poller.lock().replace(handle) {
            previous.abort();
        }
        tracing::info!(project = %self.project, ?interval, "polling started");
    }

    /// Stop the poller, if any
    pub fn stop_polling(&self) {
        if let Some(handle) = self.poller.lock().take() {
            handle.abort();
            tracing::info!(project = %self.project, "polling stopped");
        }
    }

    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.poller
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop polling, abort fetches and evict the board. Idempotent.
    ///
    /// Writes already sent still settle; they find no board and are
    /// discarded.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.stop_polling();
        self.fetcher.cancel(&self.project);
        self.cache.evict(&self.project);
        tracing::info!(project = %self.project, "board closed");
    }

    fn ensure_open(&self) -> Result<(), SyncError> {
        if self.is_closed() {
            Err(SyncError::SessionClosed)
        } else {
            Ok(())
        }
    }
}

impl Drop for BoardSession {
    fn drop(&mut self) {
        self.close();
    }
}
