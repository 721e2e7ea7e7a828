//! Board fetching and revalidation
//!
//! Fetches write through [`BoardCache::begin_fetch`] /
//! [`BoardCache::complete_fetch`], so a fetch that was overtaken by an
//! optimistic write, or that lands while writes are unsettled, drops its
//! result instead of clobbering them.
//! Background revalidations are tracked per project so they can be aborted
//! or awaited.

use crate::cache::BoardCache;
use crate::error::RemoteError;
use crate::remote::BoardBackend;
use board_model::{ProjectId, Version};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Fetch coordinator for the cache
pub struct Fetcher {
    backend: Arc<dyn BoardBackend>,
    cache: Arc<BoardCache>,
    in_flight: Mutex<HashMap<ProjectId, Vec<JoinHandle<()>>>>,
}

impl Fetcher {
    #[must_use]
    pub fn new(backend: Arc<dyn BoardBackend>, cache: Arc<BoardCache>) -> Self {
        Self {
            backend,
            cache,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// First fetch of a board; installs it unconditionally
    ///
    /// # Errors
    /// Whatever the backend's fetch returns.
    pub async fn load(&self, project: &ProjectId) -> Result<Version, RemoteError> {
        let snapshot = self.backend.fetch_board(project).await?;
        Ok(self.cache.replace(project, snapshot))
    }

    /// Fetch and install the board unless an optimistic write or a
    /// cancellation happened meanwhile.
    ///
    /// Returns the installed version, or `None` if the result was dropped.
    ///
    /// # Errors
    /// Whatever the backend's fetch returns.
    pub async fn refresh(&self, project: &ProjectId) -> Result<Option<Version>, RemoteError> {
        let Some(ticket) = self.cache.begin_fetch(project) else {
            return Ok(None);
        };

        let snapshot = self.backend.fetch_board(project).await?;
        let installed = self.cache.complete_fetch(project, ticket, snapshot);
        match installed {
            Some(version) => tracing::debug!(project = %project, %version, "board refreshed"),
            None => tracing::debug!(project = %project, "dropped fetch overtaken by a local write"),
        }
        Ok(installed)
    }

    /// Refresh in the background
    pub fn revalidate(self: &Arc<Self>, project: &ProjectId) {
        let fetcher = Arc::clone(self);
        let key = project.clone();
        let handle = tokio::spawn(async move {
            if let Err(error) = fetcher.refresh(&key).await {
                tracing::warn!(project = %key, %error, "background revalidation failed");
            }
        });

        let mut in_flight = self.in_flight.lock();
        let handles = in_flight.entry(project.clone()).or_default();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Abort background revalidations for `project` and make any fetch
    /// already past its network call drop its result
    pub fn cancel(&self, project: &ProjectId) -> usize {
        self.cache.cancel_fetches(project);

        let handles = self.in_flight.lock().remove(project).unwrap_or_default();
        let mut aborted = 0;
        for handle in handles {
            if !handle.is_finished() {
                handle.abort();
                aborted += 1;
            }
        }
        if aborted > 0 {
            tracing::debug!(project = %project, aborted, "cancelled in-flight fetches");
        }
        aborted
    }

    /// Wait until no background revalidation for `project` is running
    pub async fn settled(&self, project: &ProjectId) {
        loop {
            let handles = self.in_flight.lock().remove(project).unwrap_or_default();
            if handles.is_empty() {
                return;
            }
            futures::future::join_all(handles).await;
        }
    }

    /// Number of background revalidations started and not yet finished
    #[must_use]
    pub fn pending(&self, project: &ProjectId) -> usize {
        self.in_flight
            .lock()
            .get(project)
            .map_or(0, |handles| handles.iter().filter(|h| !h.is_finished()).count())
    }
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::remote::MockBoardBackend;
    use board_model::{BoardSnapshot, Sprint, Task};

    fn project() -> ProjectId {
        ProjectId::new("alpha")
    }

    fn board(status: &str) -> BoardSnapshot {
        BoardSnapshot::new(vec![Sprint::new(1, vec![Task::new(1, status)])], vec![])
    }

    fn fetcher(backend: MockBoardBackend) -> (Arc<Fetcher>, Arc<BoardCache>) {
        let cache = Arc::new(BoardCache::new(Arc::new(ManualClock::starting_at(10))));
        let fetcher = Arc::new(Fetcher::new(Arc::new(backend), Arc::clone(&cache)));
        (fetcher, cache)
    }

    #[tokio::test]
    async fn load_installs_board() {
        let mut backend = MockBoardBackend::new();
        backend
            .expect_fetch_board()
            .times(1)
            .returning(|_| Ok(board("todo")));

        let (fetcher, cache) = fetcher(backend);
        let version = fetcher.load(&project()).await.unwrap();

        assert_eq!(cache.current_version(&project()), Some(version));
    }

    #[tokio::test]
    async fn refresh_of_unknown_board_is_a_noop() {
        let mut backend = MockBoardBackend::new();
        backend.expect_fetch_board().never();

        let (fetcher, _cache) = fetcher(backend);
        assert_eq!(fetcher.refresh(&project()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn refresh_propagates_fetch_errors() {
        let mut backend = MockBoardBackend::new();
        backend
            .expect_fetch_board()
            .returning(|_| Err(RemoteError::Transport("down".to_string())));

        let (fetcher, cache) = fetcher(backend);
        cache.replace(&project(), board("todo"));

        let err = fetcher.refresh(&project()).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn revalidate_runs_in_background_and_settles() {
        let mut backend = MockBoardBackend::new();
        backend
            .expect_fetch_board()
            .times(1)
            .returning(|_| Ok(board("done")));

        let (fetcher, cache) = fetcher(backend);
        cache.replace(&project(), board("todo"));

        fetcher.revalidate(&project());
        fetcher.settled(&project()).await;

        let snapshot = cache.snapshot(&project()).unwrap();
        assert_eq!(snapshot.active_sprints[0].tasks[0].raw_status, "done");
        assert_eq!(fetcher.pending(&project()), 0);
    }
}
