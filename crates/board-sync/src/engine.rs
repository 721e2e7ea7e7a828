//! Sync engine
//!
//! Wires the cache, fetcher, permission gate and mutator together around one
//! backend and hands out [`BoardSession`]s.

use crate::cache::BoardCache;
use crate::clock::{Clock, SystemClock};
use crate::config::SyncConfig;
use crate::conflict::ConflictDetector;
use crate::error::SyncError;
use crate::fetch::Fetcher;
use crate::mutator::OptimisticMutator;
use crate::permission::{DefaultMovePolicy, MovePolicy, PermissionGate};
use crate::remote::{BoardBackend, Notifier, TracingNotifier};
use crate::session::BoardSession;
use board_model::ProjectId;
use dashmap::DashSet;
use std::sync::Arc;

/// Entry point: owns the board cache and opens sessions
#[derive(Debug, Clone)]
pub struct SyncEngine {
    config: SyncConfig,
    cache: Arc<BoardCache>,
    fetcher: Arc<Fetcher>,
    mutator: Arc<OptimisticMutator>,
    /// Projects whose initial load is in progress
    opening: Arc<DashSet<ProjectId>>,
}

/// Claim on a project for the length of its initial load
struct OpenReservation<'a> {
    opening: &'a DashSet<ProjectId>,
    project: ProjectId,
}

impl<'a> OpenReservation<'a> {
    fn acquire(opening: &'a DashSet<ProjectId>, project: &ProjectId) -> Option<Self> {
        opening.insert(project.clone()).then(|| Self {
            opening,
            project: project.clone(),
        })
    }
}

impl Drop for OpenReservation<'_> {
    fn drop(&mut self) {
        self.opening.remove(&self.project);
    }
}

impl SyncEngine {
    /// Start building an engine over `backend`
    #[must_use]
    pub fn builder(backend: Arc<dyn BoardBackend>) -> SyncEngineBuilder {
        SyncEngineBuilder::new(backend)
    }

    /// Engine with default configuration, policy and notifier
    #[must_use]
    pub fn new(backend: Arc<dyn BoardBackend>) -> Self {
        Self::builder(backend).build()
    }

    /// Load a project's board and open a session on it.
    ///
    /// Starts polling if the configuration asks for it.
    ///
    /// # Errors
    /// - `SyncError::AlreadyOpen` if a session on the project is open or
    ///   another open of it is still loading
    /// - `SyncError::Fetch` if the initial fetch fails
    pub async fn open(&self, project: ProjectId) -> Result<BoardSession, SyncError> {
        let Some(reservation) = OpenReservation::acquire(&self.opening, &project) else {
            tracing::debug!(project = %project, "open rejected, load already in progress");
            return Err(SyncError::AlreadyOpen(project));
        };
        if self.cache.contains(&project) {
            return Err(SyncError::AlreadyOpen(project));
        }

        let version = self.fetcher.load(&project).await?;
        drop(reservation);
        tracing::info!(project = %project, %version, "board opened");

        let session = BoardSession::new(
            project,
            Arc::clone(&self.cache),
            Arc::clone(&self.fetcher),
            Arc::clone(&self.mutator),
        );
        if let Some(interval) = self.config.poll_interval() {
            session.start_polling(interval);
        }
        Ok(session)
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Shared board cache, for read-only observers
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &Arc<BoardCache> {
        &self.cache
    }

    #[inline]
    #[must_use]
    pub fn mutator(&self) -> &Arc<OptimisticMutator> {
        &self.mutator
    }
}

/// Builder for [`SyncEngine`]
pub struct SyncEngineBuilder {
    backend: Arc<dyn BoardBackend>,
    config: SyncConfig,
    notifier: Arc<dyn Notifier>,
    policy: Arc<dyn MovePolicy>,
    clock: Arc<dyn Clock>,
}

impl SyncEngineBuilder {
    #[must_use]
    pub fn new(backend: Arc<dyn BoardBackend>) -> Self {
        Self {
            backend,
            config: SyncConfig::default(),
            notifier: Arc::new(TracingNotifier),
            policy: Arc::new(DefaultMovePolicy),
            clock: Arc::new(SystemClock),
        }
    }

    #[inline]
    #[must_use]
    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    #[inline]
    #[must_use]
    pub fn policy(mut self, policy: Arc<dyn MovePolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Clock versions are minted from
    #[inline]
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn build(self) -> SyncEngine {
        let cache = Arc::new(BoardCache::new(self.clock));
        let fetcher = Arc::new(Fetcher::new(Arc::clone(&self.backend), Arc::clone(&cache)));
        let mutator = OptimisticMutator::new(
            Arc::clone(&cache),
            Arc::clone(&fetcher),
            self.backend,
            self.notifier,
            PermissionGate::new(self.policy),
            ConflictDetector::from_config(&self.config),
        )
        .with_success_notices(self.config.notify_on_success);

        SyncEngine {
            config: self.config,
            cache,
            fetcher,
            mutator: Arc::new(mutator),
            opening: Arc::new(DashSet::new()),
        }
    }
}
