//! Board cache
//!
//! One [`CacheEntry`] per open project, mutated only through a narrow API:
//! - [`BoardCache::apply_optimistic`]: write a planned change before the server confirms it
//! - [`BoardCache::commit`]: the server confirmed it
//! - [`BoardCache::rollback`]: restore the exact pre-write entry
//! - [`BoardCache::replace`]: take a server snapshot wholesale
//!
//! Every operation runs under the entry's shard lock and never awaits, so two
//! writes can not interleave.

use crate::clock::{Clock, VersionClock};
use crate::error::SyncError;
use board_model::{BoardSnapshot, ProjectId, Version};
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Cached state of one project's board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Current snapshot, optimistic or confirmed
    pub snapshot: BoardSnapshot,
    /// Version of the newest optimistic write still awaiting the server
    pub provisional: Option<Version>,
    /// Local optimism was discarded and the entry awaits a refetch
    pub stale: bool,
    /// Versions stamped by optimistic writes not yet settled
    in_flight: BTreeSet<Version>,
    /// Bumped whenever in-flight fetch results must be ignored
    fetch_epoch: u64,
}

impl CacheEntry {
    fn new(snapshot: BoardSnapshot) -> Self {
        Self {
            snapshot,
            provisional: None,
            stale: false,
            in_flight: BTreeSet::new(),
            fetch_epoch: 0,
        }
    }

    /// Whether an unconfirmed write is reflected in the snapshot
    #[inline]
    #[must_use]
    pub fn is_provisional(&self) -> bool {
        self.provisional.is_some()
    }

    #[inline]
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.in_flight.len()
    }

    /// Whether the write that stamped `version` is still awaiting the server
    #[inline]
    #[must_use]
    pub fn is_in_flight(&self, version: Version) -> bool {
        self.in_flight.contains(&version)
    }

    /// Retire `version` and drop a provisional marker that no longer names
    /// a write in flight.
    fn settle_write(&mut self, version: Version) {
        self.in_flight.remove(&version);
        self.provisional = self.provisional.filter(|v| self.in_flight.contains(v));
    }
}

/// What a failed write needs to undo itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackContext {
    /// Board the write was applied to
    pub project: ProjectId,
    /// Snapshot as it was just before the write
    pub previous: BoardSnapshot,
    /// Provisional marker as it was just before the write
    pub previous_provisional: Option<Version>,
    /// Version the write stamped on the cache
    pub stamped: Version,
}

/// Proof that a fetch started at a given epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    epoch: u64,
}

/// Keyed store of board snapshots
#[derive(Debug)]
pub struct BoardCache {
    entries: DashMap<ProjectId, CacheEntry>,
    versions: VersionClock,
}

impl BoardCache {
    /// Create cache minting versions from `clock`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            versions: VersionClock::new(clock),
        }
    }

    /// Copy of the current snapshot
    #[must_use]
    pub fn snapshot(&self, project: &ProjectId) -> Option<BoardSnapshot> {
        self.entries.get(project).map(|e| e.snapshot.clone())
    }

    /// Copy of the whole entry
    #[must_use]
    pub fn entry(&self, project: &ProjectId) -> Option<CacheEntry> {
        self.entries.get(project).map(|e| e.clone())
    }

    #[must_use]
    pub fn current_version(&self, project: &ProjectId) -> Option<Version> {
        self.entries.get(project).map(|e| e.snapshot.version)
    }

    #[must_use]
    pub fn contains(&self, project: &ProjectId) -> bool {
        self.entries.contains_key(project)
    }

    #[must_use]
    pub fn is_provisional(&self, project: &ProjectId) -> bool {
        self.entries
            .get(project)
            .is_some_and(|e| e.is_provisional())
    }

    #[must_use]
    pub fn is_stale(&self, project: &ProjectId) -> bool {
        self.entries.get(project).is_some_and(|e| e.stale)
    }

    /// Optimistic writes applied to `project` and not yet settled
    #[must_use]
    pub fn pending_writes(&self, project: &ProjectId) -> usize {
        self.entries.get(project).map_or(0, |e| e.pending_writes())
    }

    /// Take a server snapshot wholesale.
    ///
    /// Stamps a fresh version, clears the provisional and stale markers and
    /// invalidates fetches started before this call.
    pub fn replace(&self, project: &ProjectId, snapshot: BoardSnapshot) -> Version {
        let version = self.versions.mint();
        let snapshot = snapshot.with_version(version);

        self.entries
            .entry(project.clone())
            .and_modify(|entry| {
                entry.snapshot = snapshot.clone();
                entry.provisional = None;
                entry.stale = false;
                entry.fetch_epoch += 1;
            })
            .or_insert_with(|| CacheEntry::new(snapshot));

        tracing::debug!(project = %project, %version, "board replaced");
        version
    }

    /// Register a fetch about to start. `None` if the board is not cached.
    #[must_use]
    pub fn begin_fetch(&self, project: &ProjectId) -> Option<FetchTicket> {
        self.entries.get(project).map(|e| FetchTicket {
            epoch: e.fetch_epoch,
        })
    }

    /// Write a fetch result unless the fetch was cancelled since it began or
    /// an optimistic write is still unsettled.
    ///
    /// Returns the version stamped on the snapshot, or `None` if the result
    /// was discarded.
    pub fn complete_fetch(
        &self,
        project: &ProjectId,
        ticket: FetchTicket,
        snapshot: BoardSnapshot,
    ) -> Option<Version> {
        let mut entry = self.entries.get_mut(project)?;
        if entry.fetch_epoch != ticket.epoch || !entry.in_flight.is_empty() {
            return None;
        }

        let version = self.versions.mint();
        entry.snapshot = snapshot.with_version(version);
        entry.provisional = None;
        entry.stale = false;
        entry.fetch_epoch += 1;
        Some(version)
    }

    /// Make every fetch currently in flight for `project` discard its result
    pub fn cancel_fetches(&self, project: &ProjectId) {
        if let Some(mut entry) = self.entries.get_mut(project) {
            entry.fetch_epoch += 1;
        }
    }

    /// Apply a change to a deep copy of the snapshot and install it.
    ///
    /// `change` runs under the entry lock. If it fails, the cache is left
    /// untouched. On success the copy is stamped with a fresh version, marked
    /// provisional, and in-flight fetches are cancelled.
    ///
    /// # Errors
    /// - `SyncError::BoardNotLoaded` if the project is not cached
    /// - whatever `change` returns
    pub fn apply_optimistic<T, F>(
        &self,
        project: &ProjectId,
        change: F,
    ) -> Result<(RollbackContext, T), SyncError>
    where
        F: FnOnce(&mut BoardSnapshot) -> Result<T, SyncError>,
    {
        let mut entry = self
            .entries
            .get_mut(project)
            .ok_or_else(|| SyncError::BoardNotLoaded(project.clone()))?;

        let mut draft = entry.snapshot.clone();
        let output = change(&mut draft)?;

        let version = self.versions.mint();
        let context = RollbackContext {
            project: project.clone(),
            previous: std::mem::replace(&mut entry.snapshot, draft.with_version(version)),
            previous_provisional: entry.provisional,
            stamped: version,
        };
        entry.provisional = Some(version);
        entry.in_flight.insert(version);
        entry.fetch_epoch += 1;

        Ok((context, output))
    }

    /// Mark a write confirmed.
    ///
    /// Clears the provisional marker only if `version` is the newest
    /// optimistic write; returns whether it did.
    pub fn commit(&self, project: &ProjectId, version: Version) -> bool {
        let Some(mut entry) = self.entries.get_mut(project) else {
            return false;
        };
        let newest = entry.provisional == Some(version);
        entry.settle_write(version);
        newest
    }

    /// Restore the snapshot as it was before the write in `context`.
    ///
    /// The earlier provisional marker comes back only while the write it
    /// names is still in flight. A marker left by a write that already
    /// settled, in particular one that failed, is dropped.
    pub fn rollback(&self, context: &RollbackContext) -> bool {
        match self.entries.get_mut(&context.project) {
            Some(mut entry) => {
                entry.snapshot = context.previous.clone();
                entry.provisional = context.previous_provisional;
                entry.stale = false;
                entry.settle_write(context.stamped);
                true
            }
            None => false,
        }
    }

    /// Settle the write that stamped `version` without undoing it and flag
    /// the entry for a refetch. The snapshot stays visible until one lands.
    pub fn mark_stale(&self, project: &ProjectId, version: Version) -> bool {
        match self.entries.get_mut(project) {
            Some(mut entry) => {
                entry.stale = true;
                entry.settle_write(version);
                true
            }
            None => false,
        }
    }

    /// Drop a project's board
    pub fn evict(&self, project: &ProjectId) -> Option<CacheEntry> {
        self.entries.remove(project).map(|(_, entry)| entry)
    }

    /// Number of cached boards
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for BoardCache {
    fn default() -> Self {
        Self::new(Arc::new(crate::clock::SystemClock))
    }
}
