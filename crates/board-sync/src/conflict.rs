//! Conflict detection for failed writes
//!
//! When a write fails, the cache may already hold newer optimistic state
//! from a later write (or a refetch). Restoring the failed write's pre-move
//! snapshot over that state would undo newer work.
//!
//! The detector compares the version the failed write stamped against the
//! cache's current version. Versions are wall-clock based, so the gap is an
//! elapsed-time estimate, not a generation count:
//! - gap above the threshold: the write was overtaken. Local optimism is
//!   discarded and the caller must refetch.
//! - otherwise: ordinary failure. The exact pre-write snapshot is restored.
//!
//! This is an approximation. Two legitimate moves inside the threshold
//! window count as ordinary, so the older failure restores over the newer
//! move; the settle-time refetch repairs that. A slow write overtaken by a
//! refetch counts as superseded even if nothing actually changed.

use crate::cache::{BoardCache, RollbackContext};
use crate::config::SyncConfig;
use crate::error::RemoteError;
use crate::remote::{NoticeKind, Notifier};
use board_model::Version;

/// Notice shown when a failed write was overtaken
pub const SUPERSEDED_NOTICE: &str = "The board was changed elsewhere; showing the latest version";

/// How a failed write was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The pre-write snapshot was restored
    RolledBack,
    /// Newer state was kept and marked stale; a refetch is required
    Superseded,
    /// The board was closed before the write settled
    Closed,
}

/// Failed-write classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictDetector {
    threshold: u64,
}

impl ConflictDetector {
    /// Create detector treating a gap above `threshold` as superseded
    #[inline]
    #[must_use]
    pub fn new(threshold: u64) -> Self {
        Self { threshold }
    }

    #[inline]
    #[must_use]
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.conflict_threshold_ms)
    }

    #[inline]
    #[must_use]
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Classify without touching anything
    #[must_use]
    pub fn classify(&self, stamped: Version, current: Version) -> Settlement {
        if current.ahead_of(stamped) > self.threshold {
            Settlement::Superseded
        } else {
            Settlement::RolledBack
        }
    }

    /// Settle a failed write against the cache and tell the user.
    ///
    /// Does not refetch; the caller always does that afterwards.
    pub fn on_failure(
        &self,
        cache: &BoardCache,
        notifier: &dyn Notifier,
        error: &RemoteError,
        context: &RollbackContext,
    ) -> Settlement {
        let project = &context.project;
        let Some(current) = cache.current_version(project) else {
            tracing::debug!(project = %project, %error, "write failed after board was closed");
            return Settlement::Closed;
        };

        let settlement = self.classify(context.stamped, current);
        match settlement {
            Settlement::RolledBack => {
                cache.rollback(context);
                tracing::warn!(
                    project = %project,
                    stamped = %context.stamped,
                    %error,
                    "write failed, rolled back"
                );
                notifier.notify(&error.user_message(), NoticeKind::Error);
            }
            Settlement::Superseded => {
                cache.mark_stale(project, context.stamped);
                tracing::warn!(
                    project = %project,
                    stamped = %context.stamped,
                    %current,
                    %error,
                    "write failed after being overtaken, discarding local state"
                );
                notifier.notify(SUPERSEDED_NOTICE, NoticeKind::Conflict);
            }
            Settlement::Closed => {}
        }
        settlement
    }
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::SyncError;
    use crate::remote::MockNotifier;
    use board_model::{BoardSnapshot, ProjectId, Sprint, Task, TaskId};
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn project() -> ProjectId {
        ProjectId::new("alpha")
    }

    fn setup() -> (BoardCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_at(1_000));
        let cache = BoardCache::new(clock.clone());
        cache.replace(
            &project(),
            BoardSnapshot::new(vec![Sprint::new(1, vec![Task::new(1, "todo")])], vec![]),
        );
        (cache, clock)
    }

    fn archive(snapshot: &mut BoardSnapshot) -> Result<(), SyncError> {
        if let Some(task) = snapshot.task_mut(TaskId(1)) {
            task.archived = !task.archived;
        }
        Ok(())
    }

    #[test]
    fn classify_uses_strict_threshold() {
        let detector = ConflictDetector::new(100);

        assert_eq!(detector.classify(Version(10), Version(10)), Settlement::RolledBack);
        assert_eq!(detector.classify(Version(10), Version(110)), Settlement::RolledBack);
        assert_eq!(detector.classify(Version(10), Version(111)), Settlement::Superseded);
        assert_eq!(detector.classify(Version(500), Version(10)), Settlement::RolledBack);
    }

    #[test]
    fn ordinary_failure_rolls_back_and_reports_error() {
        let (cache, _clock) = setup();
        let before = cache.snapshot(&project()).unwrap();
        let (context, ()) = cache.apply_optimistic(&project(), archive).unwrap();

        let error = RemoteError::Validation("bad position".to_string());
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .with(eq(error.user_message()), eq(NoticeKind::Error))
            .times(1)
            .return_const(());

        let settlement = ConflictDetector::new(2_000).on_failure(&cache, &notifier, &error, &context);

        assert_eq!(settlement, Settlement::RolledBack);
        assert_eq!(cache.snapshot(&project()).unwrap(), before);
    }

    #[test]
    fn overtaken_failure_keeps_newer_state() {
        let (cache, clock) = setup();
        let (older, ()) = cache.apply_optimistic(&project(), archive).unwrap();
        clock.advance(Duration::from_secs(5));
        let (newer, ()) = cache.apply_optimistic(&project(), archive).unwrap();
        let newer_snapshot = cache.snapshot(&project()).unwrap();

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .with(eq(SUPERSEDED_NOTICE), eq(NoticeKind::Conflict))
            .times(1)
            .return_const(());

        let error = RemoteError::Conflict("409".to_string());
        let settlement = ConflictDetector::new(2_000).on_failure(&cache, &notifier, &error, &older);

        assert_eq!(settlement, Settlement::Superseded);
        let entry = cache.entry(&project()).unwrap();
        assert_eq!(entry.snapshot, newer_snapshot);
        assert_eq!(entry.snapshot.version, newer.stamped);
        assert!(entry.stale);
        // the newer write is still out and keeps its marker
        assert_eq!(entry.provisional, Some(newer.stamped));
    }

    #[test]
    fn both_overlapping_failures_settle_every_marker() {
        let (cache, _clock) = setup();
        let (first, ()) = cache.apply_optimistic(&project(), archive).unwrap();
        let (second, ()) = cache.apply_optimistic(&project(), archive).unwrap();

        let error = RemoteError::Conflict("409".to_string());
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .with(eq(error.user_message()), eq(NoticeKind::Error))
            .times(2)
            .return_const(());

        let detector = ConflictDetector::new(2_000);
        assert_eq!(
            detector.on_failure(&cache, &notifier, &error, &first),
            Settlement::RolledBack
        );
        assert_eq!(
            detector.on_failure(&cache, &notifier, &error, &second),
            Settlement::RolledBack
        );

        let entry = cache.entry(&project()).unwrap();
        assert_eq!(entry.provisional, None);
        assert_eq!(entry.pending_writes(), 0);
        assert!(!entry.stale);
    }

    #[test]
    fn closed_board_is_left_alone() {
        let (cache, _clock) = setup();
        let (context, ()) = cache.apply_optimistic(&project(), archive).unwrap();
        cache.evict(&project());

        let mut notifier = MockNotifier::new();
        notifier.expect_notify().never();

        let error = RemoteError::Transport("reset".to_string());
        let settlement = ConflictDetector::default().on_failure(&cache, &notifier, &error, &context);

        assert_eq!(settlement, Settlement::Closed);
    }
}
