//! Version minting
//!
//! Versions are wall-clock milliseconds bumped to stay strictly increasing.
//! That makes the gap between two versions a rough measure of elapsed time,
//! which is what the conflict heuristic compares against its threshold.

use board_model::Version;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Millisecond time source
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current time in milliseconds
    fn now_millis(&self) -> u64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    #[must_use]
    pub fn starting_at(millis: u64) -> Self {
        Self {
            now: AtomicU64::new(millis),
        }
    }

    pub fn advance(&self, by: Duration) {
        let millis = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, millis: u64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Mints strictly increasing [`Version`]s from a [`Clock`]
#[derive(Debug)]
pub struct VersionClock {
    clock: Arc<dyn Clock>,
    last: Mutex<u64>,
}

impl VersionClock {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            last: Mutex::new(0),
        }
    }

    /// Next version: the clock reading, or one past the previous version if
    /// the clock has not moved
    pub fn mint(&self) -> Version {
        let mut last = self.last.lock();
        let next = self.clock.now_millis().max(*last + 1);
        *last = next;
        Version(next)
    }

    /// Most recently minted version
    #[must_use]
    pub fn last(&self) -> Version {
        Version(*self.last.lock())
    }
}

impl Default for VersionClock {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}
