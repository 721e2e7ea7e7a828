//! Board Sync - optimistic board cache for sprint boards
//!
//! Keeps one project's board in memory and lets the user move and edit
//! tasks with immediate feedback:
//! - Applies every change to the cache before the server confirms it
//! - Restores the exact pre-write board when a write fails
//! - Detects failures overtaken by newer state and refetches instead
//! - Refetches the board after every write, and optionally on a timer
//!
//! # Core Concepts
//!
//! - [`SyncEngine`]: owns the [`BoardCache`] and opens sessions
//! - [`BoardSession`]: one open board; moves, edits, reads
//! - [`OptimisticMutator`]: the only writer of the cache
//! - [`ConflictDetector`]: rollback vs. supersede for failed writes
//! - [`BoardBackend`], [`Notifier`], [`MovePolicy`]: collaborator seams
//!
//! # Example
//!
//! ```rust,ignore
//! use board_sync::{InMemoryBackend, SyncEngine};
//! use board_model::{CanonicalColumn, ProjectId, TaskId};
//! use std::sync::Arc;
//!
//! # async fn example(backend: Arc<InMemoryBackend>) -> Result<(), board_sync::SyncError> {
//! let engine = SyncEngine::new(backend);
//! let session = engine.open(ProjectId::new("alpha")).await?;
//!
//! let outcome = session
//!     .move_task(TaskId(101), CanonicalColumn::ToDo, 0, CanonicalColumn::InProgress, 0)
//!     .await?;
//! assert!(outcome.is_committed());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cache;
pub mod clock;
pub mod config;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod memory;
pub mod mutator;
pub mod permission;
pub mod remote;
pub mod session;

pub use cache::{BoardCache, CacheEntry, FetchTicket, RollbackContext};
pub use clock::{Clock, ManualClock, SystemClock, VersionClock};
pub use config::SyncConfig;
pub use conflict::{ConflictDetector, Settlement, SUPERSEDED_NOTICE};
pub use engine::{SyncEngine, SyncEngineBuilder};
pub use error::{ConfigError, RemoteError, SyncError};
pub use fetch::Fetcher;
pub use memory::{InMemoryBackend, UpdateStep};
pub use mutator::{OptimisticMutator, PendingWrite, WriteKind, WriteOutcome};
pub use permission::{DefaultMovePolicy, MovePolicy, PermissionGate, ProjectRole};
pub use remote::{BoardBackend, NoticeKind, Notifier, TaskUpdate, TracingNotifier};
pub use session::BoardSession;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with board sync
    pub use crate::{
        BoardBackend, BoardSession, NoticeKind, Notifier, ProjectRole, SyncConfig, SyncEngine,
        SyncError, WriteOutcome,
    };
    pub use board_model::{CanonicalColumn, ProjectId, TaskId, TaskPatch};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
