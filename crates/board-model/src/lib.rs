//! Board Model
//!
//! Domain types for a sprint board as a client caches it.
//!
//! # Core Concepts
//!
//! - [`Task`], [`Sprint`], [`BoardSnapshot`]: the cached board
//! - [`CanonicalColumn`]: the three fixed lanes
//! - [`normalize`]: total mapping from server status strings to lanes
//! - [`BoardColumns`]: the per-lane view, always re-derived from a task list
//!
//! # Example
//!
//! ```rust
//! use board_model::{normalize, CanonicalColumn};
//!
//! assert_eq!(normalize("In Review"), CanonicalColumn::InProgress);
//! assert_eq!(normalize("blocked"), CanonicalColumn::ToDo);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod column;
mod columns;
mod error;
mod snapshot;
mod sprint;
pub mod status;
mod task;

pub use column::CanonicalColumn;
pub use columns::{BoardColumns, ColumnSummary};
pub use error::ModelError;
pub use snapshot::{BoardSnapshot, ProjectId, TaskLocation, Version};
pub use sprint::{Sprint, SprintId, SprintStatus};
pub use status::{classify, normalize, StatusMatch};
pub use task::{Assignee, Priority, Task, TaskId, TaskPatch};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
