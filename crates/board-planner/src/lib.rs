//! Board Planner
//!
//! Computes the new task order for a drag-and-drop move on a sprint board.
//!
//! # Core Concepts
//!
//! - [`MoveRequest`]: a drop event (task, source slot, destination slot)
//! - [`MovePlanner`]: partitions, removes, reinserts (clamped), relabels
//! - [`MovePlan`]: the new order plus what moved and where it landed
//!
//! # Example
//!
//! ```rust
//! use board_model::{CanonicalColumn, Task};
//! use board_planner::{plan, Position};
//!
//! let tasks = vec![Task::new(101, "todo")];
//! let plan = plan(
//!     &tasks,
//!     Position::new(CanonicalColumn::ToDo, 0),
//!     Position::new(CanonicalColumn::InProgress, 0),
//! )
//! .unwrap();
//!
//! assert_eq!(plan.tasks[0].column(), CanonicalColumn::InProgress);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod planner;
mod request;

pub use error::PlanError;
pub use planner::{plan, MovePlan, MovePlanner};
pub use request::{MoveRequest, Position};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
