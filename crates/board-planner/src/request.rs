//! Drag coordinates

use board_model::{CanonicalColumn, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A slot on the board: a lane and an index inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Lane
    pub column: CanonicalColumn,
    /// Index inside the lane
    pub index: usize,
}

impl Position {
    /// Create a slot
    #[inline]
    #[must_use]
    pub fn new(column: CanonicalColumn, index: usize) -> Self {
        Self { column, index }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.column, self.index)
    }
}

/// A drop event as the board reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Task the user picked up
    pub task_id: TaskId,
    /// Where it was picked up
    pub from: Position,
    /// Where it was dropped
    pub to: Position,
}

impl MoveRequest {
    /// Create a drop event
    #[inline]
    #[must_use]
    pub fn new(task_id: TaskId, from: Position, to: Position) -> Self {
        Self { task_id, from, to }
    }

    /// Whether the drop stays in the source lane
    #[inline]
    #[must_use]
    pub fn is_reorder(&self) -> bool {
        self.from.column == self.to.column
    }
}
