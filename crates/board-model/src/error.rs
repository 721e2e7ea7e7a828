//! Error types for the board model

use crate::task::TaskId;

/// Model-level errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Input did not name one of the three canonical columns
    #[error("unknown column: '{0}'")]
    UnknownColumn(String),

    /// Task is not on the board
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
}
