//! Planning errors

use board_model::{CanonicalColumn, TaskId};

/// Why a drag could not be planned.
///
/// Planning never touches the cache, so these are always safe to report and
/// drop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// Source index is past the end of the source lane
    #[error("no task at {column}[{index}] (lane holds {len})")]
    SourceOutOfRange {
        /// Source lane
        column: CanonicalColumn,
        /// Requested index
        index: usize,
        /// Lane length
        len: usize,
    },

    /// The card at the source slot is not the card the user dragged
    #[error("stale drag: expected task {expected} at source, found {found}")]
    TaskMismatch {
        /// Task named by the drop event
        expected: TaskId,
        /// Task actually at the source slot
        found: TaskId,
    },
}
