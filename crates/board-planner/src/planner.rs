//! Move planner
//!
//! Turns a drop event into the sprint's new task order. Planning is pure: it
//! reads a task list and returns a new one, so the caller decides where (and
//! whether) the result is written.

use crate::error::PlanError;
use crate::request::{MoveRequest, Position};
use board_model::{BoardColumns, Task, TaskId};

/// Result of planning one move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    /// The sprint's tasks in their new order, lanes flattened
    /// `TO_DO`, `IN_PROGRESS`, `DONE`
    pub tasks: Vec<Task>,
    /// The task that moved
    pub task_id: TaskId,
    /// Where it landed after clamping
    pub landed: Position,
    /// Whether its status was rewritten
    pub status_changed: bool,
}

impl MovePlan {
    /// The moved task as it appears in the new order
    #[must_use]
    pub fn moved_task(&self) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == self.task_id)
    }
}

/// Drag-and-drop planner
///
/// # Characteristics
/// - Destination index is clamped, never rejected: dropping past the end of
///   a lane appends
/// - Reordering inside a lane keeps the task's status string untouched
/// - Crossing lanes rewrites the status to the destination lane's name
/// - The set of task ids is unchanged by every plan
#[derive(Debug, Clone, Copy, Default)]
pub struct MovePlanner;

impl MovePlanner {
    /// Create planner
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Plan a move from one slot to another
    ///
    /// # Errors
    /// - `PlanError::SourceOutOfRange` if there is no task at `from`
    pub fn plan(&self, tasks: &[Task], from: Position, to: Position) -> Result<MovePlan, PlanError> {
        let mut columns = BoardColumns::partition(tasks);

        let source = columns.get_mut(from.column);
        if from.index >= source.len() {
            return Err(PlanError::SourceOutOfRange {
                column: from.column,
                index: from.index,
                len: source.len(),
            });
        }
        let mut task = source.remove(from.index);
        let task_id = task.id;

        let status_changed = from.column != to.column;
        if status_changed {
            task.set_column(to.column);
        }

        let destination = columns.get_mut(to.column);
        let index = to.index.min(destination.len());
        destination.insert(index, task);

        tracing::debug!(
            task = %task_id,
            from = %from,
            to = %Position::new(to.column, index),
            "planned move"
        );

        Ok(MovePlan {
            tasks: columns.into_tasks(),
            task_id,
            landed: Position::new(to.column, index),
            status_changed,
        })
    }

    /// Plan a drop event, checking the dragged card is still at its source
    ///
    /// # Errors
    /// - `PlanError::SourceOutOfRange` if there is no task at the source slot
    /// - `PlanError::TaskMismatch` if a different task sits there
    pub fn plan_request(&self, tasks: &[Task], request: &MoveRequest) -> Result<MovePlan, PlanError> {
        let plan = self.plan(tasks, request.from, request.to)?;
        if plan.task_id != request.task_id {
            return Err(PlanError::TaskMismatch {
                expected: request.task_id,
                found: plan.task_id,
            });
        }
        Ok(plan)
    }
}

/// Plan a move with the default planner
///
/// # Errors
/// See [`MovePlanner::plan`].
pub fn plan(tasks: &[Task], from: Position, to: Position) -> Result<MovePlan, PlanError> {
    MovePlanner::new().plan(tasks, from, to)
}
