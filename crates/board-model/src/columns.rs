//! Column partition of a sprint
//!
//! [`BoardColumns`] is a view derived from a task list. It is rebuilt from
//! the list whenever it is needed and never kept in sync independently.

use crate::column::CanonicalColumn;
use crate::task::{Task, TaskId};
use serde::Serialize;

/// Tasks grouped by canonical column, each lane in sprint order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardColumns {
    lanes: [Vec<Task>; 3],
}

/// Header figures for one column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnSummary {
    pub column: CanonicalColumn,
    pub task_count: usize,
    pub story_points: u32,
}

impl BoardColumns {
    /// Partition a task list, keeping relative order inside each lane
    #[must_use]
    pub fn partition(tasks: &[Task]) -> Self {
        Self::from_tasks(tasks.to_vec())
    }

    /// Partition an owned task list
    #[must_use]
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let mut lanes: [Vec<Task>; 3] = Default::default();
        for task in tasks {
            lanes[task.column().index()].push(task);
        }
        Self { lanes }
    }

    /// Tasks in one lane
    #[inline]
    #[must_use]
    pub fn get(&self, column: CanonicalColumn) -> &[Task] {
        &self.lanes[column.index()]
    }

    /// Mutable access to one lane
    #[inline]
    pub fn get_mut(&mut self, column: CanonicalColumn) -> &mut Vec<Task> {
        &mut self.lanes[column.index()]
    }

    /// Task ids in one lane
    #[must_use]
    pub fn ids(&self, column: CanonicalColumn) -> Vec<TaskId> {
        self.get(column).iter().map(|t| t.id).collect()
    }

    /// Total number of tasks across lanes
    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten back into one list: `TO_DO`, then `IN_PROGRESS`, then `DONE`
    #[must_use]
    pub fn into_tasks(self) -> Vec<Task> {
        self.lanes.into_iter().flatten().collect()
    }

    /// Per-lane counts and story point totals. Totals saturate at
    /// `u32::MAX` rather than overflow.
    #[must_use]
    pub fn summary(&self) -> Vec<ColumnSummary> {
        CanonicalColumn::ALL
            .iter()
            .map(|&column| {
                let lane = self.get(column);
                ColumnSummary {
                    column,
                    task_count: lane.len(),
                    story_points: lane
                        .iter()
                        .filter_map(|t| t.story_points)
                        .fold(0u32, u32::saturating_add),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn tasks() -> Vec<Task> {
        vec![
            Task::new(1, "done").with_story_points(3),
            Task::new(2, "todo"),
            Task::new(3, "in review").with_story_points(2),
            Task::new(4, "blocked").with_story_points(1),
            Task::new(5, "closed").with_story_points(5),
        ]
    }

    #[test]
    fn partition_keeps_relative_order() {
        let columns = BoardColumns::partition(&tasks());

        assert_eq!(columns.ids(CanonicalColumn::ToDo), vec![TaskId(2), TaskId(4)]);
        assert_eq!(columns.ids(CanonicalColumn::InProgress), vec![TaskId(3)]);
        assert_eq!(columns.ids(CanonicalColumn::Done), vec![TaskId(1), TaskId(5)]);
        assert_eq!(columns.len(), 5);
    }

    #[test]
    fn flatten_uses_column_order() {
        let ids: Vec<_> = BoardColumns::partition(&tasks())
            .into_tasks()
            .iter()
            .map(|t| t.id.0)
            .collect();
        assert_eq!(ids, vec![2, 4, 3, 1, 5]);
    }

    #[test]
    fn summary_counts_points() {
        let summary = BoardColumns::partition(&tasks()).summary();

        assert_eq!(summary[0].task_count, 2);
        assert_eq!(summary[0].story_points, 1);
        assert_eq!(summary[1].story_points, 2);
        assert_eq!(summary[2].story_points, 8);
    }

    #[test]
    fn summary_points_saturate() {
        let tasks = vec![
            Task::new(1, "todo").with_story_points(u32::MAX),
            Task::new(2, "todo").with_story_points(7),
            Task::new(3, "done").with_story_points(4),
        ];

        let summary = BoardColumns::partition(&tasks).summary();

        assert_eq!(summary[0].task_count, 2);
        assert_eq!(summary[0].story_points, u32::MAX);
        assert_eq!(summary[2].story_points, 4);
    }

    fn arb_status() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("todo".to_string()),
            Just("In Progress".to_string()),
            Just("DONE".to_string()),
            Just("blocked".to_string()),
            "[a-z ]{0,10}",
        ]
    }

    proptest! {
        #[test]
        fn prop_partition_is_idempotent(statuses in prop::collection::vec(arb_status(), 0..20)) {
            let tasks: Vec<Task> = statuses
                .into_iter()
                .enumerate()
                .map(|(i, s)| Task::new(i as u64, s))
                .collect();

            let once = BoardColumns::partition(&tasks);
            let twice = BoardColumns::from_tasks(once.clone().into_tasks());
            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(once.len(), tasks.len());
        }
    }
}
