//! Testing utilities for the sprint board workspace
//!
//! Shared fixtures, a recording notifier and a harness wiring a
//! [`SyncEngine`] to an [`InMemoryBackend`] with a manual clock.

#![allow(missing_docs)]

use board_model::{BoardSnapshot, ProjectId, Sprint, Task};
use board_sync::{InMemoryBackend, NoticeKind, Notifier, SyncConfig, SyncEngine};
use parking_lot::Mutex;
use std::sync::Arc;

pub use board_sync::ManualClock;

/// Clock reading every harness starts at
pub const START_MILLIS: u64 = 1_700_000_000_000;

pub fn project() -> ProjectId {
    ProjectId::new("sprint-board")
}

pub fn task(id: u64, status: &str) -> Task {
    Task::new(id, status).with_title(format!("Task {id}"))
}

pub fn board(tasks: Vec<Task>) -> BoardSnapshot {
    BoardSnapshot::new(vec![Sprint::new(1, tasks).with_name("Sprint 1")], vec![])
}

/// Sprint with tasks in every lane, using non-canonical statuses, plus a
/// backlog task that must stay off the board.
///
/// Task 101 is the TO_DO task the end-to-end scenario drags.
pub fn scenario_board() -> BoardSnapshot {
    BoardSnapshot::new(
        vec![Sprint::new(
            1,
            vec![
                task(101, "TO_DO").with_story_points(3),
                task(102, "In Review").with_story_points(5),
                task(103, "done").with_story_points(2),
                task(104, "blocked"),
            ],
        )
        .with_name("Sprint 1")],
        vec![task(201, "TO_DO")],
    )
}

/// Notifier that keeps every notice
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(String, NoticeKind)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<(String, NoticeKind)> {
        self.notices.lock().clone()
    }

    pub fn messages(&self, kind: NoticeKind) -> Vec<String> {
        self.notices
            .lock()
            .iter()
            .filter(|(_, k)| *k == kind)
            .map(|(m, _)| m.clone())
            .collect()
    }

    pub fn count(&self, kind: NoticeKind) -> usize {
        self.messages(kind).len()
    }

    pub fn clear(&self) {
        self.notices.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, kind: NoticeKind) {
        self.notices.lock().push((message.to_string(), kind));
    }
}

/// Engine over an in-memory backend, with every collaborator exposed
pub struct TestHarness {
    pub engine: SyncEngine,
    pub backend: Arc<InMemoryBackend>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
}

impl TestHarness {
    pub fn new(board: BoardSnapshot) -> Self {
        Self::with_config(board, SyncConfig::default())
    }

    pub fn with_config(board: BoardSnapshot, config: SyncConfig) -> Self {
        let backend = Arc::new(InMemoryBackend::new(project(), board));
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = Arc::new(ManualClock::starting_at(START_MILLIS));
        let engine = SyncEngine::builder(backend.clone())
            .config(config)
            .notifier(notifier.clone())
            .clock(clock.clone())
            .build();

        Self {
            engine,
            backend,
            notifier,
            clock,
        }
    }

    /// Harness over [`scenario_board`]
    pub fn scenario() -> Self {
        Self::new(scenario_board())
    }
}
