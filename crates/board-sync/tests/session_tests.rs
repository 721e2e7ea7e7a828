use board_model::CanonicalColumn::{Done, InProgress, ToDo};
use board_model::{SprintId, TaskId};
use board_planner::{MoveRequest, Position};
use board_sync::{SyncConfig, SyncError};
use board_test_utils::{project, scenario_board, TestHarness};
use pretty_assertions::assert_eq;
use std::time::Duration;

fn polling(interval: Duration) -> TestHarness {
    TestHarness::with_config(scenario_board(), SyncConfig::default().with_poll_interval(interval))
}

fn rename_103(h: &TestHarness) {
    h.backend.mutate(|board| {
        if let Some(task) = board.task_mut(TaskId(103)) {
            task.title = "Renamed elsewhere".to_string();
        }
    });
}

#[tokio::test(start_paused = true)]
async fn polling_picks_up_remote_changes() {
    let h = polling(Duration::from_secs(10));
    let session = h.engine.open(project()).await.unwrap();
    assert!(session.is_polling());

    rename_103(&h);
    tokio::time::sleep(Duration::from_secs(11)).await;

    assert_eq!(h.backend.fetch_count(), 2);
    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.task(TaskId(103)).unwrap().title, "Renamed elsewhere");
}

#[tokio::test(start_paused = true)]
async fn polling_skips_while_write_is_provisional() {
    let h = polling(Duration::from_secs(10));
    let session = h.engine.open(project()).await.unwrap();

    let request = MoveRequest::new(TaskId(101), Position::new(ToDo, 0), Position::new(Done, 0));
    let pending = h.engine.mutator().begin_move(&project(), None, &request).unwrap();
    rename_103(&h);

    tokio::time::sleep(Duration::from_secs(35)).await;
    assert_eq!(h.backend.fetch_count(), 1);
    assert_eq!(session.columns().unwrap().ids(Done), vec![TaskId(101), TaskId(103)]);

    h.engine.mutator().send(pending).await;
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(!session.is_provisional());
    assert_eq!(session.snapshot().unwrap().task(TaskId(103)).unwrap().title, "Renamed elsewhere");
}

#[tokio::test(start_paused = true)]
async fn stop_polling_stops_fetching() {
    let h = TestHarness::scenario();
    let session = h.engine.open(project()).await.unwrap();
    assert!(!session.is_polling());

    session.start_polling(Duration::from_secs(5));
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(h.backend.fetch_count(), 2);

    session.stop_polling();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.backend.fetch_count(), 2);
    assert!(!session.is_polling());
}

#[tokio::test]
async fn zero_interval_is_ignored() {
    let h = TestHarness::scenario();
    let session = h.engine.open(project()).await.unwrap();

    session.start_polling(Duration::ZERO);

    assert!(!session.is_polling());
}

#[tokio::test]
async fn sprint_columns_and_summary() {
    let h = TestHarness::scenario();
    let session = h.engine.open(project()).await.unwrap();

    assert!(session.sprint_columns(SprintId(42)).is_none());
    let columns = session.sprint_columns(SprintId(1)).unwrap();
    assert_eq!(columns, session.columns().unwrap());

    let summary: Vec<_> = columns
        .summary()
        .into_iter()
        .map(|s| (s.column, s.task_count, s.story_points))
        .collect();
    assert_eq!(summary, vec![(ToDo, 2, 3), (InProgress, 1, 5), (Done, 1, 2)]);
}

#[tokio::test]
async fn backlog_is_cached_but_not_on_the_board() {
    let h = TestHarness::scenario();
    let session = h.engine.open(project()).await.unwrap();

    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.backlog_tasks.len(), 1);
    assert!(snapshot.task(TaskId(201)).is_some());
    assert!(snapshot.locate(TaskId(201)).is_none());
    assert_eq!(session.columns().unwrap().len(), 4);
}

#[tokio::test]
async fn manual_refresh_replaces_snapshot() {
    let h = TestHarness::scenario();
    let session = h.engine.open(project()).await.unwrap();
    let loaded = session.snapshot().unwrap().version;

    rename_103(&h);
    let version = session.refresh().await.unwrap().unwrap();

    assert!(version > loaded);
    assert_eq!(session.snapshot().unwrap().task(TaskId(103)).unwrap().title, "Renamed elsewhere");
}

#[tokio::test]
async fn refresh_after_close_fails() {
    let h = TestHarness::scenario();
    let session = h.engine.open(project()).await.unwrap();
    session.close();
    session.close();

    assert!(matches!(session.refresh().await, Err(SyncError::SessionClosed)));
    assert!(session.is_closed());
}

#[tokio::test]
async fn dropping_session_evicts_board() {
    let h = TestHarness::scenario();
    {
        let _session = h.engine.open(project()).await.unwrap();
        assert!(h.engine.cache().contains(&project()));
    }
    assert!(!h.engine.cache().contains(&project()));
    assert!(h.engine.open(project()).await.is_ok());
}
