//! Scripted board simulation
//!
//! Seeds an [`InMemoryBackend`] with a board, opens a session on it and
//! replays a script of moves and edits. Each step can make the server fail
//! its write, so rollbacks and notices can be inspected without a real
//! server.

use anyhow::Context;
use board_model::{
    BoardColumns, BoardSnapshot, CanonicalColumn, ProjectId, TaskId, TaskPatch,
};
use board_planner::{MoveRequest, Position};
use board_sync::{
    BoardSession, InMemoryBackend, NoticeKind, Notifier, ProjectRole, RemoteError, SyncConfig,
    SyncEngine, WriteOutcome,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Server failure injected into one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// HTTP-style status, classified with [`RemoteError::from_status`]
    pub status: u16,
    #[serde(default)]
    pub message: String,
}

impl Failure {
    fn to_error(&self) -> RemoteError {
        RemoteError::from_status(self.status, self.message.clone())
    }
}

/// One scripted user action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Drag a card
    Move {
        task: TaskId,
        from: Position,
        to: Position,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fail: Option<Failure>,
    },
    /// Inline edit
    Edit {
        task: TaskId,
        patch: TaskPatch,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fail: Option<Failure>,
    },
    /// Membership data loaded (or reset with `null`)
    Role { role: Option<ProjectRole> },
}

impl ScriptStep {
    fn describe(&self) -> String {
        match self {
            Self::Move { task, from, to, .. } => format!("move #{task} {from} -> {to}"),
            Self::Edit { task, .. } => format!("edit #{task}"),
            Self::Role { role: Some(role) } => format!("role {role}"),
            Self::Role { role: None } => "role unknown".to_string(),
        }
    }

    fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Move { fail, .. } | Self::Edit { fail, .. } => fail.as_ref(),
            Self::Role { .. } => None,
        }
    }
}

/// A simulation script
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// Project key the board is opened under
    #[serde(default = "default_project")]
    pub project: String,
    /// Role the server enforces on moves
    #[serde(default)]
    pub server_role: Option<ProjectRole>,
    pub steps: Vec<ScriptStep>,
}

fn default_project() -> String {
    "demo".to_string()
}

impl Script {
    /// # Errors
    /// Unreadable file or malformed JSON.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        read_json(path).context("loading script")
    }
}

/// Load a board snapshot from a JSON file
///
/// # Errors
/// Unreadable file or malformed JSON.
pub fn load_board(path: &Path) -> anyhow::Result<BoardSnapshot> {
    read_json(path).context("loading board")
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> anyhow::Result<T> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&source).with_context(|| format!("parsing {}", path.display()))
}

/// A notice as the user would have seen it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoticeRecord {
    pub kind: NoticeKind,
    pub message: String,
}

/// One lane after a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaneView {
    pub column: CanonicalColumn,
    pub tasks: Vec<TaskId>,
    pub story_points: u32,
}

impl LaneView {
    fn lanes(columns: &BoardColumns) -> Vec<Self> {
        columns
            .summary()
            .into_iter()
            .map(|summary| Self {
                column: summary.column,
                tasks: columns.ids(summary.column),
                story_points: summary.story_points,
            })
            .collect()
    }
}

/// Result of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub action: String,
    /// `committed`, `rolled_back`, `superseded`, `discarded`, `rejected` or `applied`
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub notices: Vec<NoticeRecord>,
    pub lanes: Vec<LaneView>,
}

/// Result of a whole simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub project: String,
    pub initial: Vec<LaneView>,
    pub steps: Vec<StepReport>,
    /// Whether the session's board matches the server's after the last step
    pub converged: bool,
}

impl SimulationReport {
    /// Number of steps with the given outcome
    #[must_use]
    pub fn count(&self, outcome: &str) -> usize {
        self.steps.iter().filter(|s| s.outcome == outcome).count()
    }
}

/// Notifier keeping notices until the step that caused them is reported
#[derive(Debug, Default)]
struct CollectingNotifier {
    pending: Mutex<Vec<NoticeRecord>>,
}

impl CollectingNotifier {
    fn drain(&self) -> Vec<NoticeRecord> {
        std::mem::take(&mut *self.pending.lock())
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, message: &str, kind: NoticeKind) {
        tracing::debug!(?kind, message, "notice");
        self.pending.lock().push(NoticeRecord {
            kind,
            message: message.to_string(),
        });
    }
}

/// Replay `script` against `board` and report the board after every step.
///
/// # Errors
/// Only if the board can not be opened; step failures are part of the report.
pub async fn run_simulation(
    board: BoardSnapshot,
    script: &Script,
    config: SyncConfig,
) -> anyhow::Result<SimulationReport> {
    let project = ProjectId::new(script.project.clone());
    let backend = Arc::new(InMemoryBackend::new(project.clone(), board));
    backend.set_caller_role(script.server_role.clone());
    let notifier = Arc::new(CollectingNotifier::default());

    let engine = SyncEngine::builder(backend.clone())
        .config(config)
        .notifier(notifier.clone())
        .build();
    let session = engine
        .open(project.clone())
        .await
        .with_context(|| format!("opening board {project}"))?;

    let initial = LaneView::lanes(&columns_of(&session));
    let mut steps = Vec::with_capacity(script.steps.len());

    for (index, step) in script.steps.iter().enumerate() {
        if let Some(failure) = step.failure() {
            backend.fail_next_update(failure.to_error());
        }

        let (outcome, error) = run_step(&session, step).await;
        session.settled().await;

        let report = StepReport {
            step: index + 1,
            action: step.describe(),
            outcome: outcome.to_string(),
            error,
            notices: notifier.drain(),
            lanes: LaneView::lanes(&columns_of(&session)),
        };
        tracing::info!(step = report.step, action = %report.action, outcome, "step finished");
        steps.push(report);
    }

    let converged = session.snapshot().is_some_and(|local| {
        local.active_sprints == backend.board().active_sprints
            && local.backlog_tasks == backend.board().backlog_tasks
    });
    session.close();

    Ok(SimulationReport {
        project: script.project.clone(),
        initial,
        steps,
        converged,
    })
}

async fn run_step(session: &BoardSession, step: &ScriptStep) -> (&'static str, Option<String>) {
    let result = match step {
        ScriptStep::Move { task, from, to, .. } => {
            session.submit_move(&MoveRequest::new(*task, *from, *to)).await
        }
        ScriptStep::Edit { task, patch, .. } => session.edit_task(*task, patch).await,
        ScriptStep::Role { role } => {
            session.set_role(role.clone());
            return ("applied", None);
        }
    };

    match result {
        Ok(WriteOutcome::Committed { .. }) => ("committed", None),
        Ok(WriteOutcome::RolledBack { error }) => ("rolled_back", Some(error.to_string())),
        Ok(WriteOutcome::Superseded { error }) => ("superseded", Some(error.to_string())),
        Ok(WriteOutcome::Discarded { error }) => ("discarded", Some(error.to_string())),
        Err(error) => ("rejected", Some(error.to_string())),
    }
}

fn columns_of(session: &BoardSession) -> BoardColumns {
    session.columns().unwrap_or_default()
}
