use board_cli::simulate::{load_board, run_simulation, Script};
use board_sync::SyncConfig;
use pretty_assertions::assert_eq;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

const BOARD: &str = r#"{
    "active_sprints": [{
        "id": 1,
        "name": "Sprint 1",
        "status": "active",
        "tasks": [
            {"id": 101, "title": "Login page", "status": "TO_DO", "story_points": 3},
            {"id": 102, "title": "API", "status": "In Review", "story_points": 5},
            {"id": 103, "title": "Docs", "status": "closed"}
        ]
    }],
    "backlog_tasks": [{"id": 201, "title": "Someday", "status": "backlog"}]
}"#;

const SCRIPT: &str = r#"{
    "project": "web",
    "steps": [
        {"op": "move", "task": 101,
         "from": {"column": "TO_DO", "index": 0},
         "to": {"column": "IN_PROGRESS", "index": 0}},
        {"op": "move", "task": 101,
         "from": {"column": "IN_PROGRESS", "index": 0},
         "to": {"column": "TO_DO", "index": 0},
         "fail": {"status": 409, "message": "version mismatch"}},
        {"op": "edit", "task": 103, "patch": {"priority": "urgent"}}
    ]
}"#;

fn write_inputs(dir: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
    let board = dir.path().join("board.json");
    let script = dir.path().join("script.json");
    fs::write(&board, BOARD).unwrap();
    fs::write(&script, SCRIPT).unwrap();
    (board, script)
}

#[tokio::test]
async fn simulation_from_files() {
    let dir = TempDir::new().unwrap();
    let (board_path, script_path) = write_inputs(&dir);

    let board = load_board(&board_path).unwrap();
    let script = Script::from_file(&script_path).unwrap();
    let report = run_simulation(board, &script, SyncConfig::default())
        .await
        .unwrap();

    let outcomes: Vec<_> = report.steps.iter().map(|s| s.outcome.as_str()).collect();
    assert_eq!(outcomes, vec!["committed", "rolled_back", "committed"]);
    // the failed move left 101 where the first move put it
    assert_eq!(report.steps[1].lanes, report.steps[0].lanes);
    assert_eq!(report.project, "web");
    assert!(report.converged);
}

#[test]
fn malformed_script_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("script.json");
    fs::write(&path, r#"{"steps": [{"op": "teleport"}]}"#).unwrap();

    let err = Script::from_file(&path).unwrap_err();
    assert!(format!("{err:#}").contains("script.json"));
}

#[test]
fn normalize_command_prints_columns() {
    let output = Command::new(env!("CARGO_BIN_EXE_sprintboard"))
        .args(["normalize", "doing", "Done", "blocked"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout,
        "doing    IN_PROGRESS\nDone     DONE\nblocked  TO_DO (fallback)\n"
    );
}

#[test]
fn simulate_command_emits_json_report() {
    let dir = TempDir::new().unwrap();
    let (board, script) = write_inputs(&dir);
    let config = dir.path().join("sync.toml");
    fs::write(&config, "conflict_threshold_ms = 500\nnotify_on_success = true\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_sprintboard"))
        .arg("simulate")
        .arg("--board")
        .arg(&board)
        .arg("--script")
        .arg(&script)
        .arg("--config")
        .arg(&config)
        .arg("--json")
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["converged"], true);
    assert_eq!(report["steps"][0]["notices"][0]["kind"], "success");
    assert_eq!(report["steps"][1]["outcome"], "rolled_back");
}

#[test]
fn simulate_rejects_bad_config() {
    let dir = TempDir::new().unwrap();
    let (board, script) = write_inputs(&dir);
    let config = dir.path().join("sync.toml");
    fs::write(&config, "poll_interval_ms = 0\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_sprintboard"))
        .arg("simulate")
        .arg("--board")
        .arg(&board)
        .arg("--script")
        .arg(&script)
        .arg("--config")
        .arg(&config)
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert!(!output.status.success());
}
