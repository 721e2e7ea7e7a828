//! `sprintboard` command line entry point

use anyhow::Context;
use board_cli::render::{render_normalized, render_report};
use board_cli::simulate::{load_board, run_simulation, Script};
use board_sync::SyncConfig;
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("sprintboard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Sprint board synchronization tools")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("normalize")
                .about("Print the board column for each status")
                .arg(
                    Arg::new("status")
                        .required(true)
                        .num_args(1..)
                        .help("Server status strings"),
                ),
        )
        .subcommand(
            Command::new("simulate")
                .about("Replay a script of moves and edits against an in-memory board")
                .arg(
                    Arg::new("board")
                        .long("board")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Board snapshot JSON"),
                )
                .arg(
                    Arg::new("script")
                        .long("script")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Script JSON"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Sync configuration TOML"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output the report as JSON"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("normalize", args)) => {
            let statuses: Vec<String> = args
                .get_many::<String>("status")
                .unwrap_or_default()
                .cloned()
                .collect();
            print!("{}", render_normalized(&statuses));
        }
        Some(("simulate", args)) => {
            let board_path = args
                .get_one::<PathBuf>("board")
                .context("--board is required")?;
            let script_path = args
                .get_one::<PathBuf>("script")
                .context("--script is required")?;
            let config = match args.get_one::<PathBuf>("config") {
                Some(path) => SyncConfig::from_file(path)?,
                None => SyncConfig::default(),
            };

            let board = load_board(board_path)?;
            let script = Script::from_file(script_path)?;
            let report = run_simulation(board, &script, config).await?;

            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render_report(&report));
            }
            if !report.converged {
                anyhow::bail!("board did not converge with the server");
            }
        }
        _ => unreachable!("subcommand_required"),
    }
    Ok(())
}
