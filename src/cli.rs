//! CLI interface for ACE.
//!
//! - `ace shell` (the default): read objectives interactively, one mission each,
//!   until `exit` or end of input.
//! - `ace run <objective>`: a single mission. With `--outcome` it runs
//!   unattended; otherwise the outcome is asked for on the terminal.
//! - `ace playbook`: print the current playbook.

mod format;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use crate::config::Config;
use crate::inference::{self, Inference};
use crate::mission::{MissionError, Orchestrator};
use crate::outcome::{Console, Fixed, OutcomeError};
use crate::playbook::PlaybookStore;

use format::{format_failure, format_report};

/// ACE: generate, reflect, curate.
#[derive(Debug, Parser)]
#[command(name = "ace", version, after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Config file. Defaults to `~/.ace/config.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Playbook file. Overrides the configured location.
    #[arg(long, global = true)]
    playbook: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

const WORKFLOW_HELP: &str = r#"Workflow:
  1. ace shell
     → enter an objective, review the generated action, report the outcome
  2. outcomes containing "fail" or "partial" distil a lesson into the playbook
  3. ace playbook
     → review what has been learned

Unattended:
  ace run "Enumerate open ports" --outcome "fail, scan blocked by firewall" --json"#;

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive loop: one mission per objective until `exit`.
    Shell,

    /// Run a single mission.
    Run {
        /// What the mission should achieve.
        objective: String,

        /// Outcome to report instead of asking on the terminal.
        #[arg(long)]
        outcome: Option<String>,

        /// Print the mission report as JSON. Requires `--outcome` so that
        /// nothing but the report reaches stdout.
        #[arg(long, requires = "outcome")]
        json: bool,
    },

    /// Print the playbook.
    Playbook,
}

/// Run the CLI, returning an error message on failure.
pub fn run() -> Result<(), String> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).map_err(|e| e.to_string())?;
    let path = cli
        .playbook
        .or_else(|| config.playbook_path())
        .ok_or("could not determine home directory")?;
    let playbook = PlaybookStore::load(path).map_err(|e| format!("failed to load playbook: {e}"))?;
    info!(
        path = %playbook.path().display(),
        entries = playbook.len(),
        "playbook loaded"
    );

    match cli.command.unwrap_or(Command::Shell) {
        Command::Playbook => {
            cmd_playbook(&playbook);
            Ok(())
        }
        Command::Run {
            objective,
            outcome,
            json,
        } => {
            let orchestrator = orchestrator(&config, playbook)?;
            cmd_run(orchestrator, &objective, outcome, json)
        }
        Command::Shell => {
            let orchestrator = orchestrator(&config, playbook)?;
            cmd_shell(orchestrator)
        }
    }
}

fn orchestrator(
    config: &Config,
    playbook: PlaybookStore,
) -> Result<Orchestrator<Box<dyn Inference>>, String> {
    let inference = inference::from_config(&config.inference)
        .map_err(|e| format!("failed to initialize inference: {e}"))?;
    Ok(Orchestrator::new(inference, playbook))
}

fn cmd_playbook(playbook: &PlaybookStore) {
    println!("{}", playbook.render());
    if playbook.is_empty() {
        eprintln!("Nothing recorded yet at {}", playbook.path().display());
        return;
    }
    eprintln!(
        "{} entr{} in {}",
        playbook.len(),
        if playbook.len() == 1 { "y" } else { "ies" },
        playbook.path().display()
    );
}

fn cmd_run(
    mut orchestrator: Orchestrator<impl Inference>,
    objective: &str,
    outcome: Option<String>,
    json: bool,
) -> Result<(), String> {
    // The plan is shown before the outcome question when asking interactively.
    let (result, plan_shown) = match outcome {
        Some(outcome) => (orchestrator.run(objective, &mut Fixed(outcome)), false),
        None => (orchestrator.run(objective, &mut Console::stdio()), true),
    };

    let report = result.map_err(|e| {
        error!(phase = %e.phase(), error = %e, "mission failed");
        format_failure(&e)
    })?;
    info!(lesson = ?report.lesson(), "mission complete");

    if json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("failed to serialize report: {e}"))?;
        println!("{json}");
    } else {
        println!("{}", format_report(&report, !plan_shown));
    }
    Ok(())
}

fn cmd_shell(mut orchestrator: Orchestrator<impl Inference>) -> Result<(), String> {
    let mut console = Console::stdio();
    let io_err = |e: std::io::Error| format!("terminal I/O failed: {e}");

    console.say("[ACE] System ready.").map_err(io_err)?;
    loop {
        let Some(objective) = console
            .ask("\n[Main Control] Enter Mission Objective (or 'exit'): ")
            .map_err(io_err)?
        else {
            break;
        };
        let objective = objective.trim();
        if objective.eq_ignore_ascii_case("exit") {
            break;
        }
        if objective.is_empty() {
            continue;
        }

        console
            .say(&format!("\n[!!!] MISSION STARTED: {objective}"))
            .map_err(io_err)?;
        match orchestrator.run(objective, &mut console) {
            Ok(report) => console.say(&format_report(&report, false)).map_err(io_err)?,
            Err(MissionError::Outcome(OutcomeError::Closed)) => break,
            Err(e) => {
                error!(phase = %e.phase(), error = %e, "mission failed");
                console.say(&format_failure(&e)).map_err(io_err)?;
            }
        }
    }
    Ok(())
}
