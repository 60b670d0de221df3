//! PyChamp CLI - play the Python tutorial levels from a terminal.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pychamp_core::{format_duration_ms, LevelCatalog, LevelId};
use pychamp_execution::{submit, AttemptResult, CommandRunner, RunnerConfig};
use pychamp_progress::{LevelStatus, ProgressTracker};
use pychamp_storage::JsonStorage;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pychamp")]
#[command(about = "Learn Python one level at a time", long_about = None)]
struct Cli {
    /// Directory holding saved progress
    #[arg(long, env = "PYCHAMP_DATA_DIR", default_value = ".pychamp", global = true)]
    data_dir: PathBuf,

    /// JSON file with a custom level catalog
    #[arg(long, global = true)]
    levels: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the level map
    Map,
    /// Show a level's story and instructions
    Show {
        /// Level number
        id: LevelId,
    },
    /// Play a level: run a solution and record the result
    Play {
        /// Level number
        id: LevelId,
        /// File with the Python code to submit
        #[arg(long, conflicts_with = "solution")]
        file: Option<PathBuf>,
        /// Submit the level's reference solution
        #[arg(long)]
        solution: bool,
        /// Reveal this many hints before running
        #[arg(long, default_value = "0")]
        hints: u32,
        /// Line to answer an input() call with; repeatable
        #[arg(long = "input")]
        inputs: Vec<String>,
        /// Python interpreter
        #[arg(long, default_value = "python3")]
        python: String,
        /// Seconds before a run is stopped
        #[arg(long, default_value = "10")]
        timeout_secs: u64,
    },
    /// Show overall progress
    Progress,
    /// Erase all saved progress
    Reset {
        /// Confirm the reset; nothing is erased without it
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let catalog = match &cli.levels {
        Some(path) => LevelCatalog::from_path(path)
            .with_context(|| format!("Failed to load levels from {}", path.display()))?,
        None => LevelCatalog::builtin(),
    };
    let storage = JsonStorage::new(&cli.data_dir)
        .await
        .with_context(|| format!("Failed to open {}", cli.data_dir.display()))?;

    let mut tracker = ProgressTracker::new(storage, Arc::new(catalog));
    tracker.load().await;

    match cli.command {
        Commands::Map => print_map(&tracker),
        Commands::Show { id } => {
            let level = tracker
                .catalog()
                .get(id)
                .ok_or_else(|| anyhow::anyhow!("Level {} not found", id))?;
            println!("Level {}: {}", level.id, level.title);
            println!("  Concepts: {}", level.concepts);
            if !level.dialogue.is_empty() {
                println!("  {}", level.dialogue);
            }
            println!("  Task: {}", level.instructions);
            println!("  Hints available: {}", level.hints.len());
            println!("  Status: {}", format_status(&tracker.level_status(id)));
        }
        Commands::Play { id, file, solution, hints, inputs, python, timeout_secs } => {
            let level = tracker.start_level(id).await?.clone();
            println!("Level {}: {}", level.id, level.title);
            println!("  {}", level.instructions);

            for _ in 0..hints {
                match tracker.reveal_hint().await? {
                    Some(hint) => {
                        println!("Hint {} of {}: {}", hint.number, hint.total, hint.text);
                    }
                    None => {
                        println!("All {} hints used for this level", level.hints.len());
                        break;
                    }
                }
            }

            let code = match (file, solution) {
                (Some(path), _) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, true) => level
                    .solution
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("Level {} has no reference solution", id))?,
                (None, false) => anyhow::bail!("Pass --file <code.py> or --solution"),
            };

            let runner = CommandRunner::new()
                .with_config(RunnerConfig {
                    python,
                    timeout: Duration::from_secs(timeout_secs),
                })
                .with_input(inputs);

            match submit(&mut tracker, &runner, &code).await? {
                AttemptResult::Solved { outcome, summary } => {
                    println!("Output:\n{}", outcome.output);
                    println!(
                        "Level {} complete! {} in {}",
                        summary.level,
                        summary.stars,
                        format_duration_ms(summary.elapsed_ms)
                    );
                    if summary.best_stars > summary.stars {
                        println!("  Best so far: {}", summary.best_stars);
                    }
                    match summary.next_level {
                        Some(next) if summary.unlocked_next => {
                            println!("  Level {} unlocked!", next)
                        }
                        Some(next) => println!("  Next up: level {}", next),
                        None => println!("  Congratulations! All levels complete!"),
                    }
                }
                AttemptResult::WrongOutput(outcome) => {
                    println!("Output:\n{}", outcome.output);
                    println!("Not quite. Compare your output with the task and try again.");
                }
                AttemptResult::Errored(outcome) => {
                    println!("Error: {}", outcome.error.unwrap_or_default());
                    println!("Debugging is part of learning. Check your syntax and try again.");
                }
            }
        }
        Commands::Progress => {
            let p = tracker.overall_progress();
            println!("{}/{} levels complete ({:.0}%)", p.completed_count, p.total_count, p.percentage);
            println!("  Stars: {}/{}", p.total_stars, p.max_stars);
            println!("  Hints used: {}", p.hints_used);
            println!("  Play time: {}", format_duration_ms(p.total_play_time_ms));
        }
        Commands::Reset { yes } => {
            if !yes {
                println!("This erases all progress. Re-run with --yes to confirm.");
                return Ok(());
            }
            tracker.reset_progress().await;
            info!("Progress in {} cleared", cli.data_dir.display());
            println!("Progress reset.");
        }
    }

    Ok(())
}

fn print_map(tracker: &ProgressTracker<JsonStorage>) {
    println!("Level map");
    for entry in tracker.level_map() {
        println!(
            "  {:>2} | {:<10} | {} ({})",
            entry.id,
            format_status(&entry.status),
            entry.title,
            entry.concepts,
        );
    }
}

fn format_status(status: &LevelStatus) -> String {
    match status {
        LevelStatus::Locked => "LOCKED".to_string(),
        LevelStatus::Unlocked => "OPEN".to_string(),
        LevelStatus::Completed { stars: Some(stars) } => stars.to_string(),
        LevelStatus::Completed { stars: None } => "DONE".to_string(),
    }
}
