mod case;
mod cli;
mod config;
mod outcome;
mod report;
mod results;
mod run;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use drift::core::types::StrategyKind;
use drift::{exit_codes, logging};

use crate::run::RunOptions;

#[derive(Parser)]
#[command(
    name = "experiment",
    version,
    about = "Drift experiment harness: run strategies over request sequences"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List cases under experiment/cases.
    List,
    /// Run a case and persist every iteration.
    Run {
        case_id: String,
        /// Override the case's strategy.
        #[arg(long)]
        strategy: Option<StrategyKind>,
        /// Override the case's iteration bound.
        #[arg(long)]
        iterations: Option<u32>,
        #[arg(long, default_value_t = 1)]
        runs: u32,
    },
    /// Aggregate summaries of past runs.
    Report { case_id: String },
    /// Delete a case's results.
    Clean { case_id: String },
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(exit_codes::INVALID);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let repo_root = std::env::current_dir().context("resolve current dir")?;
    let root = cli::experiment_root(&repo_root);
    match cli.command {
        Command::List => cli::list_cases(&root),
        Command::Run {
            case_id,
            strategy,
            iterations,
            runs,
        } => cli::run_case_by_id(
            &root,
            &case_id,
            RunOptions {
                strategy,
                iterations,
            },
            runs,
        ),
        Command::Report { case_id } => cli::report_case(&root, &case_id),
        Command::Clean { case_id } => cli::clean_case(&root, &case_id),
    }
}
