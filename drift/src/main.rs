//! Score a document against the drift invariants.
//!
//! Prints the drift score as JSON (or the violation report) and exits with
//! [`exit_codes::OK`] when the document conforms, [`exit_codes::DRIFT`] when
//! it does not.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use drift::core::feedback::violation_report;
use drift::core::score::{DriftScore, score_artifact};
use drift::core::types::AtypicalityLevel;
use drift::{exit_codes, logging};

#[derive(Parser)]
#[command(
    name = "drift",
    version,
    about = "Structural drift scoring for policy documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score a Markdown document (`-` reads stdin).
    Score {
        path: PathBuf,
        /// Word-casing constraint: none, word-initial or third-character.
        #[arg(long, default_value = "none")]
        atypicality: AtypicalityLevel,
        /// Print the violation report instead of JSON.
        #[arg(long)]
        report: bool,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Score {
            path,
            atypicality,
            report,
        } => cmd_score(&path, atypicality, report),
    }
}

fn cmd_score(path: &Path, level: AtypicalityLevel, report: bool) -> Result<i32> {
    let text = read_document(path)?;
    let score = score_artifact(&text, level);
    println!("{}", render(&score, report)?);
    Ok(if score.is_conforming() {
        exit_codes::OK
    } else {
        exit_codes::DRIFT
    })
}

fn read_document(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("read document from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(path).with_context(|| format!("read document {}", path.display()))
}

fn render(score: &DriftScore, report: bool) -> Result<String> {
    if !report {
        return serde_json::to_string_pretty(score).context("serialize drift score");
    }
    let mut out = format!("total drift: {}", score.total);
    let lines = violation_report(score);
    if !lines.is_empty() {
        out.push('\n');
        out.push_str(&lines);
    }
    Ok(out)
}
