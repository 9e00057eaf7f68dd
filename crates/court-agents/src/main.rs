//! Agent Court runner
//!
//! ```bash
//! # Scripted trial with a reproducible panel
//! court-agents trial --rounds 5 --seed 42
//! court-agents trial --json > verdict.json
//!
//! # Walk a report up the appeal ladder
//! court-agents appeal --evidence "malicious approval phishing"
//!
//! # Persist audit, leaderboard and precedents
//! COURT_AUDIT_LOG=./audit.jsonl COURT_LEADERBOARD=./leaderboard.json court-agents trial
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use adjudication::CaseOutcome;
use court_agents::config::RunnerConfig;
use court_agents::runner;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one scripted case between two advocates
    Trial {
        /// Round ceiling (overrides COURT_MAX_ROUNDS)
        #[arg(long)]
        rounds: Option<u32>,

        /// Seed for the judge panel (overrides COURT_SEED)
        #[arg(long)]
        seed: Option<u64>,

        /// Print the verdict as JSON on stdout
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// File a report and escalate it through the appeal ladder
    Appeal {
        /// Evidence text for the initial report
        #[arg(long)]
        evidence: String,

        /// Grounds used for every appeal
        #[arg(long)]
        grounds: Option<String>,

        /// Seed for borderline juror votes (overrides COURT_SEED)
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = RunnerConfig::from_env().context("loading court configuration")?;

    match args.command {
        Command::Trial { rounds, seed, json } => {
            if let Some(rounds) = rounds {
                config = config.with_rounds(rounds)?;
            }
            if seed.is_some() {
                config.seed = seed;
            }
            info!(
                rounds = config.court.proceedings.max_rounds,
                seed = ?config.seed,
                "Agent Court starting"
            );
            match runner::run_trial(&config).await? {
                CaseOutcome::Resolved(verdict) if json => {
                    println!("{}", serde_json::to_string_pretty(&verdict)?);
                }
                CaseOutcome::Resolved(verdict) => info!("{}", verdict.summary_line()),
                CaseOutcome::Aborted { round, status } => {
                    info!(round, status = %status, "trial aborted")
                }
            }
        }
        Command::Appeal {
            evidence,
            grounds,
            seed,
        } => {
            if seed.is_some() {
                config.seed = seed;
            }
            let cases = runner::run_appeal(&config, &evidence, grounds.as_deref()).await?;
            if let Some(last) = cases.last() {
                info!(tiers = cases.len(), "final ruling: {}", last.summary_line());
            }
        }
    }

    Ok(())
}
