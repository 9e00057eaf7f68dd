use std::path::PathBuf;
use std::time::Duration;

use adjudication::config::{ConfigError, CourtConfig};

#[derive(Debug, thiserror::Error)]
pub enum RunnerConfigError {
    #[error(transparent)]
    Court(#[from] ConfigError),

    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Runner settings: the court configuration plus everything the mocked
/// collaborators and the CLI need.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub court: CourtConfig,
    /// Seed for the judge panel and juror coin flips. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Simulated thinking time per judge.
    pub judge_latency: Duration,
    /// Pause between scripted advocate submissions.
    pub advocate_pace: Duration,
    pub audit_log: Option<PathBuf>,
    pub leaderboard: Option<PathBuf>,
    pub precedents: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            court: CourtConfig::default(),
            seed: None,
            judge_latency: Duration::ZERO,
            advocate_pace: Duration::ZERO,
            audit_log: None,
            leaderboard: None,
            precedents: None,
        }
    }
}

impl RunnerConfig {
    /// Read `COURT_CONFIG` (TOML path) and the runner's `COURT_*` variables.
    pub fn from_env() -> Result<Self, RunnerConfigError> {
        let court = match std::env::var("COURT_CONFIG") {
            Ok(path) => CourtConfig::load(path)?,
            Err(_) => CourtConfig::from_env()?,
        };
        Ok(Self {
            court,
            seed: parse_var("COURT_SEED")?,
            judge_latency: Duration::from_millis(
                parse_var("COURT_JUDGE_LATENCY_MS")?.unwrap_or(0),
            ),
            advocate_pace: Duration::from_millis(
                parse_var("COURT_ADVOCATE_PACE_MS")?.unwrap_or(0),
            ),
            audit_log: std::env::var("COURT_AUDIT_LOG").ok().map(PathBuf::from),
            leaderboard: std::env::var("COURT_LEADERBOARD").ok().map(PathBuf::from),
            precedents: std::env::var("COURT_PRECEDENTS").ok().map(PathBuf::from),
        })
    }

    /// Override the round ceiling, keeping the court configuration valid.
    pub fn with_rounds(mut self, rounds: u32) -> Result<Self, RunnerConfigError> {
        self.court.proceedings.max_rounds = rounds;
        self.court.validate()?;
        Ok(self)
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, RunnerConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| RunnerConfigError::Invalid {
                key,
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
