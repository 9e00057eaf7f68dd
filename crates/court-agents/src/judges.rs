//! Mock judge panel.
//!
//! This is a random number generator wearing six robes, not a rule engine.
//! Each judge starts both sides at 0.65 and adds a uniform perturbation
//! drawn from its bias:
//!
//! | bias              | plaintiff        | defendant        |
//! |-------------------|------------------|------------------|
//! | technical         | [-0.10, +0.15)   | [-0.05, +0.10)   |
//! | community         | [-0.05, +0.10)   | [-0.10, +0.15)   |
//! | on-chain          | [ 0.00, +0.15)   | [-0.10, +0.05)   |
//! | everyone else     | [-0.10, +0.10)   | [-0.10, +0.10)   |
//!
//! Scores are clamped to [0.3, 0.95] and rounded to two decimals.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use adjudication::case::{CaseState, Evaluation, RoundArguments, SideScores};
use adjudication::collaborators::{JudgeError, JudgeSource};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

const BASE_SCORE: f64 = 0.65;
const SCORE_FLOOR: f64 = 0.3;
const SCORE_CEILING: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgeBias {
    Technical,
    Community,
    OnChain,
    Governance,
    Merit,
    Protocol,
}

impl JudgeBias {
    /// Perturbation ranges for (plaintiff, defendant).
    fn ranges(self) -> ((f64, f64), (f64, f64)) {
        match self {
            Self::Technical => ((-0.10, 0.15), (-0.05, 0.10)),
            Self::Community => ((-0.05, 0.10), (-0.10, 0.15)),
            Self::OnChain => ((0.0, 0.15), (-0.10, 0.05)),
            Self::Governance | Self::Merit | Self::Protocol => ((-0.10, 0.10), (-0.10, 0.10)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct JudgeProfile {
    pub id: &'static str,
    pub name: &'static str,
    pub bias: JudgeBias,
}

/// The six sitting judges, in panel order.
pub const PANEL: [JudgeProfile; 6] = [
    JudgeProfile {
        id: "portdev",
        name: "PortDev",
        bias: JudgeBias::Technical,
    },
    JudgeProfile {
        id: "mikeweb",
        name: "MikeWeb",
        bias: JudgeBias::Community,
    },
    JudgeProfile {
        id: "keone",
        name: "Keone",
        bias: JudgeBias::OnChain,
    },
    JudgeProfile {
        id: "james",
        name: "James",
        bias: JudgeBias::Governance,
    },
    JudgeProfile {
        id: "harpal",
        name: "Harpal",
        bias: JudgeBias::Merit,
    },
    JudgeProfile {
        id: "anago",
        name: "Anago",
        bias: JudgeBias::Protocol,
    },
];

const PLAINTIFF_LEAN: [&str; 3] = [
    "Strong evidence presented by plaintiff",
    "Defendant rebuttal lacked supporting documentation",
    "Plaintiff logic more consistent with facts",
];

const DEFENDANT_LEAN: [&str; 3] = [
    "Defendant provided adequate counter-evidence",
    "Plaintiff claims insufficiently substantiated",
    "Defendant reasoning more persuasive",
];

pub fn profile(judge_id: &str) -> Option<&'static JudgeProfile> {
    PANEL.iter().find(|p| p.id == judge_id)
}

/// Seedable random judge panel.
pub struct BiasedJudgePanel {
    rng: Mutex<StdRng>,
    latency: Duration,
}

impl BiasedJudgePanel {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng: Mutex::new(rng),
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// One draw of scores and reasoning for a judge with `bias`.
    pub fn score(&self, bias: JudgeBias) -> (SideScores, &'static str) {
        let ((p_lo, p_hi), (d_lo, d_hi)) = bias.ranges();
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let plaintiff = finish(BASE_SCORE + rng.random_range(p_lo..p_hi));
        let defendant = finish(BASE_SCORE + rng.random_range(d_lo..d_hi));
        let lines = if plaintiff > defendant {
            &PLAINTIFF_LEAN
        } else {
            &DEFENDANT_LEAN
        };
        let reasoning = lines[rng.random_range(0..lines.len())];
        (SideScores::new(plaintiff, defendant), reasoning)
    }
}

fn finish(score: f64) -> f64 {
    (score.clamp(SCORE_FLOOR, SCORE_CEILING) * 100.0).round() / 100.0
}

#[async_trait]
impl JudgeSource for BiasedJudgePanel {
    async fn evaluate(
        &self,
        judge_id: &str,
        case: &CaseState,
        round: &RoundArguments,
    ) -> Result<Evaluation, JudgeError> {
        let profile = profile(judge_id).ok_or_else(|| JudgeError::Unavailable {
            judge_id: judge_id.to_string(),
            reason: "not on the panel".to_string(),
        })?;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let (scores, reasoning) = self.score(profile.bias);
        debug!(
            case_id = %case.case_id,
            round = round.round,
            judge = profile.name,
            plaintiff = scores.plaintiff,
            defendant = scores.defendant,
            "mock evaluation"
        );
        Ok(Evaluation::new(judge_id, round.round, scores, reasoning))
    }
}
