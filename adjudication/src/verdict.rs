//! Termination checks and verdict rendering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::case::{CaseState, Evaluation, Health, Side};

/// Why a case stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerminationReason {
    /// A side's health reached zero.
    Knockout { side: Side },
    /// The round ceiling was reached.
    RoundLimit { round: u32 },
    /// The health gap exceeded the lead threshold.
    DecisiveLead { lead: u32 },
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Knockout { side } => write!(f, "knockout ({})", side),
            Self::RoundLimit { round } => write!(f, "round_limit ({})", round),
            Self::DecisiveLead { lead } => write!(f, "decisive_lead ({})", lead),
        }
    }
}

/// First termination condition that holds, if any.
pub fn termination_reason(case: &CaseState) -> Option<TerminationReason> {
    for side in [Side::Plaintiff, Side::Defendant] {
        if case.health.get(side) == 0 {
            return Some(TerminationReason::Knockout { side });
        }
    }
    if case.current_round >= case.limits.max_rounds {
        return Some(TerminationReason::RoundLimit {
            round: case.current_round,
        });
    }
    let lead = case.health.differential();
    if lead > case.limits.lead_threshold {
        return Some(TerminationReason::DecisiveLead { lead });
    }
    None
}

pub fn should_resolve(case: &CaseState) -> bool {
    termination_reason(case).is_some()
}

/// Outcome by health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ruling {
    Plaintiff,
    Defendant,
    Draw,
}

impl Ruling {
    pub fn winner(self) -> Option<Side> {
        match self {
            Self::Plaintiff => Some(Side::Plaintiff),
            Self::Defendant => Some(Side::Defendant),
            Self::Draw => None,
        }
    }
}

impl std::fmt::Display for Ruling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plaintiff => write!(f, "plaintiff"),
            Self::Defendant => write!(f, "defendant"),
            Self::Draw => write!(f, "draw"),
        }
    }
}

/// Per-judge win counts. Informational only; health decides the case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub plaintiff: u32,
    pub defendant: u32,
}

/// Count evaluations where one side strictly out-scored the other.
pub fn tally_votes(evaluations: &[Evaluation]) -> VoteTally {
    let mut tally = VoteTally::default();
    for e in evaluations {
        match e.score.strict_winner() {
            Some(Side::Plaintiff) => tally.plaintiff += 1,
            Some(Side::Defendant) => tally.defendant += 1,
            None => {}
        }
    }
    tally
}

/// Sanction against the losing participant, by final health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Punishment {
    Dismissed,
    FormalWarning,
    PostingRestriction,
    Suspension,
}

impl Punishment {
    /// 0 → suspension, below 30 → posting restriction, below 50 → warning.
    pub fn for_loser_health(health: u32) -> Self {
        match health {
            0 => Self::Suspension,
            h if h < 30 => Self::PostingRestriction,
            h if h < 50 => Self::FormalWarning,
            _ => Self::Dismissed,
        }
    }
}

impl std::fmt::Display for Punishment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dismissed => write!(f, "dismissed"),
            Self::FormalWarning => write!(f, "formal_warning"),
            Self::PostingRestriction => write!(f, "posting_restriction"),
            Self::Suspension => write!(f, "suspension"),
        }
    }
}

/// Final judgment of a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub case_id: String,
    pub ruling: Ruling,
    pub winner_id: Option<String>,
    pub loser_id: Option<String>,
    pub final_health: Health,
    pub votes: VoteTally,
    pub appeal_allowed: bool,
    pub punishment: Punishment,
    pub reason: Option<TerminationReason>,
    pub total_rounds: u32,
    pub total_arguments: usize,
    pub resolved_at: DateTime<Utc>,
}

impl Verdict {
    pub fn summary_line(&self) -> String {
        format!(
            "[{}] {} | health p={} d={} | votes {}-{} | {}{}",
            self.ruling,
            self.case_id,
            self.final_health.plaintiff,
            self.final_health.defendant,
            self.votes.plaintiff,
            self.votes.defendant,
            self.punishment,
            if self.appeal_allowed { " | appealable" } else { "" }
        )
    }
}

/// Compute the verdict for a case from its current state.
pub fn render_verdict(case: &CaseState) -> Verdict {
    let health = case.health;
    let ruling = if health.plaintiff > health.defendant {
        Ruling::Plaintiff
    } else if health.defendant > health.plaintiff {
        Ruling::Defendant
    } else {
        Ruling::Draw
    };

    let votes = tally_votes(&case.evaluations);
    let appeal_allowed = votes.plaintiff.abs_diff(votes.defendant) <= 1 || ruling == Ruling::Draw;

    let (winner_id, loser_id, punishment) = match ruling.winner() {
        Some(side) => {
            let loser = side.opponent();
            (
                Some(case.participant(side).to_string()),
                Some(case.participant(loser).to_string()),
                Punishment::for_loser_health(health.get(loser)),
            )
        }
        None => (None, None, Punishment::Dismissed),
    };

    Verdict {
        case_id: case.case_id.clone(),
        ruling,
        winner_id,
        loser_id,
        final_health: health,
        votes,
        appeal_allowed,
        punishment,
        reason: termination_reason(case),
        total_rounds: case.current_round,
        total_arguments: case.arguments.len(),
        resolved_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{CaseLimits, SideScores};

    fn live_case() -> CaseState {
        let mut case = CaseState::new("case-1", "alice", "bob", CaseLimits::default());
        case.start().unwrap();
        case
    }

    // ── Termination ──

    #[test]
    fn test_fresh_case_does_not_resolve() {
        assert!(!should_resolve(&live_case()));
    }

    #[test]
    fn test_knockout_resolves_regardless_of_round() {
        let mut case = live_case();
        case.health = Health {
            plaintiff: 0,
            defendant: 40,
        };
        assert!(should_resolve(&case));
        assert_eq!(
            termination_reason(&case),
            Some(TerminationReason::Knockout {
                side: Side::Plaintiff
            })
        );
    }

    #[test]
    fn test_round_ceiling_resolves() {
        let mut case = live_case();
        case.current_round = 5;
        case.health = Health {
            plaintiff: 60,
            defendant: 60,
        };
        assert!(should_resolve(&case));
        assert_eq!(
            termination_reason(&case),
            Some(TerminationReason::RoundLimit { round: 5 })
        );
    }

    #[test]
    fn test_lead_must_exceed_threshold() {
        let mut case = live_case();
        case.health = Health {
            plaintiff: 100,
            defendant: 20,
        };
        assert!(!should_resolve(&case));
        case.health.defendant = 19;
        assert_eq!(
            termination_reason(&case),
            Some(TerminationReason::DecisiveLead { lead: 81 })
        );
    }

    // ── Votes and verdict ──

    #[test]
    fn test_tally_counts_strict_wins_only() {
        let evals = vec![
            Evaluation::new("a", 1, SideScores::new(0.8, 0.6), ""),
            Evaluation::new("b", 1, SideScores::new(0.6, 0.6), ""),
            Evaluation::new("c", 1, SideScores::new(0.4, 0.9), ""),
            Evaluation::new("d", 2, SideScores::new(0.7, 0.5), ""),
        ];
        assert_eq!(
            tally_votes(&evals),
            VoteTally {
                plaintiff: 2,
                defendant: 1
            }
        );
    }

    #[test]
    fn test_verdict_follows_health_not_votes() {
        let mut case = live_case();
        case.evaluations = vec![
            Evaluation::new("a", 1, SideScores::new(0.9, 0.3), ""),
            Evaluation::new("b", 1, SideScores::new(0.9, 0.3), ""),
            Evaluation::new("c", 1, SideScores::new(0.9, 0.3), ""),
        ];
        case.health = Health {
            plaintiff: 25,
            defendant: 70,
        };
        let verdict = render_verdict(&case);
        assert_eq!(verdict.ruling, Ruling::Defendant);
        assert_eq!(verdict.winner_id.as_deref(), Some("bob"));
        assert_eq!(verdict.loser_id.as_deref(), Some("alice"));
        assert_eq!(verdict.punishment, Punishment::PostingRestriction);
        assert!(!verdict.appeal_allowed);
    }

    #[test]
    fn test_draw_is_appealable_and_dismissed() {
        let mut case = live_case();
        case.health = Health {
            plaintiff: 55,
            defendant: 55,
        };
        case.evaluations = vec![
            Evaluation::new("a", 1, SideScores::new(0.9, 0.3), ""),
            Evaluation::new("b", 1, SideScores::new(0.9, 0.3), ""),
            Evaluation::new("c", 1, SideScores::new(0.9, 0.3), ""),
        ];
        let verdict = render_verdict(&case);
        assert_eq!(verdict.ruling, Ruling::Draw);
        assert!(verdict.winner_id.is_none());
        assert_eq!(verdict.punishment, Punishment::Dismissed);
        assert!(verdict.appeal_allowed);
    }

    #[test]
    fn test_close_vote_is_appealable() {
        let mut case = live_case();
        case.health.defendant = 90;
        case.evaluations = vec![
            Evaluation::new("a", 1, SideScores::new(0.9, 0.3), ""),
            Evaluation::new("b", 1, SideScores::new(0.3, 0.9), ""),
            Evaluation::new("c", 1, SideScores::new(0.9, 0.3), ""),
        ];
        let verdict = render_verdict(&case);
        assert_eq!(verdict.ruling, Ruling::Plaintiff);
        assert!(verdict.appeal_allowed);
        assert_eq!(verdict.punishment, Punishment::Dismissed);
    }

    #[test]
    fn test_punishment_table() {
        assert_eq!(Punishment::for_loser_health(0), Punishment::Suspension);
        assert_eq!(Punishment::for_loser_health(29), Punishment::PostingRestriction);
        assert_eq!(Punishment::for_loser_health(30), Punishment::FormalWarning);
        assert_eq!(Punishment::for_loser_health(49), Punishment::FormalWarning);
        assert_eq!(Punishment::for_loser_health(50), Punishment::Dismissed);
    }
}
