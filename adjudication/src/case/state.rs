//! Per-case mutable record: health, rounds, argument and evaluation history.
//!
//! All mutation goes through methods here so the invariants hold no matter
//! which caller drives the case:
//! - status only moves forward,
//! - health only decreases and never leaves `[0, starting_health]`,
//! - the round counter only increases,
//! - arguments and evaluations are append-only,
//! - nothing is appended once the case leaves `Live`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{Argument, CaseStatus, Evaluation, Health, RoundArguments, Side};
use crate::config::CourtConfig;
use crate::error::CaseError;
use crate::verdict::Verdict;

/// Limits fixed at case creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseLimits {
    pub max_rounds: u32,
    pub starting_health: u32,
    pub lead_threshold: u32,
}

impl CaseLimits {
    pub fn from_config(config: &CourtConfig) -> Self {
        Self {
            max_rounds: config.proceedings.max_rounds,
            starting_health: config.scoring.starting_health.min(100),
            lead_threshold: config.scoring.lead_threshold,
        }
    }
}

impl Default for CaseLimits {
    fn default() -> Self {
        Self::from_config(&CourtConfig::default())
    }
}

/// A status transition record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusTransition {
    pub from: CaseStatus,
    pub to: CaseStatus,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

/// Argument slots for the round in progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundSlots {
    pub plaintiff: Option<Argument>,
    pub defendant: Option<Argument>,
}

impl RoundSlots {
    fn slot_mut(&mut self, side: Side) -> &mut Option<Argument> {
        match side {
            Side::Plaintiff => &mut self.plaintiff,
            Side::Defendant => &mut self.defendant,
        }
    }

    pub fn get(&self, side: Side) -> Option<&Argument> {
        match side {
            Side::Plaintiff => self.plaintiff.as_ref(),
            Side::Defendant => self.defendant.as_ref(),
        }
    }
}

/// One dispute tracked by the adjudication state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseState {
    pub case_id: String,
    pub plaintiff_id: String,
    pub defendant_id: String,
    pub status: CaseStatus,
    /// Starts at 1.
    pub current_round: u32,
    pub limits: CaseLimits,
    pub health: Health,
    pub arguments: Vec<Argument>,
    pub evaluations: Vec<Evaluation>,
    pub current_round_arguments: RoundSlots,
    /// Rounds that were dropped because the judge panel never completed.
    pub abandoned_rounds: Vec<u32>,
    pub transitions: Vec<StatusTransition>,
    pub verdict: Option<Verdict>,
    pub created_at: DateTime<Utc>,
}

impl CaseState {
    pub fn new(case_id: &str, plaintiff_id: &str, defendant_id: &str, limits: CaseLimits) -> Self {
        Self {
            case_id: case_id.to_string(),
            plaintiff_id: plaintiff_id.to_string(),
            defendant_id: defendant_id.to_string(),
            status: CaseStatus::Waiting,
            current_round: 1,
            limits,
            health: Health::new(limits.starting_health),
            arguments: Vec::new(),
            evaluations: Vec::new(),
            current_round_arguments: RoundSlots::default(),
            abandoned_rounds: Vec::new(),
            transitions: Vec::new(),
            verdict: None,
            created_at: Utc::now(),
        }
    }

    pub fn max_rounds(&self) -> u32 {
        self.limits.max_rounds
    }

    /// Participant id behind a side.
    pub fn participant(&self, side: Side) -> &str {
        match side {
            Side::Plaintiff => &self.plaintiff_id,
            Side::Defendant => &self.defendant_id,
        }
    }

    /// Move to a new status, recording why.
    pub fn transition(&mut self, to: CaseStatus, reason: &str) -> Result<(), CaseError> {
        if !self.status.valid_transitions().contains(&to) {
            return Err(CaseError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.transitions.push(StatusTransition {
            from: self.status,
            to,
            timestamp: Utc::now(),
            reason: reason.to_string(),
        });
        self.status = to;
        Ok(())
    }

    /// `Waiting -> Live`.
    pub fn start(&mut self) -> Result<(), CaseError> {
        self.transition(CaseStatus::Live, "case opened")
    }

    pub fn accepts_input(&self) -> bool {
        self.status == CaseStatus::Live
    }

    fn ensure_live(&self) -> Result<(), CaseError> {
        if self.accepts_input() {
            Ok(())
        } else {
            Err(CaseError::NotAccepting {
                status: self.status,
            })
        }
    }

    /// Side of the most recently admitted argument.
    pub fn last_argument_side(&self) -> Option<Side> {
        self.arguments.last().map(|a| a.sender_role)
    }

    /// The sender's most recent admitted arguments, newest first.
    pub fn recent_arguments_by(&self, side: Side, limit: usize) -> Vec<&Argument> {
        self.arguments
            .iter()
            .rev()
            .filter(|a| a.sender_role == side)
            .take(limit)
            .collect()
    }

    /// Append an already-validated argument.
    pub fn add_argument(&mut self, argument: Argument) -> Result<(), CaseError> {
        self.ensure_live()?;
        if argument.round != self.current_round {
            return Err(CaseError::WrongRound {
                expected: self.current_round,
                got: argument.round,
            });
        }
        let round = self.current_round;
        let side = argument.sender_role;
        let slot = self.current_round_arguments.slot_mut(side);
        if slot.is_some() {
            return Err(CaseError::SlotFilled {
                side: side.to_string(),
                round,
            });
        }
        *slot = Some(argument.clone());
        self.arguments.push(argument);
        Ok(())
    }

    /// Both sides have argued this round.
    pub fn round_complete(&self) -> bool {
        self.current_round_arguments.plaintiff.is_some()
            && self.current_round_arguments.defendant.is_some()
    }

    /// The two arguments of the current round, once complete.
    pub fn round_arguments(&self) -> Option<RoundArguments> {
        let slots = &self.current_round_arguments;
        match (&slots.plaintiff, &slots.defendant) {
            (Some(p), Some(d)) => Some(RoundArguments {
                round: self.current_round,
                plaintiff: p.clone(),
                defendant: d.clone(),
            }),
            _ => None,
        }
    }

    /// Append one judge's evaluation for the current round.
    pub fn add_evaluation(&mut self, evaluation: Evaluation) -> Result<(), CaseError> {
        self.ensure_live()?;
        if evaluation.round != self.current_round {
            return Err(CaseError::WrongRound {
                expected: self.current_round,
                got: evaluation.round,
            });
        }
        if self.has_evaluation(&evaluation.judge_id, evaluation.round) {
            return Err(CaseError::DuplicateEvaluation {
                judge_id: evaluation.judge_id,
                round: evaluation.round,
            });
        }
        self.evaluations.push(evaluation);
        Ok(())
    }

    pub fn has_evaluation(&self, judge_id: &str, round: u32) -> bool {
        self.evaluations
            .iter()
            .any(|e| e.round == round && e.judge_id == judge_id)
    }

    /// Evaluations recorded for a round, in admission order.
    pub fn round_evaluations(&self, round: u32) -> Vec<Evaluation> {
        self.evaluations
            .iter()
            .filter(|e| e.round == round)
            .cloned()
            .collect()
    }

    /// Whether every judge in `panel` has scored the current round.
    pub fn round_scored(&self, panel: &[String]) -> bool {
        panel
            .iter()
            .all(|j| self.has_evaluation(j, self.current_round))
    }

    /// Apply damage to one side. Returns the new health.
    pub fn apply_damage(&mut self, side: Side, damage: u32) -> Result<u32, CaseError> {
        self.ensure_live()?;
        Ok(self.health.damage(side, damage))
    }

    /// Record that the current round could not be scored.
    pub fn abandon_round(&mut self) -> Result<(), CaseError> {
        self.ensure_live()?;
        if !self.abandoned_rounds.contains(&self.current_round) {
            self.abandoned_rounds.push(self.current_round);
        }
        Ok(())
    }

    /// Increment the round and clear the slots. Returns the new round.
    pub fn advance_round(&mut self) -> Result<u32, CaseError> {
        self.ensure_live()?;
        if !self.round_complete() {
            return Err(CaseError::RoundIncomplete {
                round: self.current_round,
            });
        }
        self.current_round += 1;
        self.current_round_arguments = RoundSlots::default();
        Ok(self.current_round)
    }

    /// `Live -> Deliberating`.
    pub fn deliberate(&mut self, reason: &str) -> Result<(), CaseError> {
        self.transition(CaseStatus::Deliberating, reason)
    }

    /// `Deliberating -> Resolved`, storing the verdict.
    pub fn resolve(&mut self, verdict: Verdict) -> Result<(), CaseError> {
        self.transition(CaseStatus::Resolved, "verdict rendered")?;
        self.verdict = Some(verdict);
        Ok(())
    }

    /// Compact one-line status.
    pub fn status_line(&self) -> String {
        format!(
            "[{}] {} | round {}/{} | health p={} d={} | {} args, {} evals",
            self.status,
            self.case_id,
            self.current_round,
            self.limits.max_rounds,
            self.health.plaintiff,
            self.health.defendant,
            self.arguments.len(),
            self.evaluations.len()
        )
    }
}
