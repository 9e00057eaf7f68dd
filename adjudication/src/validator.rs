//! Argument admission rules: shape, length, denylist, repetition, turn order.
//!
//! Nothing here mutates the case. A failed check yields a [`Rejection`]
//! which callers log and drop; the submitting side keeps its turn.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::case::{Argument, ArgumentSubmission, CaseState, CaseStatus, Side};
use crate::config::ValidationConfig;

/// Why a submission was not admitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    MissingField { field: String },
    UnknownRole { role: String },
    ContentLength { len: usize, min: usize, max: usize },
    ConfidenceOutOfRange { confidence: f64 },
    DeniedTerm { term: String },
    Repetitive { overlap: f64, threshold: f64 },
    OutOfTurn { side: Side },
    /// Both sides have argued; the round must be scored before more input.
    RoundAwaitingScore { round: u32 },
    WrongRound { expected: u32, got: u32 },
    NotAccepting { status: CaseStatus },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "missing field: {}", field),
            Self::UnknownRole { role } => write!(f, "unknown sender role: {}", role),
            Self::ContentLength { len, min, max } => {
                write!(f, "content length {} outside [{}, {}]", len, min, max)
            }
            Self::ConfidenceOutOfRange { confidence } => {
                write!(f, "confidence {} outside [0, 1]", confidence)
            }
            Self::DeniedTerm { term } => write!(f, "content mentions denied term '{}'", term),
            Self::Repetitive { overlap, threshold } => {
                write!(f, "word overlap {:.2} exceeds {:.2}", overlap, threshold)
            }
            Self::OutOfTurn { side } => write!(f, "{} is out of turn", side),
            Self::RoundAwaitingScore { round } => {
                write!(f, "round {} is complete and awaiting scoring", round)
            }
            Self::WrongRound { expected, got } => {
                write!(f, "stamped for round {}, current round is {}", got, expected)
            }
            Self::NotAccepting { status } => write!(f, "case is {}", status),
        }
    }
}

/// Whether `side` may submit next.
///
/// The plaintiff always opens. After that sides strictly alternate, across
/// round boundaries included.
pub fn check_turn_order(case: &CaseState, side: Side) -> bool {
    match case.last_argument_side() {
        None => side == Side::Plaintiff,
        Some(last) => last != side,
    }
}

/// Normalized bag-of-words for the repetition guard.
fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// `|current ∩ previous| / |previous|`, or 0 when `previous` has no words.
///
/// A cheap anti-stalling heuristic, not semantic similarity.
pub fn word_overlap(current: &str, previous: &str) -> f64 {
    let prev = word_set(previous);
    if prev.is_empty() {
        return 0.0;
    }
    let cur = word_set(current);
    let shared = cur.intersection(&prev).count();
    shared as f64 / prev.len() as f64
}

/// Checks submissions against a [`ValidationConfig`].
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidationConfig,
    denylist: Vec<String>,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        let denylist = config
            .denylist
            .iter()
            .map(|t| t.to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { config, denylist }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Boolean form of [`Validator::check`].
    pub fn validate(&self, submission: &ArgumentSubmission, case: &CaseState) -> bool {
        self.check(submission, case).is_ok()
    }

    /// Structural validation (everything except turn order).
    pub fn check(
        &self,
        submission: &ArgumentSubmission,
        case: &CaseState,
    ) -> Result<Argument, Rejection> {
        let role = required(&submission.sender_role, "sender_role")?;
        let content = required(&submission.content, "content")?;
        let confidence = *required(&submission.confidence, "confidence")?;
        let timestamp = *required(&submission.timestamp, "timestamp")?;

        let side = Side::parse(role).ok_or_else(|| Rejection::UnknownRole {
            role: role.clone(),
        })?;

        let len = content.chars().count();
        if len < self.config.min_len || len > self.config.max_len {
            return Err(Rejection::ContentLength {
                len,
                min: self.config.min_len,
                max: self.config.max_len,
            });
        }

        if !(0.0..=1.0).contains(&confidence) {
            return Err(Rejection::ConfidenceOutOfRange { confidence });
        }

        let lowered = content.to_lowercase();
        if let Some(term) = self.denylist.iter().find(|t| lowered.contains(t.as_str())) {
            return Err(Rejection::DeniedTerm { term: term.clone() });
        }

        let round = submission.round.unwrap_or(case.current_round);
        if round != case.current_round {
            return Err(Rejection::WrongRound {
                expected: case.current_round,
                got: round,
            });
        }

        let repetition = &self.config.repetition;
        if repetition.enabled {
            for previous in case.recent_arguments_by(side, repetition.window) {
                let overlap = word_overlap(content, &previous.content);
                if overlap > repetition.threshold {
                    return Err(Rejection::Repetitive {
                        overlap,
                        threshold: repetition.threshold,
                    });
                }
            }
        }

        Ok(Argument {
            id: submission
                .message_id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            sender_role: side,
            content: content.clone(),
            confidence,
            timestamp,
            round,
        })
    }

    /// Full admission check: case status, turn order, then [`Validator::check`].
    pub fn admit(
        &self,
        submission: &ArgumentSubmission,
        case: &CaseState,
    ) -> Result<Argument, Rejection> {
        if !case.accepts_input() {
            return Err(Rejection::NotAccepting {
                status: case.status,
            });
        }
        let role = required(&submission.sender_role, "sender_role")?;
        let side = Side::parse(role).ok_or_else(|| Rejection::UnknownRole {
            role: role.clone(),
        })?;
        if case.round_complete() {
            return Err(Rejection::RoundAwaitingScore {
                round: case.current_round,
            });
        }
        if !check_turn_order(case, side) {
            return Err(Rejection::OutOfTurn { side });
        }
        self.check(submission, case)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

fn required<'a, T>(value: &'a Option<T>, field: &str) -> Result<&'a T, Rejection> {
    value.as_ref().ok_or_else(|| Rejection::MissingField {
        field: field.to_string(),
    })
}
