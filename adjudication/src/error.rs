//! Error types for the adjudication core.
//!
//! Rejected arguments are not errors: see [`crate::validator::Rejection`].

use thiserror::Error;

use crate::case::CaseStatus;
use crate::config::ConfigError;

/// Violations of the case record's invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaseError {
    #[error("invalid status transition {from} -> {to}")]
    InvalidTransition { from: CaseStatus, to: CaseStatus },

    #[error("case is {status}, not accepting input")]
    NotAccepting { status: CaseStatus },

    #[error("argument stamped for round {got}, current round is {expected}")]
    WrongRound { expected: u32, got: u32 },

    #[error("{side} already argued in round {round}")]
    SlotFilled { side: String, round: u32 },

    #[error("judge {judge_id} already evaluated round {round}")]
    DuplicateEvaluation { judge_id: String, round: u32 },

    #[error("round {round} is not complete")]
    RoundIncomplete { round: u32 },
}

/// Failures of the file-backed stores (audit log, leaderboard, precedent book).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("integrity check failed at line {line}: expected {expected}, found {found}")]
    Integrity {
        line: usize,
        expected: String,
        found: String,
    },
}

/// Top-level error for [`crate::orchestrator::Court`] operations.
#[derive(Debug, Error)]
pub enum CourtError {
    #[error("unknown case: {0}")]
    UnknownCase(String),

    #[error("case already exists: {0}")]
    DuplicateCase(String),

    #[error(transparent)]
    Case(#[from] CaseError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
