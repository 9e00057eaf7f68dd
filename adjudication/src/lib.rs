//! Agent Court adjudication core
//!
//! Two litigants (plaintiff and defendant) argue over a bounded number of
//! rounds. A judge panel scores every complete round, the median rule turns
//! the scores into damage against one side's health, and a verdict is
//! rendered on knockout, round limit or a decisive lead.
//!
//! # Modules
//!
//! - [`case`]: per-case state, the only thing the loop mutates
//! - [`validator`]: argument admission (fields, length, confidence, denylist,
//!   repetition, turn order)
//! - [`scoring`]: the median rule
//! - [`verdict`]: termination checks and verdict rendering
//! - [`orchestrator`]: the [`Court`] registry and the round loop
//! - [`events`]: broadcast events and the in-process bus
//! - [`audit`]: append-only audit trail
//! - [`leaderboard`]: agent standings across cases
//! - [`appeals`]: the Local / High / Supreme appeal ladder
//!
//! Everything outside the process (argument producers, judges, the appeal
//! adjudicator, jurors' tiebreaks) sits behind the traits in
//! [`collaborators`] and [`appeals`].

#![allow(clippy::uninlined_format_args)]

pub mod appeals;
pub mod audit;
pub mod case;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod events;
pub mod leaderboard;
pub mod orchestrator;
pub mod scoring;
pub mod validator;
pub mod verdict;

pub use audit::{AuditRecord, AuditSink, JsonlAuditLog, MemoryAuditLog};
pub use case::{
    Argument, ArgumentSubmission, CaseLimits, CaseState, CaseStatus, Evaluation, Health,
    RoundArguments, Side, SideScores,
};
pub use collaborators::{
    ArgumentSource, BroadcastSink, JudgeError, JudgeSource, NullBroadcast, QueuedArgumentSource,
};
pub use config::{ConfigError, CourtConfig};
pub use error::{CaseError, CourtError, StoreError};
pub use events::{CourtEvent, EventBus, SharedEventBus};
pub use leaderboard::{AgentStats, Leaderboard, MatchResult};
pub use orchestrator::{Admission, CaseOutcome, Court, NextAction, RoundConclusion, RoundOutcome};
pub use scoring::{apply_median_rule, DamageAssessment, MedianRule};
pub use validator::{Rejection, Validator};
pub use verdict::{render_verdict, Punishment, Ruling, TerminationReason, Verdict};
