//! Case record: the single unit of mutation in the court.
//!
//! ```text
//! Waiting ──start()──▶ Live ──termination──▶ Deliberating ──verdict──▶ Resolved
//!                       │ ▲
//!                       ▼ │ advance_round()
//!                 Collecting → RoundScoring
//! ```

pub mod state;
pub mod types;

pub use state::{CaseLimits, CaseState, RoundSlots, StatusTransition};
pub use types::{
    Argument, ArgumentSubmission, CaseStatus, Evaluation, Health, RoundArguments, Side,
    SideScores,
};
