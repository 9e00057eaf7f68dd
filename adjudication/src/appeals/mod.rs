//! Three-tier appeal ladder for conduct reports.
//!
//! ```text
//!  Local (5 jurors, 50%) ──appeal, stake ≥ 15──> High (9, 66%, merit review)
//!                                                  │
//!                                   appeal, stake ≥ 50
//!                                                  ▼
//!                              Supreme (15, 75%, final) ──> precedent book
//!                                                                │
//!  lower tiers bound by a matching precedent <───────────────────┘
//! ```
//!
//! Each case gets one judgment from the [`Adjudicator`] collaborator (or a
//! binding precedent), one jury vote and one sanction.

pub mod jury;
pub mod ladder;
pub mod precedent;
pub mod punishment;
pub mod tier;

pub use jury::{
    deliberate, empanel, BorderlineResolver, JurorProfile, JurorVote, JuryVerdict,
    MidpointResolver, Vote,
};
pub use ladder::{
    assess_merit, AdjudicationRequest, Adjudicator, AdjudicatorError, AppealError,
    AppealFiling, AppealLadder, Disposition, LadderCase, LadderStats, LadderStatus,
    MeritReview, StakeOutcome,
};
pub use precedent::{extract_keywords, Precedent, PrecedentBook};
pub use punishment::{sanction_for, Sanction, SanctionKind};
pub use tier::{AdjudicationModel, CourtTier, Judgment, Offense};
