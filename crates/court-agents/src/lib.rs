//! Mocked collaborators and runners for the adjudication core.
//!
//! - [`judges`]: a seedable six-judge panel with per-judge score bias
//! - [`advocates`]: scripted plaintiff and defendant arguments
//! - [`adjudicator`]: keyword adjudicator and coin-flip juror resolver for appeals
//! - [`config`]: runner settings read from `COURT_*` environment variables
//! - [`runner`]: end-to-end trial and appeal drivers used by the CLI

pub mod adjudicator;
pub mod advocates;
pub mod config;
pub mod judges;
pub mod runner;
