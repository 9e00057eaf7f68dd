//! Jury deliberation: each juror compares the judgment's confidence with a
//! personal threshold derived from their strictness.
//!
//! threshold = 50 + strictness * 30
//!
//! - safe verdict, or confidence below threshold - 20 → not guilty
//! - confidence at or above threshold → guilty
//! - anything in between is borderline and goes to a [`BorderlineResolver`]

use serde::{Deserialize, Serialize};

use super::tier::{CourtTier, Judgment, Offense};
use crate::config::TierSettings;

/// Width of the borderline band below a juror's threshold.
const BORDERLINE_BAND: f64 = 20.0;

/// One seated juror.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurorProfile {
    pub name: String,
    pub kind: String,
    pub strictness: f64,
}

impl JurorProfile {
    pub fn threshold(&self) -> f64 {
        50.0 + self.strictness * 30.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vote {
    Guilty,
    NotGuilty,
}

/// Decides borderline votes.
pub trait BorderlineResolver: Send + Sync {
    fn resolve(&self, juror: &JurorProfile, judgment: &Judgment) -> Vote;
}

/// Deterministic default: guilty when confidence sits in the upper half of
/// the borderline band.
#[derive(Debug, Default, Clone, Copy)]
pub struct MidpointResolver;

impl BorderlineResolver for MidpointResolver {
    fn resolve(&self, juror: &JurorProfile, judgment: &Judgment) -> Vote {
        if judgment.confidence as f64 >= juror.threshold() - BORDERLINE_BAND / 2.0 {
            Vote::Guilty
        } else {
            Vote::NotGuilty
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurorVote {
    pub juror: String,
    pub kind: String,
    pub vote: Vote,
    pub threshold: f64,
    pub borderline: bool,
}

/// Tally of one jury.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JuryVerdict {
    pub tier: CourtTier,
    pub votes: Vec<JurorVote>,
    pub guilty: u32,
    pub not_guilty: u32,
    pub guilty_ratio: f64,
    pub conviction_threshold: f64,
    pub convicted: bool,
}

/// Seat `size` jurors by cycling the tier's profiles.
pub fn empanel(tier: CourtTier, size: u32) -> Vec<JurorProfile> {
    let profiles = tier.juror_profiles();
    (0..size as usize)
        .map(|i| {
            let (kind, strictness) = profiles[i % profiles.len()];
            JurorProfile {
                name: format!("{}_juror_{}", tier, i),
                kind: kind.to_string(),
                strictness,
            }
        })
        .collect()
}

/// A single juror's vote. `None` means borderline.
pub fn rule_vote(juror: &JurorProfile, judgment: &Judgment) -> Option<Vote> {
    let threshold = juror.threshold();
    let confidence = judgment.confidence as f64;
    if judgment.offense == Offense::Safe || confidence < threshold - BORDERLINE_BAND {
        Some(Vote::NotGuilty)
    } else if confidence >= threshold {
        Some(Vote::Guilty)
    } else {
        None
    }
}

/// Seat a jury for `tier` and vote on `judgment`.
pub fn deliberate(
    tier: CourtTier,
    settings: &TierSettings,
    judgment: &Judgment,
    resolver: &dyn BorderlineResolver,
) -> JuryVerdict {
    let votes: Vec<JurorVote> = empanel(tier, settings.jury_size)
        .into_iter()
        .map(|juror| {
            let (vote, borderline) = match rule_vote(&juror, judgment) {
                Some(vote) => (vote, false),
                None => (resolver.resolve(&juror, judgment), true),
            };
            JurorVote {
                threshold: juror.threshold(),
                juror: juror.name,
                kind: juror.kind,
                vote,
                borderline,
            }
        })
        .collect();

    let guilty = votes.iter().filter(|v| v.vote == Vote::Guilty).count() as u32;
    let not_guilty = votes.len() as u32 - guilty;
    let guilty_ratio = if settings.jury_size == 0 {
        0.0
    } else {
        guilty as f64 / settings.jury_size as f64
    };

    JuryVerdict {
        tier,
        votes,
        guilty,
        not_guilty,
        guilty_ratio,
        conviction_threshold: settings.conviction_threshold,
        convicted: guilty_ratio >= settings.conviction_threshold,
    }
}
