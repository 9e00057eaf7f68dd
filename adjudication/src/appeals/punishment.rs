//! Sanction table for convictions on the ladder.

use serde::{Deserialize, Serialize};

use super::tier::{CourtTier, Offense};

const HIGH_COURT_DURATION_FACTOR: f64 = 0.8;
const SUPREME_DURATION_FACTOR: f64 = 1.2;
const SUPREME_EXTRA_REPUTATION: i32 = -10;
const SUPREME_CLEAR_GUILT_CONFIDENCE: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SanctionKind {
    None,
    Warning,
    TempBan,
    Isolation,
}

impl std::fmt::Display for SanctionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Warning => write!(f, "warning"),
            Self::TempBan => write!(f, "temp_ban"),
            Self::Isolation => write!(f, "isolation"),
        }
    }
}

/// What the executor applies to a convicted defendant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sanction {
    pub kind: SanctionKind,
    pub duration_secs: u64,
    pub reputation_impact: i32,
}

impl Sanction {
    pub const NONE: Sanction = Sanction {
        kind: SanctionKind::None,
        duration_secs: 0,
        reputation_impact: 0,
    };

    /// Base entry for an offense, before tier modifiers.
    pub fn base(offense: Offense) -> Self {
        match offense {
            Offense::Safe => Self::NONE,
            Offense::Spam => Self {
                kind: SanctionKind::Warning,
                duration_secs: 0,
                reputation_impact: -5,
            },
            Offense::Abuse => Self {
                kind: SanctionKind::TempBan,
                duration_secs: 86_400,
                reputation_impact: -15,
            },
            Offense::Malicious => Self {
                kind: SanctionKind::Isolation,
                duration_secs: 604_800,
                reputation_impact: -25,
            },
        }
    }
}

/// Sanction for a conviction at `tier`.
///
/// High Court shortens durations; the Supreme Court lengthens them and adds
/// a reputation penalty when guilt is clear (confidence above 90).
pub fn sanction_for(offense: Offense, confidence: u8, tier: CourtTier) -> Sanction {
    let mut sanction = Sanction::base(offense);
    match tier {
        CourtTier::Local => {}
        CourtTier::High => {
            sanction.duration_secs = scale(sanction.duration_secs, HIGH_COURT_DURATION_FACTOR);
        }
        CourtTier::Supreme => {
            if confidence > SUPREME_CLEAR_GUILT_CONFIDENCE {
                sanction.duration_secs = scale(sanction.duration_secs, SUPREME_DURATION_FACTOR);
                sanction.reputation_impact += SUPREME_EXTRA_REPUTATION;
            }
        }
    }
    sanction
}

fn scale(secs: u64, factor: f64) -> u64 {
    (secs as f64 * factor) as u64
}
