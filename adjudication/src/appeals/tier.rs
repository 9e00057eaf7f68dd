//! Court tiers, offense classes and judgments.

use serde::{Deserialize, Serialize};

use crate::config::{AppealsConfig, TierSettings};

/// Levels of the appeal ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtTier {
    /// Tier 1: first hearing, small jury, no stake.
    Local,
    /// Tier 2: appeals from Local, merit review first.
    High,
    /// Tier 3: final authority. Sets precedent, no further appeal.
    Supreme,
}

impl CourtTier {
    /// Tier an appeal from this one goes to. `None` for Supreme.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Local => Some(Self::High),
            Self::High => Some(Self::Supreme),
            Self::Supreme => None,
        }
    }

    pub fn is_final(self) -> bool {
        self.next().is_none()
    }

    pub fn level(self) -> u8 {
        match self {
            Self::Local => 1,
            Self::High => 2,
            Self::Supreme => 3,
        }
    }

    pub fn settings(self, config: &AppealsConfig) -> &TierSettings {
        match self {
            Self::Local => &config.local,
            Self::High => &config.high,
            Self::Supreme => &config.supreme,
        }
    }

    /// Adjudication model strength used at this tier.
    pub fn model(self) -> AdjudicationModel {
        match self {
            Self::Local => AdjudicationModel::Light,
            Self::High => AdjudicationModel::Strong,
            Self::Supreme => AdjudicationModel::Supreme,
        }
    }

    /// Lower tiers take a matching precedent as binding instead of adjudicating.
    pub fn bound_by_precedent(self) -> bool {
        !self.is_final()
    }

    /// Named juror strictness profiles, cycled to fill the jury.
    pub fn juror_profiles(self) -> &'static [(&'static str, f64)] {
        match self {
            Self::Local => &[
                ("strict", 0.7),
                ("moderate", 0.5),
                ("lenient", 0.3),
                ("balanced", 0.5),
                ("evidence", 0.6),
            ],
            Self::High => &[
                ("strict", 0.75),
                ("conservative", 0.7),
                ("moderate", 0.55),
                ("balanced", 0.55),
                ("evidence", 0.65),
                ("strict", 0.8),
                ("conservative", 0.72),
                ("moderate", 0.6),
                ("balanced", 0.58),
            ],
            Self::Supreme => &[
                ("strict", 0.8),
                ("conservative", 0.75),
                ("very_strict", 0.85),
                ("balanced", 0.6),
                ("evidence", 0.7),
                ("strict", 0.82),
                ("conservative", 0.78),
                ("moderate", 0.65),
                ("balanced", 0.62),
                ("strict", 0.83),
                ("evidence", 0.72),
                ("conservative", 0.76),
                ("balanced", 0.64),
                ("strict", 0.81),
                ("very_strict", 0.88),
            ],
        }
    }
}

impl std::fmt::Display for CourtTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::High => write!(f, "high"),
            Self::Supreme => write!(f, "supreme"),
        }
    }
}

/// Strength of the external adjudicator consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjudicationModel {
    Light,
    Strong,
    Supreme,
}

/// Classification of the reported conduct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Offense {
    Safe,
    Spam,
    Abuse,
    Malicious,
}

impl Offense {
    pub fn is_offense(self) -> bool {
        !matches!(self, Self::Safe)
    }
}

impl std::fmt::Display for Offense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Safe => write!(f, "safe"),
            Self::Spam => write!(f, "spam"),
            Self::Abuse => write!(f, "abuse"),
            Self::Malicious => write!(f, "malicious"),
        }
    }
}

/// The single judgment recorded for a ladder case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    pub offense: Offense,
    /// 0-100.
    pub confidence: u8,
    pub reasoning: String,
    pub model: AdjudicationModel,
    /// Precedent consulted or applied, if any.
    #[serde(default)]
    pub precedent_id: Option<String>,
    /// Taken straight from a precedent without consulting the adjudicator.
    #[serde(default)]
    pub from_precedent: bool,
}
