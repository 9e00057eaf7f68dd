//! Value types shared by the case record, the validator and the scorer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the two litigants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Plaintiff,
    Defendant,
}

impl Side {
    /// The other litigant.
    pub fn opponent(self) -> Self {
        match self {
            Self::Plaintiff => Self::Defendant,
            Self::Defendant => Self::Plaintiff,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plaintiff => "plaintiff",
            Self::Defendant => "defendant",
        }
    }

    /// Parse a wire role string. Only the two canonical lowercase names are accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "plaintiff" => Some(Self::Plaintiff),
            "defendant" => Some(Self::Defendant),
            _ => None,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a case. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    /// Created, not yet started.
    Waiting,
    /// Collecting arguments and scoring rounds.
    Live,
    /// Termination fired; verdict being computed.
    Deliberating,
    /// Verdict recorded. No further input is admitted.
    Resolved,
}

impl CaseStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved)
    }

    /// Valid transitions from this status.
    pub fn valid_transitions(self) -> &'static [CaseStatus] {
        match self {
            Self::Waiting => &[Self::Live],
            Self::Live => &[Self::Deliberating],
            Self::Deliberating => &[Self::Resolved],
            Self::Resolved => &[],
        }
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Live => write!(f, "live"),
            Self::Deliberating => write!(f, "deliberating"),
            Self::Resolved => write!(f, "resolved"),
        }
    }
}

/// Per-side health meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub plaintiff: u32,
    pub defendant: u32,
}

impl Health {
    pub fn new(starting: u32) -> Self {
        Self {
            plaintiff: starting,
            defendant: starting,
        }
    }

    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::Plaintiff => self.plaintiff,
            Side::Defendant => self.defendant,
        }
    }

    /// Subtract `amount` from one side, saturating at zero. Returns the new value.
    pub fn damage(&mut self, side: Side, amount: u32) -> u32 {
        let slot = match side {
            Side::Plaintiff => &mut self.plaintiff,
            Side::Defendant => &mut self.defendant,
        };
        *slot = slot.saturating_sub(amount);
        *slot
    }

    /// Absolute gap between the two sides.
    pub fn differential(&self) -> u32 {
        self.plaintiff.abs_diff(self.defendant)
    }
}

/// An admitted argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub id: String,
    pub sender_role: Side,
    pub content: String,
    /// In [0.0, 1.0].
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    /// The round the argument was admitted in.
    pub round: u32,
}

/// A raw submission as it arrives from an argument source.
///
/// Every field is optional so that shape problems surface as validator
/// rejections instead of deserialization failures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgumentSubmission {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub sender_role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Round the sender believes is current. Unset means "the current one".
    #[serde(default)]
    pub round: Option<u32>,
}

impl ArgumentSubmission {
    /// A fully populated submission stamped with the current time.
    pub fn new(side: Side, content: impl Into<String>, confidence: f64) -> Self {
        Self {
            message_id: None,
            sender_role: Some(side.as_str().to_string()),
            content: Some(content.into()),
            confidence: Some(confidence),
            timestamp: Some(Utc::now()),
            round: None,
        }
    }

    pub fn for_round(mut self, round: u32) -> Self {
        self.round = Some(round);
        self
    }
}

/// A judge's score for each side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SideScores {
    pub plaintiff: f64,
    pub defendant: f64,
}

impl SideScores {
    pub fn new(plaintiff: f64, defendant: f64) -> Self {
        Self {
            plaintiff,
            defendant,
        }
    }

    pub fn get(&self, side: Side) -> f64 {
        match side {
            Side::Plaintiff => self.plaintiff,
            Side::Defendant => self.defendant,
        }
    }

    /// Magnitude of disagreement between the two scores.
    pub fn diff(&self) -> f64 {
        (self.plaintiff - self.defendant).abs()
    }

    /// Side this judge favoured. An exact tie counts for the defendant.
    pub fn round_winner(&self) -> Side {
        if self.plaintiff > self.defendant {
            Side::Plaintiff
        } else {
            Side::Defendant
        }
    }

    /// Strict winner, `None` on a tie.
    pub fn strict_winner(&self) -> Option<Side> {
        if self.plaintiff > self.defendant {
            Some(Side::Plaintiff)
        } else if self.defendant > self.plaintiff {
            Some(Side::Defendant)
        } else {
            None
        }
    }

    pub fn is_finite(&self) -> bool {
        self.plaintiff.is_finite() && self.defendant.is_finite()
    }
}

/// One judge's scoring of one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub judge_id: String,
    pub round: u32,
    pub score: SideScores,
    pub reasoning: String,
    pub timestamp: DateTime<Utc>,
}

impl Evaluation {
    pub fn new(
        judge_id: impl Into<String>,
        round: u32,
        score: SideScores,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            judge_id: judge_id.into(),
            round,
            score,
            reasoning: reasoning.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Both arguments of a completed round, handed to judges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundArguments {
    pub round: u32,
    pub plaintiff: Argument,
    pub defendant: Argument,
}

impl RoundArguments {
    pub fn get(&self, side: Side) -> &Argument {
        match side {
            Side::Plaintiff => &self.plaintiff,
            Side::Defendant => &self.defendant,
        }
    }
}
