//! Event types broadcast while a case runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::case::{Health, Side};
use crate::verdict::Verdict;

/// All court notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CourtEvent {
    /// A round opened for arguments.
    RoundStarted {
        case_id: String,
        round: u32,
        max_rounds: u32,
        health: Health,
        timestamp: DateTime<Utc>,
    },

    /// An argument was admitted.
    ArgumentPosted {
        case_id: String,
        round: u32,
        side: Side,
        argument_id: String,
        content: String,
        confidence: f64,
        timestamp: DateTime<Utc>,
    },

    /// A judge's evaluation was admitted.
    JudgeEvaluation {
        case_id: String,
        round: u32,
        judge_id: String,
        plaintiff_score: f64,
        defendant_score: f64,
        reasoning: String,
        timestamp: DateTime<Utc>,
    },

    /// Damage was applied after scoring.
    HealthUpdate {
        case_id: String,
        round: u32,
        target: Side,
        damage: u32,
        median_diff: f64,
        health: Health,
        timestamp: DateTime<Utc>,
    },

    /// The panel never completed; the round was dropped without damage.
    RoundAbandoned {
        case_id: String,
        round: u32,
        missing_judges: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// The case reached a verdict.
    CaseResolved {
        case_id: String,
        verdict: Box<Verdict>,
        timestamp: DateTime<Utc>,
    },
}

impl CourtEvent {
    /// Wire name of the event.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RoundStarted { .. } => "round_started",
            Self::ArgumentPosted { .. } => "argument_posted",
            Self::JudgeEvaluation { .. } => "judge_evaluation",
            Self::HealthUpdate { .. } => "health_update",
            Self::RoundAbandoned { .. } => "round_abandoned",
            Self::CaseResolved { .. } => "case_resolved",
        }
    }

    pub fn case_id(&self) -> &str {
        match self {
            Self::RoundStarted { case_id, .. }
            | Self::ArgumentPosted { case_id, .. }
            | Self::JudgeEvaluation { case_id, .. }
            | Self::HealthUpdate { case_id, .. }
            | Self::RoundAbandoned { case_id, .. }
            | Self::CaseResolved { case_id, .. } => case_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::RoundStarted { timestamp, .. }
            | Self::ArgumentPosted { timestamp, .. }
            | Self::JudgeEvaluation { timestamp, .. }
            | Self::HealthUpdate { timestamp, .. }
            | Self::RoundAbandoned { timestamp, .. }
            | Self::CaseResolved { timestamp, .. } => *timestamp,
        }
    }

    /// Round the event refers to, if any.
    pub fn round(&self) -> Option<u32> {
        match self {
            Self::RoundStarted { round, .. }
            | Self::ArgumentPosted { round, .. }
            | Self::JudgeEvaluation { round, .. }
            | Self::HealthUpdate { round, .. }
            | Self::RoundAbandoned { round, .. } => Some(*round),
            Self::CaseResolved { .. } => None,
        }
    }

    /// Payload for the audit log: the event minus its tag, case id and timestamp.
    pub fn audit_data(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        if let Some(map) = value.as_object_mut() {
            map.remove("type");
            map.remove("case_id");
            map.remove("timestamp");
        }
        value
    }
}
