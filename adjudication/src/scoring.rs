//! Median rule: turn a round's evaluations into a damage amount and a target.
//!
//! Magnitude comes from the interpolated median of per-judge score gaps.
//! The target comes from a single "median judge": evaluations are sorted by
//! gap ascending (stable) and the one at index `n / 2` is taken, so on an
//! even panel this is the upper of the two middle entries. The loser of that
//! judge's verdict takes the damage.

use serde::{Deserialize, Serialize};

use crate::case::{Evaluation, Side};
use crate::config::ScoringConfig;

/// Result of applying the median rule to one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageAssessment {
    /// Side that takes the damage.
    pub target: Side,
    pub damage: u32,
    pub median_diff: f64,
    /// Judge whose verdict picked the target.
    pub median_judge: String,
    pub reason: String,
}

/// Median-rule parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MedianRule {
    pub multiplier: f64,
    pub min_damage: u32,
    pub max_damage: u32,
}

impl Default for MedianRule {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}

impl MedianRule {
    pub fn from_config(config: &ScoringConfig) -> Self {
        Self {
            multiplier: config.damage_multiplier,
            min_damage: config.min_damage,
            max_damage: config.max_damage,
        }
    }

    /// `round(median_diff * multiplier)` clamped to `[min_damage, max_damage]`.
    ///
    /// Never panics: an inverted range resolves to `max_damage`, and NaN
    /// input falls to `min_damage`.
    pub fn damage_for(&self, median_diff: f64) -> u32 {
        let raw = (median_diff * self.multiplier).round();
        raw.max(self.min_damage as f64).min(self.max_damage as f64) as u32
    }

    /// Apply the rule. `None` on an empty list.
    pub fn apply(&self, evaluations: &[Evaluation]) -> Option<DamageAssessment> {
        if evaluations.is_empty() {
            return None;
        }

        let mut ranked: Vec<(f64, &Evaluation)> =
            evaluations.iter().map(|e| (e.score.diff(), e)).collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

        let median_diff = median(ranked.iter().map(|(d, _)| *d));
        let damage = self.damage_for(median_diff);

        let (judge_diff, judge) = ranked[ranked.len() / 2];
        let winner = judge.score.round_winner();
        let target = winner.opponent();

        Some(DamageAssessment {
            target,
            damage,
            median_diff,
            median_judge: judge.judge_id.clone(),
            reason: format!(
                "median judge {} favoured {} by {:.2}; median gap {:.3} across {} judges",
                judge.judge_id,
                winner,
                judge_diff,
                median_diff,
                evaluations.len()
            ),
        })
    }
}

/// Median rule with default parameters.
pub fn apply_median_rule(evaluations: &[Evaluation]) -> Option<DamageAssessment> {
    MedianRule::default().apply(evaluations)
}

/// Interpolated median of an ascending sequence.
fn median(sorted: impl ExactSizeIterator<Item = f64>) -> f64 {
    let values: Vec<f64> = sorted.collect();
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}
