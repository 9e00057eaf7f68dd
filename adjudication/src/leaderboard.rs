//! Per-agent standings across resolved cases.
//!
//! An explicit storage handle: open it at startup, pass it to whoever
//! records results, flush it at shutdown.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::case::CaseState;
use crate::error::StoreError;
use crate::verdict::{Ruling, Verdict};

const STARTING_REPUTATION: i64 = 1000;
const WIN_REPUTATION: i64 = 25;
const LOSS_REPUTATION: i64 = 15;
const REPUTATION_FLOOR: i64 = 100;

/// How a case ended for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    Won,
    Lost,
    Drawn,
}

/// Running totals for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    pub agent_id: String,
    pub agent_name: String,
    pub cases_won: u32,
    pub cases_lost: u32,
    #[serde(default)]
    pub cases_drawn: u32,
    pub total_debates: u32,
    pub total_score: f64,
    pub reputation: i64,
}

impl AgentStats {
    pub fn new(agent_id: &str, agent_name: &str) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            agent_name: agent_name.to_string(),
            cases_won: 0,
            cases_lost: 0,
            cases_drawn: 0,
            total_debates: 0,
            total_score: 0.0,
            reputation: STARTING_REPUTATION,
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.total_debates == 0 {
            0.0
        } else {
            self.cases_won as f64 / self.total_debates as f64
        }
    }

    pub fn avg_score(&self) -> f64 {
        if self.total_debates == 0 {
            0.0
        } else {
            self.total_score / self.total_debates as f64
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LeaderboardFile {
    agents: BTreeMap<String, AgentStats>,
    last_updated: Option<DateTime<Utc>>,
}

/// Agent rankings backed by an optional JSON file.
#[derive(Debug)]
pub struct Leaderboard {
    path: Option<PathBuf>,
    agents: BTreeMap<String, AgentStats>,
    dirty: bool,
}

impl Leaderboard {
    /// Load from `path`, or start empty if it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let agents = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            let file: LeaderboardFile = serde_json::from_str(&raw)?;
            file.agents
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: Some(path),
            agents,
            dirty: false,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            agents: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Write pending changes. A no-op for in-memory boards.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            self.dirty = false;
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = LeaderboardFile {
            agents: self.agents.clone(),
            last_updated: Some(Utc::now()),
        };
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(&file)?)?;
        std::fs::rename(&tmp, path)?;
        self.dirty = false;
        Ok(())
    }

    /// Record one case result for an agent.
    pub fn record_result(
        &mut self,
        agent_id: &str,
        agent_name: &str,
        result: MatchResult,
        score: f64,
        case_id: &str,
    ) {
        let stats = self
            .agents
            .entry(agent_id.to_string())
            .or_insert_with(|| AgentStats::new(agent_id, agent_name));
        stats.total_debates += 1;
        stats.total_score += score;
        match result {
            MatchResult::Won => {
                stats.cases_won += 1;
                stats.reputation += WIN_REPUTATION;
            }
            MatchResult::Lost => {
                stats.cases_lost += 1;
                stats.reputation -= LOSS_REPUTATION;
            }
            MatchResult::Drawn => stats.cases_drawn += 1,
        }
        stats.reputation = stats.reputation.max(REPUTATION_FLOOR);
        self.dirty = true;
        info!(
            agent_id,
            case_id,
            ?result,
            reputation = stats.reputation,
            "leaderboard updated"
        );
    }

    /// Record both participants of a verdict. Score is final health / 100.
    pub fn record_verdict(&mut self, case: &CaseState, verdict: &Verdict) {
        let (p_result, d_result) = match verdict.ruling {
            Ruling::Plaintiff => (MatchResult::Won, MatchResult::Lost),
            Ruling::Defendant => (MatchResult::Lost, MatchResult::Won),
            Ruling::Draw => (MatchResult::Drawn, MatchResult::Drawn),
        };
        let p_score = verdict.final_health.plaintiff as f64 / 100.0;
        let d_score = verdict.final_health.defendant as f64 / 100.0;
        let (p_id, d_id) = (&case.plaintiff_id, &case.defendant_id);
        self.record_result(p_id, p_id, p_result, p_score, &verdict.case_id);
        self.record_result(d_id, d_id, d_result, d_score, &verdict.case_id);
    }

    /// Top agents by (reputation, win rate), descending.
    pub fn rankings(&self, limit: usize) -> Vec<&AgentStats> {
        let mut sorted: Vec<&AgentStats> = self.agents.values().collect();
        sorted.sort_by(|a, b| {
            b.reputation
                .cmp(&a.reputation)
                .then_with(|| b.win_rate().total_cmp(&a.win_rate()))
        });
        sorted.truncate(limit);
        sorted
    }

    /// 1-based rank, or 0 if the agent has no record.
    pub fn rank_of(&self, agent_id: &str) -> usize {
        self.rankings(usize::MAX)
            .iter()
            .position(|a| a.agent_id == agent_id)
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    pub fn stats(&self, agent_id: &str) -> Option<&AgentStats> {
        self.agents.get(agent_id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{CaseLimits, Health};
    use crate::verdict::render_verdict;
    use tempfile::tempdir;

    #[test]
    fn test_reputation_deltas() {
        let mut board = Leaderboard::in_memory();
        board.record_result("a", "Alice", MatchResult::Won, 0.8, "c1");
        board.record_result("b", "Bob", MatchResult::Lost, 0.2, "c1");
        board.record_result("c", "Carol", MatchResult::Drawn, 0.5, "c2");
        assert_eq!(board.stats("a").unwrap().reputation, 1025);
        assert_eq!(board.stats("b").unwrap().reputation, 985);
        assert_eq!(board.stats("c").unwrap().reputation, 1000);
        assert_eq!(board.stats("c").unwrap().cases_drawn, 1);
    }

    #[test]
    fn test_reputation_floor() {
        let mut board = Leaderboard::in_memory();
        for i in 0..70 {
            board.record_result("a", "Alice", MatchResult::Lost, 0.0, &format!("c{}", i));
        }
        assert_eq!(board.stats("a").unwrap().reputation, 100);
        assert_eq!(board.stats("a").unwrap().total_debates, 70);
    }

    #[test]
    fn test_rankings_and_rank_of() {
        let mut board = Leaderboard::in_memory();
        board.record_result("a", "Alice", MatchResult::Won, 1.0, "c1");
        board.record_result("b", "Bob", MatchResult::Lost, 0.0, "c1");
        board.record_result("c", "Carol", MatchResult::Won, 1.0, "c2");
        board.record_result("c", "Carol", MatchResult::Won, 1.0, "c3");

        let top = board.rankings(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].agent_id, "c");
        assert_eq!(board.rank_of("a"), 2);
        assert_eq!(board.rank_of("b"), 3);
        assert_eq!(board.rank_of("nobody"), 0);
    }

    #[test]
    fn test_win_rate_and_avg_score() {
        let mut stats = AgentStats::new("a", "Alice");
        assert_eq!(stats.win_rate(), 0.0);
        stats.total_debates = 4;
        stats.cases_won = 1;
        stats.total_score = 2.0;
        assert_eq!(stats.win_rate(), 0.25);
        assert_eq!(stats.avg_score(), 0.5);
    }

    #[test]
    fn test_record_verdict() {
        let mut case = CaseState::new("case-1", "alice", "bob", CaseLimits::default());
        case.health = Health {
            plaintiff: 70,
            defendant: 20,
        };
        let verdict = render_verdict(&case);
        let mut board = Leaderboard::in_memory();
        board.record_verdict(&case, &verdict);
        let alice = board.stats("alice").unwrap();
        assert_eq!(alice.cases_won, 1);
        assert!((alice.total_score - 0.7).abs() < 1e-9);
        assert_eq!(board.stats("bob").unwrap().cases_lost, 1);
    }

    #[test]
    fn test_flush_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("leaderboard.json");
        {
            let mut board = Leaderboard::open(&path).unwrap();
            assert!(board.is_empty());
            board.record_result("a", "Alice", MatchResult::Won, 0.9, "c1");
            board.flush().unwrap();
        }
        let board = Leaderboard::open(&path).unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board.stats("a").unwrap().reputation, 1025);
    }
}
