//! End-to-end runs of the CLI drivers with mocked collaborators.

use adjudication::appeals::{CourtTier, Disposition, LadderStatus};
use adjudication::{CaseOutcome, JsonlAuditLog, Leaderboard};
use court_agents::config::RunnerConfig;
use court_agents::runner::{self, DEFENDANT_ID, PLAINTIFF_ID};

const DRAIN_EVIDENCE: &str = "Malicious approval phishing, repeated and targeted at new wallets";

// ── Trial ──

#[tokio::test]
async fn test_seeded_trial_records_audit_and_leaderboard() {
    let dir = tempfile::tempdir().unwrap();
    let audit_path = dir.path().join("audit.jsonl");
    let board_path = dir.path().join("leaderboard.json");

    let config = RunnerConfig {
        seed: Some(42),
        audit_log: Some(audit_path.clone()),
        leaderboard: Some(board_path.clone()),
        ..Default::default()
    }
    .with_rounds(3)
    .unwrap();

    let verdict = match runner::run_trial(&config).await.unwrap() {
        CaseOutcome::Resolved(verdict) => verdict,
        other => panic!("expected a verdict, got {:?}", other),
    };
    assert!(verdict.total_rounds >= 1 && verdict.total_rounds <= 3);
    assert!(verdict.final_health.plaintiff <= 100 && verdict.final_health.defendant <= 100);

    let audit = JsonlAuditLog::open(&audit_path).unwrap();
    assert!(audit.verify_integrity().unwrap() > 0);
    let history = audit.case_history(&verdict.case_id).unwrap();
    assert_eq!(history.last().unwrap().event, "case_resolved");

    let board = Leaderboard::open(&board_path).unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board.stats(PLAINTIFF_ID).unwrap().total_debates, 1);
    assert_eq!(board.stats(DEFENDANT_ID).unwrap().total_debates, 1);
}

#[tokio::test]
async fn test_trial_without_persistence() {
    let config = RunnerConfig {
        seed: Some(7),
        ..Default::default()
    }
    .with_rounds(2)
    .unwrap();
    let outcome = runner::run_trial(&config).await.unwrap();
    assert!(matches!(outcome, CaseOutcome::Resolved(_)));
}

// ── Appeals ──

#[tokio::test]
async fn test_malicious_report_climbs_to_supreme_court() {
    let dir = tempfile::tempdir().unwrap();
    let book = dir.path().join("precedents.json");
    let config = RunnerConfig {
        seed: Some(1),
        precedents: Some(book.clone()),
        ..Default::default()
    };

    let cases = runner::run_appeal(&config, DRAIN_EVIDENCE, None).await.unwrap();
    let tiers: Vec<CourtTier> = cases.iter().map(|c| c.tier).collect();
    assert_eq!(tiers, [CourtTier::Local, CourtTier::High, CourtTier::Supreme]);
    assert!(cases.iter().all(|c| c.status == LadderStatus::Closed));
    assert!(cases
        .iter()
        .all(|c| c.disposition == Some(Disposition::Convicted)));
    assert!(cases[2].precedent_created.is_some());
    assert!(book.exists());

    // The next report with the same markers is bound at the Local tier.
    let cases = runner::run_appeal(&config, "Repeated, targeted drain attempts", None)
        .await
        .unwrap();
    let judgment = cases[0].judgment.as_ref().unwrap();
    assert!(judgment.from_precedent);
}

#[tokio::test]
async fn test_safe_report_stops_at_local() {
    let config = RunnerConfig::default();
    let cases = runner::run_appeal(&config, "a friendly hello in general chat", None)
        .await
        .unwrap();
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].disposition, Some(Disposition::Acquitted));
}
