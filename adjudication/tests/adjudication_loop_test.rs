//! Integration tests for the adjudication loop
//!
//! Drives cases through the public `Court` API with queued submissions and
//! scripted judge panels, checking the round loop end to end and the
//! properties that must hold for every case.

use std::sync::Arc;
use std::time::Duration;

use adjudication::case::{CaseLimits, Health};
use adjudication::scoring::apply_median_rule;
use adjudication::validator::check_turn_order;
use adjudication::verdict::{should_resolve, termination_reason};
use adjudication::{
    Admission, ArgumentSubmission, CaseOutcome, CaseState, CaseStatus, Court, CourtConfig,
    CourtError, CourtEvent, Evaluation, EventBus, JudgeError, JudgeSource, MemoryAuditLog,
    Punishment, QueuedArgumentSource, Rejection, RoundArguments, Ruling, Side, SideScores,
    TerminationReason,
};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

const PLAINTIFF_TEXTS: [&str; 5] = [
    "The defendant shipped an unaudited bridge contract and ignored three separate reports.",
    "Logs from the incident show user funds stuck for nine days before anyone replied.",
    "Their own changelog admits the fix landed a week after the exploit became public.",
    "Independent researchers flagged the same flaw twice and got no acknowledgement at all.",
    "A responsible team pauses deposits immediately; this one kept taking new money.",
];

const DEFENDANT_TEXTS: [&str; 5] = [
    "Every report was triaged within a day and the flagged paths were patched before launch.",
    "Funds were never at risk because the timelock blocked withdrawals during the review period.",
    "The public changelog lists the mitigation date, which predates any known exploit attempt.",
    "Researchers received bounty payouts, and their emails are archived in our tracker.",
    "Deposits stayed open since the vulnerable module was already disabled by governance vote.",
];

/// Every judge returns the same scores.
struct ConstantJudges(SideScores);

#[async_trait]
impl JudgeSource for ConstantJudges {
    async fn evaluate(
        &self,
        judge_id: &str,
        _case: &CaseState,
        round: &RoundArguments,
    ) -> Result<Evaluation, JudgeError> {
        Ok(Evaluation::new(judge_id, round.round, self.0, "scripted"))
    }
}

/// Never answers within any reasonable timeout.
struct StalledJudges;

#[async_trait]
impl JudgeSource for StalledJudges {
    async fn evaluate(
        &self,
        judge_id: &str,
        _case: &CaseState,
        _round: &RoundArguments,
    ) -> Result<Evaluation, JudgeError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(JudgeError::Unavailable {
            judge_id: judge_id.to_string(),
            reason: "stalled".into(),
        })
    }
}

fn court(
    config: CourtConfig,
    queue: &Arc<QueuedArgumentSource>,
    judges: impl JudgeSource + 'static,
) -> Court {
    Court::new(config, queue.clone(), Arc::new(judges)).unwrap()
}

/// Queue `rounds` full rounds of alternating submissions.
fn queue_rounds(queue: &QueuedArgumentSource, case_id: &str, rounds: usize) {
    for i in 0..rounds {
        queue.push(
            case_id,
            ArgumentSubmission::new(Side::Plaintiff, PLAINTIFF_TEXTS[i], 0.8),
        );
        queue.push(
            case_id,
            ArgumentSubmission::new(Side::Defendant, DEFENDANT_TEXTS[i], 0.7),
        );
    }
}

// ── Concrete scenarios ──

#[test]
fn test_scenario_1_three_judges_median() {
    let evals = vec![
        Evaluation::new("a", 1, SideScores::new(0.9, 0.5), ""),
        Evaluation::new("b", 1, SideScores::new(0.8, 0.6), ""),
        Evaluation::new("c", 1, SideScores::new(0.7, 0.7), ""),
    ];
    let assessment = apply_median_rule(&evals).unwrap();
    assert_eq!(assessment.target, Side::Defendant);
    assert_eq!(assessment.damage, 5);
}

#[test]
fn test_scenario_2_single_judge() {
    let evals = vec![Evaluation::new("a", 1, SideScores::new(0.3, 0.9), "")];
    let assessment = apply_median_rule(&evals).unwrap();
    assert_eq!(assessment.target, Side::Plaintiff);
    assert_eq!(assessment.damage, 12);
}

#[test]
fn test_scenario_3_defendant_cannot_open() {
    let mut case = CaseState::new("c", "alice", "bob", CaseLimits::default());
    case.start().unwrap();
    assert!(case.arguments.is_empty());
    assert!(!check_turn_order(&case, Side::Defendant));
    assert!(check_turn_order(&case, Side::Plaintiff));
}

#[test]
fn test_scenario_4_knockout_ignores_round() {
    let mut case = CaseState::new("c", "alice", "bob", CaseLimits::default());
    case.start().unwrap();
    case.health = Health {
        plaintiff: 0,
        defendant: 40,
    };
    assert_eq!(case.current_round, 1);
    assert!(should_resolve(&case));
    assert_eq!(
        termination_reason(&case),
        Some(TerminationReason::Knockout {
            side: Side::Plaintiff
        })
    );
}

#[test]
fn test_scenario_5_round_ceiling() {
    let mut case = CaseState::new("c", "alice", "bob", CaseLimits::default());
    case.start().unwrap();
    case.current_round = 5;
    case.health = Health {
        plaintiff: 60,
        defendant: 60,
    };
    assert!(should_resolve(&case));
    assert_eq!(
        termination_reason(&case),
        Some(TerminationReason::RoundLimit { round: 5 })
    );
}

// ── Full runs ──

#[tokio::test]
async fn test_run_case_to_knockout() {
    let queue = QueuedArgumentSource::new().shared();
    let bus = EventBus::new().shared();
    let audit = Arc::new(MemoryAuditLog::new());
    // Defendant takes every judge by the full margin: diff 1.0 → 20 per round.
    let court = court(
        CourtConfig::default(),
        &queue,
        ConstantJudges(SideScores::new(0.0, 1.0)),
    )
    .with_broadcast(bus.clone())
    .with_audit(audit.clone());

    let id = court.create_case("alice", "bob").await.unwrap();
    let mut events = bus.subscribe_case(&id);
    queue_rounds(&queue, &id, 5);

    let outcome = court.run_case(&id, CancellationToken::new()).await.unwrap();
    let verdict = match outcome {
        CaseOutcome::Resolved(v) => v,
        other => panic!("expected resolution, got {:?}", other),
    };
    // Resolution releases the case's argument queue.
    assert_eq!(queue.open_queues(), 0);

    // 100 → 80 → 60 → 40 → 20 → 0. A lead of exactly 80 is not decisive.
    assert_eq!(verdict.ruling, Ruling::Defendant);
    assert_eq!(verdict.final_health.plaintiff, 0);
    assert_eq!(verdict.final_health.defendant, 100);
    assert_eq!(
        verdict.reason,
        Some(TerminationReason::Knockout {
            side: Side::Plaintiff
        })
    );
    assert_eq!(verdict.punishment, Punishment::Suspension);
    assert_eq!(verdict.winner_id.as_deref(), Some("bob"));
    assert_eq!(verdict.votes.defendant, 30);
    assert!(!verdict.appeal_allowed);
    assert_eq!(verdict.total_arguments, 10);

    let state = court.snapshot(&id).await.unwrap();
    assert_eq!(state.status, CaseStatus::Resolved);
    assert_eq!(state.verdict.as_ref(), Some(&verdict));

    let mut kinds = Vec::new();
    while let Ok(event) = events.try_recv() {
        kinds.push(event.event_type());
    }
    assert_eq!(kinds.iter().filter(|k| **k == "health_update").count(), 5);
    assert_eq!(kinds.last(), Some(&"case_resolved"));
    assert!(audit.event_types(&id).contains(&"case_resolved".to_string()));

    // Running again returns the stored verdict.
    let again = court.run_case(&id, CancellationToken::new()).await.unwrap();
    assert_eq!(again, CaseOutcome::Resolved(verdict));
}

#[tokio::test]
async fn test_run_case_to_round_limit() {
    let mut config = CourtConfig::default();
    config.proceedings.max_rounds = 2;
    let queue = QueuedArgumentSource::new().shared();
    // diff 0.3 → 6 damage per round against the plaintiff.
    let court = court(config, &queue, ConstantJudges(SideScores::new(0.5, 0.8)));

    let id = court.create_case("alice", "bob").await.unwrap();
    queue_rounds(&queue, &id, 2);

    let outcome = court.run_case(&id, CancellationToken::new()).await.unwrap();
    let CaseOutcome::Resolved(verdict) = outcome else {
        panic!("expected resolution");
    };
    assert_eq!(verdict.final_health.plaintiff, 88);
    assert_eq!(verdict.reason, Some(TerminationReason::RoundLimit { round: 2 }));
    assert_eq!(verdict.punishment, Punishment::Dismissed);
    assert_eq!(verdict.total_rounds, 2);
}

#[tokio::test]
async fn test_rejected_submissions_keep_the_turn() {
    let mut config = CourtConfig::default();
    config.proceedings.max_rounds = 1;
    let queue = QueuedArgumentSource::new().shared();
    let court = court(config, &queue, ConstantJudges(SideScores::new(0.7, 0.6)));
    let id = court.create_case("alice", "bob").await.unwrap();

    // Out of turn, too short, denylisted, then the real round.
    queue.push(&id, ArgumentSubmission::new(Side::Defendant, DEFENDANT_TEXTS[0], 0.7));
    queue.push(&id, ArgumentSubmission::new(Side::Plaintiff, "too short", 0.7));
    queue.push(
        &id,
        ArgumentSubmission::new(
            Side::Plaintiff,
            "We will win this easily because the other side has nothing to show.",
            0.9,
        ),
    );
    queue_rounds(&queue, &id, 1);

    let outcome = court.run_case(&id, CancellationToken::new()).await.unwrap();
    let CaseOutcome::Resolved(verdict) = outcome else {
        panic!("expected resolution");
    };
    assert_eq!(verdict.ruling, Ruling::Plaintiff);
    let state = court.snapshot(&id).await.unwrap();
    assert_eq!(state.arguments.len(), 2);
    assert_eq!(state.arguments[0].content, PLAINTIFF_TEXTS[0]);
}

#[tokio::test]
async fn test_cancel_while_collecting() {
    let queue = QueuedArgumentSource::new().shared();
    let court = court(
        CourtConfig::default(),
        &queue,
        ConstantJudges(SideScores::new(0.5, 0.5)),
    );
    let id = court.create_case("alice", "bob").await.unwrap();
    queue.push(&id, ArgumentSubmission::new(Side::Plaintiff, PLAINTIFF_TEXTS[0], 0.8));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let (outcome, _) = tokio::join!(court.run_case(&id, cancel), async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    assert_eq!(
        outcome.unwrap(),
        CaseOutcome::Aborted {
            round: 1,
            status: CaseStatus::Live
        }
    );
    let state = court.snapshot(&id).await.unwrap();
    assert_eq!(state.arguments.len(), 1);
    assert_eq!(state.health, Health::new(100));
}

#[tokio::test(start_paused = true)]
async fn test_stalled_panel_abandons_round() {
    let mut config = CourtConfig::default();
    config.proceedings.max_rounds = 1;
    config.proceedings.judge_timeout_ms = 100;
    let queue = QueuedArgumentSource::new().shared();
    let court = court(config, &queue, StalledJudges);
    let id = court.create_case("alice", "bob").await.unwrap();
    queue_rounds(&queue, &id, 1);

    // The abandoned round still counts toward the ceiling.
    let outcome = court.run_case(&id, CancellationToken::new()).await.unwrap();
    let CaseOutcome::Resolved(verdict) = outcome else {
        panic!("expected resolution");
    };
    assert_eq!(verdict.ruling, Ruling::Draw);
    assert_eq!(verdict.punishment, Punishment::Dismissed);
    assert!(verdict.appeal_allowed);
    let state = court.snapshot(&id).await.unwrap();
    assert_eq!(state.abandoned_rounds, vec![1]);
    assert!(state.evaluations.is_empty());
}

#[tokio::test]
async fn test_unknown_case_fails_every_operation() {
    let queue = QueuedArgumentSource::new().shared();
    let court = court(
        CourtConfig::default(),
        &queue,
        ConstantJudges(SideScores::new(0.5, 0.5)),
    );
    let sub = ArgumentSubmission::new(Side::Plaintiff, PLAINTIFF_TEXTS[0], 0.8);
    assert!(matches!(
        court.handle_submission("ghost", sub).await,
        Err(CourtError::UnknownCase(_))
    ));
    assert!(matches!(
        court.score_round("ghost").await,
        Err(CourtError::UnknownCase(_))
    ));
    assert!(matches!(
        court.run_case("ghost", CancellationToken::new()).await,
        Err(CourtError::UnknownCase(_))
    ));
}

// ── Properties ──

#[tokio::test]
async fn test_turn_alternation_holds_for_mixed_traffic() {
    let queue = QueuedArgumentSource::new().shared();
    let court = court(
        CourtConfig::default(),
        &queue,
        ConstantJudges(SideScores::new(0.6, 0.6)),
    );
    let id = court.create_case("alice", "bob").await.unwrap();
    court.start_case(&id).await.unwrap();

    let sides = [
        Side::Defendant,
        Side::Plaintiff,
        Side::Plaintiff,
        Side::Defendant,
        Side::Defendant,
    ];
    let mut admitted = 0;
    for (i, side) in sides.iter().enumerate() {
        let text = match side {
            Side::Plaintiff => PLAINTIFF_TEXTS[i],
            Side::Defendant => DEFENDANT_TEXTS[i],
        };
        let admission = court
            .handle_submission(&id, ArgumentSubmission::new(*side, text, 0.5))
            .await
            .unwrap();
        if admission.is_admitted() {
            admitted += 1;
        } else {
            assert!(matches!(
                admission,
                Admission::Rejected(Rejection::OutOfTurn { .. })
            ));
        }
    }
    assert_eq!(admitted, 2);

    let state = court.snapshot(&id).await.unwrap();
    assert_eq!(state.arguments[0].sender_role, Side::Plaintiff);
    for pair in state.arguments.windows(2) {
        assert_ne!(pair[0].sender_role, pair[1].sender_role);
    }
    assert_eq!(state.round_complete(), state.round_complete());
}

#[tokio::test]
async fn test_health_stays_in_bounds_every_round() {
    let queue = QueuedArgumentSource::new().shared();
    let court = court(
        CourtConfig::default(),
        &queue,
        ConstantJudges(SideScores::new(1.0, 0.0)),
    );
    let id = court.create_case("alice", "bob").await.unwrap();
    court.start_case(&id).await.unwrap();

    for i in 0..5 {
        let p = ArgumentSubmission::new(Side::Plaintiff, PLAINTIFF_TEXTS[i], 0.8);
        let d = ArgumentSubmission::new(Side::Defendant, DEFENDANT_TEXTS[i], 0.8);
        court.handle_submission(&id, p).await.unwrap();
        court.handle_submission(&id, d).await.unwrap();
        court.score_round(&id).await.unwrap();
        court.conclude_round(&id).await.unwrap();

        let state = court.snapshot(&id).await.unwrap();
        for side in [Side::Plaintiff, Side::Defendant] {
            assert!(state.health.get(side) <= 100);
        }
        if state.status == CaseStatus::Resolved {
            break;
        }
    }
    assert_eq!(court.snapshot(&id).await.unwrap().status, CaseStatus::Resolved);
}

#[tokio::test]
async fn test_resolution_is_final() {
    let mut config = CourtConfig::default();
    config.proceedings.max_rounds = 1;
    let queue = QueuedArgumentSource::new().shared();
    let court = court(config, &queue, ConstantJudges(SideScores::new(0.6, 0.7)));
    let id = court.create_case("alice", "bob").await.unwrap();
    queue_rounds(&queue, &id, 1);
    court.run_case(&id, CancellationToken::new()).await.unwrap();

    let before = court.snapshot(&id).await.unwrap();
    assert!(should_resolve(&before));

    let late = ArgumentSubmission::new(Side::Plaintiff, PLAINTIFF_TEXTS[1], 0.8);
    let admission = court.handle_submission(&id, late).await.unwrap();
    assert!(matches!(
        admission,
        Admission::Rejected(Rejection::NotAccepting { .. })
    ));

    let after = court.snapshot(&id).await.unwrap();
    assert!(should_resolve(&after));
    assert_eq!(after.arguments.len(), before.arguments.len());
    assert_eq!(after.status, CaseStatus::Resolved);
}

#[tokio::test]
async fn test_events_carry_case_id() {
    let queue = QueuedArgumentSource::new().shared();
    let bus = EventBus::new().shared();
    let mut config = CourtConfig::default();
    config.proceedings.max_rounds = 1;
    let court = court(config, &queue, ConstantJudges(SideScores::new(0.6, 0.7)))
        .with_broadcast(bus.clone());
    let first = court.create_case("alice", "bob").await.unwrap();
    let second = court.create_case("carol", "dave").await.unwrap();
    let mut only_second = bus.subscribe_case(&second);

    queue_rounds(&queue, &first, 1);
    queue_rounds(&queue, &second, 1);
    court.run_case(&first, CancellationToken::new()).await.unwrap();
    court.run_case(&second, CancellationToken::new()).await.unwrap();

    let mut count = 0;
    while let Ok(event) = only_second.try_recv() {
        assert_eq!(event.case_id(), second);
        if let CourtEvent::CaseResolved { verdict, .. } = &event {
            assert_eq!(verdict.case_id, second);
        }
        count += 1;
    }
    assert!(count > 0);
}
