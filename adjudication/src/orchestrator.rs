//! The court: case registry plus the adjudication loop.
//!
//! Each case lives behind its own `tokio::sync::Mutex`, which serializes
//! every mutation of that case. Cases never coordinate with each other.
//! Judges are called concurrently against a snapshot taken under the lock
//! and their evaluations are admitted afterwards, again under the lock.
//!
//! The loop can be driven step by step (`start_case`, `handle_submission`,
//! `score_round`, `conclude_round`) or end to end with [`Court::run_case`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::audit::AuditSink;
use crate::case::{
    Argument, ArgumentSubmission, CaseLimits, CaseState, CaseStatus, Evaluation, RoundArguments,
    Side,
};
use crate::collaborators::{ArgumentSource, BroadcastSink, JudgeError, JudgeSource, NullBroadcast};
use crate::config::CourtConfig;
use crate::error::{CaseError, CourtError};
use crate::events::CourtEvent;
use crate::scoring::{DamageAssessment, MedianRule};
use crate::validator::{check_turn_order, Rejection, Validator};
use crate::verdict::{render_verdict, termination_reason, Verdict};

/// Pause before re-polling a source that reported nothing without waiting.
const IDLE_POLL_BACKOFF: Duration = Duration::from_millis(50);

/// Shared handle to one case.
pub type SharedCase = Arc<Mutex<CaseState>>;

/// Result of offering a submission to a case.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Admitted {
        argument: Argument,
        round_complete: bool,
    },
    Rejected(Rejection),
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted { .. })
    }
}

/// Result of scoring a complete round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundOutcome {
    /// Every judge answered; damage was applied.
    Scored(DamageAssessment),
    /// The panel never completed; no evaluations admitted, no damage.
    Abandoned {
        round: u32,
        missing_judges: Vec<String>,
    },
}

/// What happened after a round was scored.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundConclusion {
    NextRound(u32),
    Resolved(Verdict),
}

/// How [`Court::run_case`] ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseOutcome {
    Resolved(Verdict),
    /// Cancelled while collecting; the case is left as it was.
    Aborted { round: u32, status: CaseStatus },
}

/// What a case needs next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    Start,
    AwaitArgument { side: Side },
    ScoreRound,
    Done,
}

/// Case registry and adjudication loop.
pub struct Court {
    config: CourtConfig,
    validator: Validator,
    rule: MedianRule,
    cases: RwLock<HashMap<String, SharedCase>>,
    arguments: Arc<dyn ArgumentSource>,
    judges: Arc<dyn JudgeSource>,
    broadcast: Arc<dyn BroadcastSink>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl Court {
    /// Build a court. Fails if `config` does not pass [`CourtConfig::validate`].
    pub fn new(
        config: CourtConfig,
        arguments: Arc<dyn ArgumentSource>,
        judges: Arc<dyn JudgeSource>,
    ) -> Result<Self, CourtError> {
        config.validate()?;
        Ok(Self {
            validator: Validator::new(config.validation.clone()),
            rule: MedianRule::from_config(&config.scoring),
            config,
            cases: RwLock::new(HashMap::new()),
            arguments,
            judges,
            broadcast: Arc::new(NullBroadcast),
            audit: None,
        })
    }

    pub fn with_broadcast(mut self, sink: Arc<dyn BroadcastSink>) -> Self {
        self.broadcast = sink;
        self
    }

    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn config(&self) -> &CourtConfig {
        &self.config
    }

    // ── Registry ──

    /// Create a case with a generated id.
    pub async fn create_case(
        &self,
        plaintiff_id: &str,
        defendant_id: &str,
    ) -> Result<String, CourtError> {
        let case_id = format!("case-{}", uuid::Uuid::new_v4());
        self.create_case_with_id(&case_id, plaintiff_id, defendant_id)
            .await
    }

    /// Create a case under a caller-chosen id.
    pub async fn create_case_with_id(
        &self,
        case_id: &str,
        plaintiff_id: &str,
        defendant_id: &str,
    ) -> Result<String, CourtError> {
        let mut cases = self.cases.write().await;
        if cases.contains_key(case_id) {
            return Err(CourtError::DuplicateCase(case_id.to_string()));
        }
        let state = CaseState::new(
            case_id,
            plaintiff_id,
            defendant_id,
            CaseLimits::from_config(&self.config),
        );
        cases.insert(case_id.to_string(), Arc::new(Mutex::new(state)));
        drop(cases);

        info!(case_id, plaintiff_id, defendant_id, "case created");
        self.audit(
            case_id,
            "case_created",
            json!({ "plaintiff_id": plaintiff_id, "defendant_id": defendant_id }),
        );
        Ok(case_id.to_string())
    }

    async fn case(&self, case_id: &str) -> Result<SharedCase, CourtError> {
        self.cases
            .read()
            .await
            .get(case_id)
            .cloned()
            .ok_or_else(|| CourtError::UnknownCase(case_id.to_string()))
    }

    /// A copy of the case as it stands.
    pub async fn snapshot(&self, case_id: &str) -> Result<CaseState, CourtError> {
        let case = self.case(case_id).await?;
        let snapshot = case.lock().await.clone();
        Ok(snapshot)
    }

    /// Ids of every registered case, sorted.
    pub async fn case_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.cases.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn next_action(&self, case_id: &str) -> Result<NextAction, CourtError> {
        let case = self.case(case_id).await?;
        let state = case.lock().await;
        Ok(match state.status {
            CaseStatus::Waiting => NextAction::Start,
            CaseStatus::Live if state.round_complete() => NextAction::ScoreRound,
            CaseStatus::Live => {
                let side = if check_turn_order(&state, Side::Plaintiff) {
                    Side::Plaintiff
                } else {
                    Side::Defendant
                };
                NextAction::AwaitArgument { side }
            }
            CaseStatus::Deliberating | CaseStatus::Resolved => NextAction::Done,
        })
    }

    // ── Loop steps ──

    /// `Waiting -> Live` and announce round 1.
    pub async fn start_case(&self, case_id: &str) -> Result<(), CourtError> {
        let case = self.case(case_id).await?;
        let mut state = case.lock().await;
        state.start()?;
        info!(case_id, max_rounds = state.max_rounds(), "case started");
        self.audit(case_id, "case_started", json!({ "round": state.current_round }));
        self.emit(CourtEvent::RoundStarted {
            case_id: case_id.to_string(),
            round: state.current_round,
            max_rounds: state.max_rounds(),
            health: state.health,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Validate and admit one submission. Rejections are logged and returned, not raised.
    pub async fn handle_submission(
        &self,
        case_id: &str,
        submission: ArgumentSubmission,
    ) -> Result<Admission, CourtError> {
        let case = self.case(case_id).await?;
        let mut state = case.lock().await;

        let argument = match self.validator.admit(&submission, &state) {
            Ok(argument) => argument,
            Err(rejection) => {
                warn!(
                    case_id,
                    round = state.current_round,
                    side = submission.sender_role.as_deref().unwrap_or("?"),
                    %rejection,
                    "argument rejected"
                );
                return Ok(Admission::Rejected(rejection));
            }
        };

        state.add_argument(argument.clone())?;
        let round_complete = state.round_complete();
        info!(
            case_id,
            round = argument.round,
            side = %argument.sender_role,
            round_complete,
            "argument admitted"
        );
        self.emit(CourtEvent::ArgumentPosted {
            case_id: case_id.to_string(),
            round: argument.round,
            side: argument.sender_role,
            argument_id: argument.id.clone(),
            content: argument.content.clone(),
            confidence: argument.confidence,
            timestamp: Utc::now(),
        });
        Ok(Admission::Admitted {
            argument,
            round_complete,
        })
    }

    /// Run the judge panel on the complete round and apply the median rule.
    pub async fn score_round(&self, case_id: &str) -> Result<RoundOutcome, CourtError> {
        let case = self.case(case_id).await?;

        let (snapshot, round_args) = {
            let state = case.lock().await;
            if !state.accepts_input() {
                return Err(CaseError::NotAccepting {
                    status: state.status,
                }
                .into());
            }
            let round_args = state.round_arguments().ok_or(CaseError::RoundIncomplete {
                round: state.current_round,
            })?;
            (state.clone(), round_args)
        };
        let round = round_args.round;

        let (evaluations, missing) = self.collect_evaluations(&snapshot, &round_args).await;

        let mut state = case.lock().await;
        if !state.accepts_input() || state.current_round != round {
            return Err(CaseError::WrongRound {
                expected: state.current_round,
                got: round,
            }
            .into());
        }

        if !missing.is_empty() {
            state.abandon_round()?;
            warn!(case_id, round, missing = ?missing, "judge panel incomplete, round abandoned");
            self.emit(CourtEvent::RoundAbandoned {
                case_id: case_id.to_string(),
                round,
                missing_judges: missing.clone(),
                timestamp: Utc::now(),
            });
            return Ok(RoundOutcome::Abandoned {
                round,
                missing_judges: missing,
            });
        }

        for evaluation in evaluations {
            state.add_evaluation(evaluation.clone())?;
            debug!(case_id, round, judge = %evaluation.judge_id, "evaluation admitted");
            self.emit(CourtEvent::JudgeEvaluation {
                case_id: case_id.to_string(),
                round,
                judge_id: evaluation.judge_id,
                plaintiff_score: evaluation.score.plaintiff,
                defendant_score: evaluation.score.defendant,
                reasoning: evaluation.reasoning,
                timestamp: Utc::now(),
            });
        }

        let scored = state.round_evaluations(round);
        let assessment = self
            .rule
            .apply(&scored)
            .ok_or(CaseError::RoundIncomplete { round })?;
        state.apply_damage(assessment.target, assessment.damage)?;
        info!(
            case_id,
            round,
            target = %assessment.target,
            damage = assessment.damage,
            plaintiff = state.health.plaintiff,
            defendant = state.health.defendant,
            "damage applied"
        );
        self.emit(CourtEvent::HealthUpdate {
            case_id: case_id.to_string(),
            round,
            target: assessment.target,
            damage: assessment.damage,
            median_diff: assessment.median_diff,
            health: state.health,
            timestamp: Utc::now(),
        });
        Ok(RoundOutcome::Scored(assessment))
    }

    /// Check termination; either resolve the case or open the next round.
    pub async fn conclude_round(&self, case_id: &str) -> Result<RoundConclusion, CourtError> {
        let case = self.case(case_id).await?;
        let mut state = case.lock().await;

        if let Some(reason) = termination_reason(&state) {
            state.deliberate(&reason.to_string())?;
            let verdict = render_verdict(&state);
            state.resolve(verdict.clone())?;
            info!(case_id, %reason, summary = %verdict.summary_line(), "case resolved");
            self.emit(CourtEvent::CaseResolved {
                case_id: case_id.to_string(),
                verdict: Box::new(verdict.clone()),
                timestamp: Utc::now(),
            });
            return Ok(RoundConclusion::Resolved(verdict));
        }

        let next = state.advance_round()?;
        info!(case_id, round = next, "round started");
        self.emit(CourtEvent::RoundStarted {
            case_id: case_id.to_string(),
            round: next,
            max_rounds: state.max_rounds(),
            health: state.health,
            timestamp: Utc::now(),
        });
        Ok(RoundConclusion::NextRound(next))
    }

    /// Drive a case to its verdict, or until `cancel` fires while collecting.
    pub async fn run_case(
        &self,
        case_id: &str,
        cancel: CancellationToken,
    ) -> Result<CaseOutcome, CourtError> {
        let case = self.case(case_id).await?;
        let status = case.lock().await.status;
        match status {
            CaseStatus::Waiting => self.start_case(case_id).await?,
            CaseStatus::Live => {}
            CaseStatus::Deliberating | CaseStatus::Resolved => {
                let state = case.lock().await;
                return match &state.verdict {
                    Some(verdict) => Ok(CaseOutcome::Resolved(verdict.clone())),
                    None => Err(CaseError::NotAccepting {
                        status: state.status,
                    }
                    .into()),
                };
            }
        }

        let poll_timeout = Duration::from_millis(self.config.proceedings.argument_timeout_ms);
        loop {
            // Collecting
            loop {
                if case.lock().await.round_complete() {
                    break;
                }
                let polled = tokio::select! {
                    _ = cancel.cancelled() => {
                        let state = case.lock().await;
                        info!(case_id, round = state.current_round, "case aborted");
                        return Ok(CaseOutcome::Aborted {
                            round: state.current_round,
                            status: state.status,
                        });
                    }
                    polled = tokio::time::timeout(
                        poll_timeout,
                        self.arguments.next_argument(case_id),
                    ) => polled,
                };
                match polled {
                    Ok(Some(submission)) => {
                        self.handle_submission(case_id, submission).await?;
                    }
                    Ok(None) => {
                        debug!(case_id, "argument source idle");
                        tokio::select! {
                            _ = cancel.cancelled() => {}
                            _ = tokio::time::sleep(IDLE_POLL_BACKOFF) => {}
                        }
                    }
                    Err(_) => {
                        debug!(
                            case_id,
                            timeout_ms = poll_timeout.as_millis() as u64,
                            "no argument before timeout, polling again"
                        );
                    }
                }
            }

            // RoundScoring
            self.score_round(case_id).await?;

            match self.conclude_round(case_id).await? {
                RoundConclusion::Resolved(verdict) => {
                    self.arguments.close(case_id);
                    return Ok(CaseOutcome::Resolved(verdict));
                }
                RoundConclusion::NextRound(_) => {}
            }
        }
    }

    // ── Internals ──

    /// Call every judge concurrently, retrying only the ones still missing.
    /// Returns admitted-shape evaluations in panel order plus missing judge ids.
    async fn collect_evaluations(
        &self,
        snapshot: &CaseState,
        round_args: &RoundArguments,
    ) -> (Vec<Evaluation>, Vec<String>) {
        let panel = &self.config.proceedings.panel;
        let attempts = self.config.proceedings.judge_attempts.max(1);
        let timeout_ms = self.config.proceedings.judge_timeout_ms;
        let budget = Duration::from_millis(timeout_ms);
        let mut collected: HashMap<String, Evaluation> = HashMap::new();

        for attempt in 1..=attempts {
            let pending: Vec<&String> = panel
                .iter()
                .filter(|j| !collected.contains_key(j.as_str()))
                .collect();
            if pending.is_empty() {
                break;
            }

            let calls = pending.iter().map(|judge_id| async move {
                let judge_id = judge_id.as_str();
                let result = match tokio::time::timeout(
                    budget,
                    self.judges.evaluate(judge_id, snapshot, round_args),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(JudgeError::Timeout {
                        judge_id: judge_id.to_string(),
                        timeout_ms,
                    }),
                };
                let checked = result.and_then(|e| check_evaluation(judge_id, round_args.round, e));
                (judge_id, checked)
            });

            for (judge_id, result) in join_all(calls).await {
                match result {
                    Ok(evaluation) => {
                        collected.insert(judge_id.to_string(), evaluation);
                    }
                    Err(e) => warn!(
                        case_id = %snapshot.case_id,
                        round = round_args.round,
                        judge = judge_id,
                        attempt,
                        error = %e,
                        "judge evaluation failed"
                    ),
                }
            }
        }

        let mut evaluations = Vec::with_capacity(panel.len());
        let mut missing = Vec::new();
        for judge_id in panel {
            match collected.remove(judge_id) {
                Some(evaluation) => evaluations.push(evaluation),
                None => missing.push(judge_id.clone()),
            }
        }
        (evaluations, missing)
    }

    /// Audit and broadcast. Neither may fail the caller.
    fn emit(&self, event: CourtEvent) {
        let case_id = event.case_id().to_string();
        self.audit(&case_id, event.event_type(), event.audit_data());
        self.broadcast.broadcast(&case_id, event);
    }

    fn audit(&self, case_id: &str, event: &str, data: Value) {
        if let Some(sink) = &self.audit {
            if let Err(e) = sink.log_event(case_id, event, data) {
                warn!(case_id, event, error = %e, "audit write failed");
            }
        }
    }
}

/// An evaluation must come from the judge asked, for the round asked, with finite scores.
fn check_evaluation(
    judge_id: &str,
    round: u32,
    evaluation: Evaluation,
) -> Result<Evaluation, JudgeError> {
    if evaluation.judge_id != judge_id {
        return Err(JudgeError::Malformed {
            judge_id: judge_id.to_string(),
            reason: format!("answered as {}", evaluation.judge_id),
        });
    }
    if evaluation.round != round {
        return Err(JudgeError::Malformed {
            judge_id: judge_id.to_string(),
            reason: format!("scored round {} instead of {}", evaluation.round, round),
        });
    }
    if !evaluation.score.is_finite() {
        return Err(JudgeError::Malformed {
            judge_id: judge_id.to_string(),
            reason: "non-finite score".to_string(),
        });
    }
    Ok(evaluation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditLog;
    use crate::case::SideScores;
    use crate::collaborators::QueuedArgumentSource;
    use crate::events::EventBus;
    use async_trait::async_trait;

    const PLAINTIFF_TEXT: &str =
        "The defendant shipped an unaudited bridge contract and ignored three separate reports.";
    const DEFENDANT_TEXT: &str =
        "Every report was triaged within a day and the flagged paths were patched before launch.";

    /// Every judge scores the plaintiff 0.8 and the defendant 0.6.
    struct FixedJudges;

    #[async_trait]
    impl JudgeSource for FixedJudges {
        async fn evaluate(
            &self,
            judge_id: &str,
            _case: &CaseState,
            round: &RoundArguments,
        ) -> Result<Evaluation, JudgeError> {
            Ok(Evaluation::new(judge_id, round.round, SideScores::new(0.8, 0.6), "fixed"))
        }
    }

    /// `keone` fails its first call; every call is counted per judge.
    #[derive(Default)]
    struct FlakyJudge {
        calls: std::sync::Mutex<HashMap<String, u32>>,
    }

    impl FlakyJudge {
        fn calls(&self, judge_id: &str) -> u32 {
            self.calls.lock().unwrap().get(judge_id).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl JudgeSource for FlakyJudge {
        async fn evaluate(
            &self,
            judge_id: &str,
            _case: &CaseState,
            round: &RoundArguments,
        ) -> Result<Evaluation, JudgeError> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                let n = calls.entry(judge_id.to_string()).or_insert(0);
                *n += 1;
                *n
            };
            if judge_id == "keone" && call == 1 {
                return Err(JudgeError::Unavailable {
                    judge_id: judge_id.to_string(),
                    reason: "warming up".into(),
                });
            }
            Ok(Evaluation::new(judge_id, round.round, SideScores::new(0.8, 0.6), "fixed"))
        }
    }

    /// One judge never answers.
    struct SilentJudge;

    #[async_trait]
    impl JudgeSource for SilentJudge {
        async fn evaluate(
            &self,
            judge_id: &str,
            _case: &CaseState,
            round: &RoundArguments,
        ) -> Result<Evaluation, JudgeError> {
            if judge_id == "mikeweb" {
                return Err(JudgeError::Unavailable {
                    judge_id: judge_id.to_string(),
                    reason: "offline".into(),
                });
            }
            Ok(Evaluation::new(judge_id, round.round, SideScores::new(0.8, 0.6), "fixed"))
        }
    }

    fn court_with(judges: Arc<dyn JudgeSource>) -> Court {
        Court::new(
            CourtConfig::default(),
            Arc::new(QueuedArgumentSource::new()),
            judges,
        )
        .unwrap()
    }

    async fn argue_round(court: &Court, case_id: &str) {
        let p_sub = ArgumentSubmission::new(Side::Plaintiff, PLAINTIFF_TEXT, 0.8);
        let d_sub = ArgumentSubmission::new(Side::Defendant, DEFENDANT_TEXT, 0.7);
        assert!(court.handle_submission(case_id, p_sub).await.unwrap().is_admitted());
        assert!(court.handle_submission(case_id, d_sub).await.unwrap().is_admitted());
    }

    #[tokio::test]
    async fn test_unknown_case_fails_visibly() {
        let court = court_with(Arc::new(FixedJudges));
        let err = court.start_case("nope").await.unwrap_err();
        assert!(matches!(err, CourtError::UnknownCase(ref id) if id == "nope"));
        assert!(court.snapshot("nope").await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_case_rejected() {
        let court = court_with(Arc::new(FixedJudges));
        court.create_case_with_id("c1", "alice", "bob").await.unwrap();
        let err = court.create_case_with_id("c1", "x", "y").await.unwrap_err();
        assert!(matches!(err, CourtError::DuplicateCase(_)));
    }

    #[tokio::test]
    async fn test_next_action_follows_turns() {
        let court = court_with(Arc::new(FixedJudges));
        let id = court.create_case("alice", "bob").await.unwrap();
        assert_eq!(court.next_action(&id).await.unwrap(), NextAction::Start);
        court.start_case(&id).await.unwrap();
        assert_eq!(
            court.next_action(&id).await.unwrap(),
            NextAction::AwaitArgument {
                side: Side::Plaintiff
            }
        );
        argue_round(&court, &id).await;
        assert_eq!(court.next_action(&id).await.unwrap(), NextAction::ScoreRound);
    }

    #[tokio::test]
    async fn test_scoring_requires_complete_round() {
        let court = court_with(Arc::new(FixedJudges));
        let id = court.create_case("alice", "bob").await.unwrap();
        court.start_case(&id).await.unwrap();
        let err = court.score_round(&id).await.unwrap_err();
        assert!(matches!(err, CourtError::Case(CaseError::RoundIncomplete { round: 1 })));
    }

    #[tokio::test]
    async fn test_step_through_one_round() {
        let bus = EventBus::new().shared();
        let audit = Arc::new(MemoryAuditLog::new());
        let court = court_with(Arc::new(FixedJudges))
            .with_broadcast(bus.clone())
            .with_audit(audit.clone());
        let mut events = bus.subscribe();

        let id = court.create_case("alice", "bob").await.unwrap();
        court.start_case(&id).await.unwrap();
        argue_round(&court, &id).await;

        let outcome = court.score_round(&id).await.unwrap();
        match outcome {
            RoundOutcome::Scored(a) => {
                assert_eq!(a.target, Side::Defendant);
                assert_eq!(a.damage, 5);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(court.conclude_round(&id).await.unwrap(), RoundConclusion::NextRound(2));

        let state = court.snapshot(&id).await.unwrap();
        assert_eq!(state.health.defendant, 95);
        assert_eq!(state.evaluations.len(), 6);
        assert_eq!(state.current_round, 2);

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event.event_type());
        }
        assert_eq!(seen.first(), Some(&"round_started"));
        assert_eq!(seen.iter().filter(|t| **t == "judge_evaluation").count(), 6);
        assert_eq!(seen.last(), Some(&"round_started"));

        let logged = audit.event_types(&id);
        assert_eq!(logged[0], "case_created");
        assert!(logged.contains(&"health_update".to_string()));
    }

    #[tokio::test]
    async fn test_missing_judge_abandons_round() {
        let court = court_with(Arc::new(SilentJudge));
        let id = court.create_case("alice", "bob").await.unwrap();
        court.start_case(&id).await.unwrap();
        argue_round(&court, &id).await;

        let outcome = court.score_round(&id).await.unwrap();
        assert_eq!(
            outcome,
            RoundOutcome::Abandoned {
                round: 1,
                missing_judges: vec!["mikeweb".to_string()]
            }
        );
        let state = court.snapshot(&id).await.unwrap();
        assert!(state.evaluations.is_empty());
        assert_eq!(state.health.plaintiff, 100);
        assert_eq!(state.health.defendant, 100);
        assert_eq!(state.abandoned_rounds, vec![1]);
    }

    #[tokio::test]
    async fn test_retry_recovers_only_the_failed_judge() {
        let judges = Arc::new(FlakyJudge::default());
        let court = court_with(judges.clone());
        let id = court.create_case("alice", "bob").await.unwrap();
        court.start_case(&id).await.unwrap();
        argue_round(&court, &id).await;

        let outcome = court.score_round(&id).await.unwrap();
        assert!(matches!(outcome, RoundOutcome::Scored(_)));

        let state = court.snapshot(&id).await.unwrap();
        let order: Vec<&str> = state.evaluations.iter().map(|e| e.judge_id.as_str()).collect();
        assert_eq!(order, court.config().proceedings.panel);
        assert_eq!(judges.calls("keone"), 2);
        for judge in ["portdev", "mikeweb", "james", "harpal", "anago"] {
            assert_eq!(judges.calls(judge), 1, "{} called more than once", judge);
        }
        assert!(state.abandoned_rounds.is_empty());
    }

    #[tokio::test]
    async fn test_submission_before_scoring_is_rejected_not_failed() {
        let court = court_with(Arc::new(FixedJudges));
        let id = court.create_case("alice", "bob").await.unwrap();
        court.start_case(&id).await.unwrap();
        argue_round(&court, &id).await;

        let early = ArgumentSubmission::new(Side::Plaintiff, PLAINTIFF_TEXT, 0.8);
        let admission = court.handle_submission(&id, early).await.unwrap();
        assert_eq!(
            admission,
            Admission::Rejected(Rejection::RoundAwaitingScore { round: 1 })
        );
        assert_eq!(court.snapshot(&id).await.unwrap().arguments.len(), 2);

        // The round still scores normally afterwards.
        assert!(matches!(
            court.score_round(&id).await.unwrap(),
            RoundOutcome::Scored(_)
        ));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = CourtConfig::default();
        config.scoring.min_damage = 40;
        let err = Court::new(
            config,
            Arc::new(QueuedArgumentSource::new()),
            Arc::new(FixedJudges),
        )
        .err()
        .unwrap();
        assert!(matches!(err, CourtError::Config(_)));

        let mut config = CourtConfig::default();
        config.proceedings.panel.clear();
        let err = Court::new(
            config,
            Arc::new(QueuedArgumentSource::new()),
            Arc::new(FixedJudges),
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("proceedings.panel"));
    }

    #[test]
    fn test_check_evaluation_rejects_impostor() {
        let eval = Evaluation::new("keone", 1, SideScores::new(0.5, 0.5), "");
        assert!(check_evaluation("james", 1, eval.clone()).is_err());
        assert!(check_evaluation("keone", 2, eval.clone()).is_err());
        assert!(check_evaluation("keone", 1, eval).is_ok());
        let nan = Evaluation::new("keone", 1, SideScores::new(f64::NAN, 0.5), "");
        assert!(check_evaluation("keone", 1, nan).is_err());
    }
}
