//! End-to-end drivers wiring the mocked collaborators into the court and
//! the appeal ladder.

use std::sync::Arc;

use adjudication::appeals::{AppealFiling, AppealLadder, Disposition, LadderCase, PrecedentBook};
use adjudication::{
    AuditSink, CaseOutcome, Court, CourtEvent, EventBus, JsonlAuditLog, Leaderboard,
    QueuedArgumentSource, Side,
};
use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::adjudicator::{CoinFlipResolver, KeywordAdjudicator};
use crate::advocates::{spawn_advocates, ScriptedAdvocate};
use crate::config::RunnerConfig;
use crate::judges::BiasedJudgePanel;

pub const PLAINTIFF_ID: &str = "plaintiff-agent";
pub const DEFENDANT_ID: &str = "defendant-agent";

const DEFAULT_APPEAL_GROUNDS: &str = "new evidence: procedural error in the original review";

// ── Trial ──

/// Run one scripted case to its verdict.
///
/// Ctrl-C cancels the case while it is collecting arguments; the outcome is
/// then `Aborted` and nothing is recorded on the leaderboard.
pub async fn run_trial(config: &RunnerConfig) -> Result<CaseOutcome> {
    let queue = QueuedArgumentSource::new().shared();
    let judges = Arc::new(BiasedJudgePanel::new(config.seed).with_latency(config.judge_latency));
    let bus = EventBus::new().shared();

    let audit = match &config.audit_log {
        Some(path) => Some(Arc::new(
            JsonlAuditLog::open(path)
                .with_context(|| format!("opening audit log {}", path.display()))?,
        )),
        None => None,
    };

    let mut court = Court::new(config.court.clone(), queue.clone(), judges)
        .context("building court")?
        .with_broadcast(bus.clone());
    if let Some(audit) = &audit {
        court = court.with_audit(audit.clone() as Arc<dyn AuditSink>);
    }

    let case_id = court.create_case(PLAINTIFF_ID, DEFENDANT_ID).await?;
    info!(case_id = %case_id, rounds = config.court.proceedings.max_rounds, "trial opened");

    let printer = spawn_event_printer(bus.subscribe_case(&case_id));
    let advocates = spawn_advocates(
        queue,
        case_id.clone(),
        ScriptedAdvocate::new(Side::Plaintiff, PLAINTIFF_ID),
        ScriptedAdvocate::new(Side::Defendant, DEFENDANT_ID),
        config.court.proceedings.max_rounds,
        config.advocate_pace,
    );

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling trial");
                cancel.cancel();
            }
        })
    };

    let outcome = court.run_case(&case_id, cancel).await;
    interrupt.abort();
    advocates.abort();
    let outcome = outcome.with_context(|| format!("running {}", case_id))?;

    if let CaseOutcome::Resolved(verdict) = &outcome {
        // The printer exits on CaseResolved.
        let _ = printer.await;
        if let Some(path) = &config.leaderboard {
            let state = court.snapshot(&case_id).await?;
            let mut board = Leaderboard::open(path)
                .with_context(|| format!("opening leaderboard {}", path.display()))?;
            board.record_verdict(&state, verdict);
            board.flush()?;
        }
    } else {
        printer.abort();
    }

    if let Some(audit) = &audit {
        audit.flush()?;
    }
    Ok(outcome)
}

fn spawn_event_printer(mut events: adjudication::events::CaseReceiver) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match &event {
                CourtEvent::RoundStarted { round, health, .. } => {
                    info!(
                        round,
                        plaintiff = health.plaintiff,
                        defendant = health.defendant,
                        "round started"
                    );
                }
                CourtEvent::ArgumentPosted { round, side, content, .. } => {
                    info!(round, side = %side, "{}", content);
                }
                CourtEvent::JudgeEvaluation {
                    judge_id,
                    plaintiff_score,
                    defendant_score,
                    reasoning,
                    ..
                } => {
                    info!(
                        judge = %judge_id,
                        plaintiff_score,
                        defendant_score,
                        "{}",
                        reasoning
                    );
                }
                CourtEvent::HealthUpdate {
                    target,
                    damage,
                    health,
                    ..
                } => {
                    info!(
                        target = %target,
                        damage,
                        plaintiff = health.plaintiff,
                        defendant = health.defendant,
                        "damage applied"
                    );
                }
                CourtEvent::RoundAbandoned {
                    round,
                    missing_judges,
                    ..
                } => {
                    warn!(round, missing = ?missing_judges, "round abandoned");
                }
                CourtEvent::CaseResolved { verdict, .. } => {
                    info!("{}", verdict.summary_line());
                    break;
                }
            }
        }
    })
}

// ── Appeals ──

/// File a report and escalate it as far as the ladder allows.
///
/// A Local conviction is appealed to the High Court with the tier's minimum
/// stake; any High Court ruling that was not dismissed goes on to the
/// Supreme Court. Returns every case touched, lowest tier first.
pub async fn run_appeal(
    config: &RunnerConfig,
    evidence: &str,
    grounds: Option<&str>,
) -> Result<Vec<LadderCase>> {
    let appeals = config.court.appeals.clone();
    let precedents = match &config.precedents {
        Some(path) => PrecedentBook::open(path)
            .with_context(|| format!("opening precedent book {}", path.display()))?,
        None => PrecedentBook::in_memory(),
    };
    let audit = match &config.audit_log {
        Some(path) => Some(Arc::new(
            JsonlAuditLog::open(path)
                .with_context(|| format!("opening audit log {}", path.display()))?,
        )),
        None => None,
    };

    let mut ladder = AppealLadder::new(
        appeals.clone(),
        Arc::new(KeywordAdjudicator::from_config(&appeals)),
        precedents,
    )
    .with_resolver(Arc::new(CoinFlipResolver::new(config.seed)));
    if let Some(audit) = &audit {
        ladder = ladder.with_audit(audit.clone() as Arc<dyn AuditSink>);
    }

    let grounds = grounds.unwrap_or(DEFAULT_APPEAL_GROUNDS);
    let mut ids = vec![ladder.file_case(DEFENDANT_ID, PLAINTIFF_ID, evidence)];

    let local = ladder.process(&ids[0]).await?;
    info!("{}", local.summary_line());
    if local.disposition == Some(Disposition::Convicted) {
        let filing = AppealFiling::new(DEFENDANT_ID, grounds, appeals.high.appeal_stake);
        let high_id = ladder.file_appeal(&ids[0], filing)?;
        let high = ladder.process(&high_id).await?;
        info!("{}", high.summary_line());
        let escalate = high.disposition != Some(Disposition::Dismissed);
        ids.push(high_id.clone());

        if escalate {
            let filing = AppealFiling::new(DEFENDANT_ID, grounds, appeals.supreme.appeal_stake);
            let supreme_id = ladder.file_appeal(&high_id, filing)?;
            let supreme = ladder.process(&supreme_id).await?;
            info!("{}", supreme.summary_line());
            ids.push(supreme_id);
        }
    }

    ladder.flush()?;
    if let Some(audit) = &audit {
        audit.flush()?;
    }

    let stats = ladder.stats();
    info!(
        cases = stats.total_cases,
        adjudicator_calls = stats.adjudicator_calls,
        precedent_hits = stats.precedent_hits,
        precedents = stats.precedents,
        "appeal run complete"
    );

    Ok(ids
        .iter()
        .filter_map(|id| ladder.case(id).cloned())
        .collect())
}
