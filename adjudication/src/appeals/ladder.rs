//! The three-tier review pipeline.
//!
//! Every tier runs the same stages on a [`LadderCase`]:
//!
//! ```text
//! filed ──(merit review, High only)──> merit_accepted ──> judged ──> jury_complete ──> closed
//!   │                                      │
//!   └──────────── merit rejected ──────────┴──────────────> closed (dismissed)
//! ```
//!
//! A closed case moves up only through [`AppealLadder::file_appeal`]. The
//! judgment of a case is produced once and memoized.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::jury::{deliberate, BorderlineResolver, JuryVerdict, MidpointResolver};
use super::precedent::{extract_keywords, Precedent, PrecedentBook};
use super::punishment::{sanction_for, Sanction};
use super::tier::{AdjudicationModel, CourtTier, Judgment};
use crate::audit::AuditSink;
use crate::config::AppealsConfig;
use crate::error::StoreError;

const PRIOR_CONFIDENCE_BORDERLINE: u8 = 80;
const MERIT_BORDERLINE_PRIOR: u32 = 30;
const MERIT_NEW_EVIDENCE: u32 = 40;
const MERIT_PROCEDURAL: u32 = 25;

// ── Collaborator ──

/// Everything the external adjudicator sees for one case.
#[derive(Debug, Clone, Serialize)]
pub struct AdjudicationRequest {
    pub case_id: String,
    pub tier: CourtTier,
    pub model: AdjudicationModel,
    pub evidence: String,
    pub grounds: Option<String>,
    pub precedent: Option<Precedent>,
    /// Judgment of the case being appealed.
    pub prior: Option<Judgment>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AdjudicatorError {
    #[error("adjudicator unavailable: {0}")]
    Unavailable(String),

    #[error("malformed judgment: {0}")]
    Malformed(String),
}

/// Evidence in, judgment out. Called at most once per successfully judged case.
#[async_trait]
pub trait Adjudicator: Send + Sync {
    async fn adjudicate(&self, request: &AdjudicationRequest) -> Result<Judgment, AdjudicatorError>;
}

// ── Errors ──

#[derive(Debug, thiserror::Error)]
pub enum AppealError {
    #[error("unknown ladder case: {0}")]
    UnknownCase(String),

    #[error("case {case_id} is {status}, cannot {operation}")]
    WrongStage {
        case_id: String,
        status: LadderStatus,
        operation: &'static str,
    },

    #[error("appeal stake {offered} below the {tier} minimum of {required}")]
    InsufficientStake {
        tier: CourtTier,
        required: u64,
        offered: u64,
    },

    #[error("case {0} was decided by the final tier")]
    TerminalTier(String),

    #[error("case {case_id} already appealed as {appeal_id}")]
    AlreadyAppealed { case_id: String, appeal_id: String },

    #[error(transparent)]
    Adjudicator(#[from] AdjudicatorError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ── Case record ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LadderStatus {
    Filed,
    MeritAccepted,
    Judged,
    JuryComplete,
    Closed,
}

impl std::fmt::Display for LadderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Filed => write!(f, "filed"),
            Self::MeritAccepted => write!(f, "merit_accepted"),
            Self::Judged => write!(f, "judged"),
            Self::JuryComplete => write!(f, "jury_complete"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Convicted,
    Acquitted,
    /// Appeal rejected on merit review.
    Dismissed,
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Convicted => write!(f, "convicted"),
            Self::Acquitted => write!(f, "acquitted"),
            Self::Dismissed => write!(f, "dismissed"),
        }
    }
}

/// What happened to an appellant's stake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakeOutcome {
    /// Conviction overturned; stake goes back to the appellant.
    Returned,
    /// Conviction upheld or appeal dismissed; stake goes to the reporter.
    Forfeited,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeritReview {
    pub score: u32,
    pub reasons: Vec<String>,
    pub accepted: bool,
    pub stake_forfeited: bool,
}

/// Score an appeal's grounds against the judgment being appealed.
pub fn assess_merit(prior_confidence: Option<u8>, grounds: &str, threshold: u32) -> MeritReview {
    let grounds = grounds.to_lowercase();
    let mut score = 0;
    let mut reasons = Vec::new();

    if let Some(confidence) = prior_confidence.filter(|c| *c < PRIOR_CONFIDENCE_BORDERLINE) {
        score += MERIT_BORDERLINE_PRIOR;
        reasons.push(format!("prior confidence {}% was borderline", confidence));
    }
    if grounds.contains("new evidence") {
        score += MERIT_NEW_EVIDENCE;
        reasons.push("new evidence submitted".to_string());
    }
    if grounds.contains("procedural") || grounds.contains("error") {
        score += MERIT_PROCEDURAL;
        reasons.push("procedural concerns raised".to_string());
    }

    let accepted = score >= threshold;
    MeritReview {
        score,
        reasons,
        accepted,
        stake_forfeited: !accepted,
    }
}

/// Details of an appeal filing.
#[derive(Debug, Clone)]
pub struct AppealFiling {
    pub appellant: String,
    pub grounds: String,
    pub stake: u64,
    /// High Court only: consult the adjudicator again instead of reviewing
    /// the prior judgment.
    pub reanalyze: bool,
}

impl AppealFiling {
    pub fn new(appellant: &str, grounds: &str, stake: u64) -> Self {
        Self {
            appellant: appellant.to_string(),
            grounds: grounds.to_string(),
            stake,
            reanalyze: false,
        }
    }

    pub fn reanalyze(mut self) -> Self {
        self.reanalyze = true;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LadderCase {
    pub id: String,
    pub tier: CourtTier,
    pub defendant: String,
    pub reporter: String,
    pub evidence: String,
    pub appellant: Option<String>,
    pub grounds: Option<String>,
    pub stake: u64,
    pub reanalyze: bool,
    /// Case this one appeals.
    pub parent_id: Option<String>,
    /// Appeal filed against this case.
    pub appeal_id: Option<String>,
    pub prior: Option<Judgment>,
    pub status: LadderStatus,
    pub merit: Option<MeritReview>,
    pub judgment: Option<Judgment>,
    pub jury: Option<JuryVerdict>,
    pub disposition: Option<Disposition>,
    pub sanction: Option<Sanction>,
    pub stake_outcome: Option<StakeOutcome>,
    pub precedent_created: Option<String>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl LadderCase {
    pub fn is_closed(&self) -> bool {
        self.status == LadderStatus::Closed
    }

    pub fn summary_line(&self) -> String {
        let outcome = match (&self.disposition, &self.judgment) {
            (Some(d), Some(j)) => format!("{} ({} @ {}%)", d, j.offense, j.confidence),
            (Some(d), None) => d.to_string(),
            (None, _) => self.status.to_string(),
        };
        format!(
            "[{}] {} | defendant {} | {}",
            self.tier, self.id, self.defendant, outcome
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderStats {
    pub total_cases: usize,
    pub local: usize,
    pub high: usize,
    pub supreme: usize,
    pub adjudicator_calls: u32,
    /// Judgments taken from a binding precedent.
    pub precedent_hits: u32,
    pub precedents: usize,
}

// ── Ladder ──

pub struct AppealLadder {
    config: AppealsConfig,
    adjudicator: Arc<dyn Adjudicator>,
    resolver: Arc<dyn BorderlineResolver>,
    precedents: PrecedentBook,
    audit: Option<Arc<dyn AuditSink>>,
    cases: BTreeMap<String, LadderCase>,
    next_number: u32,
    adjudicator_calls: u32,
    precedent_hits: u32,
}

impl AppealLadder {
    pub fn new(
        config: AppealsConfig,
        adjudicator: Arc<dyn Adjudicator>,
        precedents: PrecedentBook,
    ) -> Self {
        Self {
            config,
            adjudicator,
            resolver: Arc::new(MidpointResolver),
            precedents,
            audit: None,
            cases: BTreeMap::new(),
            next_number: 1,
            adjudicator_calls: 0,
            precedent_hits: 0,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn BorderlineResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Open a Local Court case.
    pub fn file_case(&mut self, defendant: &str, reporter: &str, evidence: &str) -> String {
        let id = self.allocate_id();
        let case = LadderCase {
            id: id.clone(),
            tier: CourtTier::Local,
            defendant: defendant.to_string(),
            reporter: reporter.to_string(),
            evidence: evidence.to_string(),
            appellant: None,
            grounds: None,
            stake: 0,
            reanalyze: false,
            parent_id: None,
            appeal_id: None,
            prior: None,
            status: LadderStatus::Filed,
            merit: None,
            judgment: None,
            jury: None,
            disposition: None,
            sanction: None,
            stake_outcome: None,
            precedent_created: None,
            created_at: Utc::now(),
            closed_at: None,
        };
        info!(case_id = %id, tier = %case.tier, defendant, "ladder case filed");
        self.audit_case(&case, "ladder_case_filed");
        self.cases.insert(id.clone(), case);
        id
    }

    /// Appeal a closed case to the next tier.
    pub fn file_appeal(
        &mut self,
        source_id: &str,
        filing: AppealFiling,
    ) -> Result<String, AppealError> {
        let source = self.case_ref(source_id)?;
        let Some(tier) = source.tier.next() else {
            return Err(AppealError::TerminalTier(source_id.to_string()));
        };
        if !source.is_closed() || source.disposition == Some(Disposition::Dismissed) {
            return Err(AppealError::WrongStage {
                case_id: source_id.to_string(),
                status: source.status,
                operation: "appeal",
            });
        }
        if let Some(appeal_id) = &source.appeal_id {
            return Err(AppealError::AlreadyAppealed {
                case_id: source_id.to_string(),
                appeal_id: appeal_id.clone(),
            });
        }
        let required = tier.settings(&self.config).appeal_stake;
        if filing.stake < required {
            return Err(AppealError::InsufficientStake {
                tier,
                required,
                offered: filing.stake,
            });
        }

        let (defendant, reporter, evidence, prior) = (
            source.defendant.clone(),
            source.reporter.clone(),
            source.evidence.clone(),
            source.judgment.clone(),
        );
        let id = self.allocate_id();
        let case = LadderCase {
            id: id.clone(),
            tier,
            defendant,
            reporter,
            evidence,
            appellant: Some(filing.appellant),
            grounds: Some(filing.grounds),
            stake: filing.stake,
            reanalyze: filing.reanalyze,
            parent_id: Some(source_id.to_string()),
            appeal_id: None,
            prior,
            status: LadderStatus::Filed,
            merit: None,
            judgment: None,
            jury: None,
            disposition: None,
            sanction: None,
            stake_outcome: None,
            precedent_created: None,
            created_at: Utc::now(),
            closed_at: None,
        };
        info!(
            case_id = %id,
            parent = source_id,
            tier = %tier,
            stake = case.stake,
            "appeal filed"
        );
        self.audit_case(&case, "ladder_case_filed");
        self.cases.insert(id.clone(), case);
        if let Some(source) = self.cases.get_mut(source_id) {
            source.appeal_id = Some(id.clone());
        }
        Ok(id)
    }

    /// Merit review for tiers that require one. A rejected appeal closes
    /// as dismissed and forfeits its stake.
    pub fn review_merit(&mut self, case_id: &str) -> Result<MeritReview, AppealError> {
        let threshold = self.config.merit_threshold;
        let needs_review = self.requires_merit(self.case_ref(case_id)?.tier);
        let case = self.case_mut(case_id)?;
        if !needs_review || case.status != LadderStatus::Filed {
            return Err(AppealError::WrongStage {
                case_id: case_id.to_string(),
                status: case.status,
                operation: "review merit",
            });
        }

        let prior_confidence = case.prior.as_ref().map(|j| j.confidence);
        let review = assess_merit(
            prior_confidence,
            case.grounds.as_deref().unwrap_or_default(),
            threshold,
        );
        case.merit = Some(review.clone());
        if review.accepted {
            case.status = LadderStatus::MeritAccepted;
            info!(case_id, score = review.score, "appeal accepted on merit");
        } else {
            case.status = LadderStatus::Closed;
            case.disposition = Some(Disposition::Dismissed);
            case.stake_outcome = Some(StakeOutcome::Forfeited);
            case.closed_at = Some(Utc::now());
            info!(case_id, score = review.score, "appeal dismissed on merit");
            let case = case.clone();
            self.audit_case(&case, "ladder_case_closed");
        }
        Ok(review)
    }

    /// The case's single judgment.
    ///
    /// Lower tiers bound by a matching precedent take it without consulting
    /// the adjudicator. The High Court reviews the prior judgment unless the
    /// appeal asked for re-analysis. Everything else costs exactly one
    /// adjudicator call. A judged case returns its stored judgment.
    pub async fn judge(&mut self, case_id: &str) -> Result<Judgment, AppealError> {
        let case = self.case_ref(case_id)?;
        if let Some(judgment) = &case.judgment {
            return Ok(judgment.clone());
        }
        let ready = match case.status {
            LadderStatus::Filed => !self.requires_merit(case.tier),
            LadderStatus::MeritAccepted => true,
            _ => false,
        };
        if !ready {
            return Err(AppealError::WrongStage {
                case_id: case_id.to_string(),
                status: case.status,
                operation: "judge",
            });
        }

        let tier = case.tier;
        let reuse_prior = tier == CourtTier::High && !case.reanalyze;
        let request = AdjudicationRequest {
            case_id: case_id.to_string(),
            tier,
            model: tier.model(),
            evidence: case.evidence.clone(),
            grounds: case.grounds.clone(),
            precedent: self
                .precedents
                .find(&case.evidence, self.config.precedent_match_ratio)
                .cloned(),
            prior: case.prior.clone(),
        };

        let judgment = match (&request.precedent, &request.prior) {
            (Some(precedent), _) if tier.bound_by_precedent() => {
                self.precedent_hits += 1;
                info!(case_id, precedent = %precedent.case_id, "bound by precedent");
                self.bind_to_precedent(precedent, tier)
            }
            (_, Some(prior)) if reuse_prior => Judgment {
                reasoning: format!("Upheld on review: {}", prior.reasoning),
                precedent_id: None,
                from_precedent: false,
                ..prior.clone()
            },
            _ => {
                self.adjudicator_calls += 1;
                let judgment = self.adjudicator.adjudicate(&request).await?;
                check_judgment(judgment, request.precedent.as_ref())?
            }
        };

        let case = self.case_mut(case_id)?;
        case.judgment = Some(judgment.clone());
        case.status = LadderStatus::Judged;
        info!(
            case_id,
            tier = %tier,
            offense = %judgment.offense,
            confidence = judgment.confidence,
            from_precedent = judgment.from_precedent,
            "case judged"
        );
        Ok(judgment)
    }

    pub fn jury_vote(&mut self, case_id: &str) -> Result<JuryVerdict, AppealError> {
        let settings = self.case_ref(case_id)?.tier.settings(&self.config).clone();
        let resolver = Arc::clone(&self.resolver);
        let case = self.case_mut(case_id)?;
        let judgment = match (&case.judgment, case.status) {
            (Some(judgment), LadderStatus::Judged) => judgment,
            _ => {
                return Err(AppealError::WrongStage {
                    case_id: case_id.to_string(),
                    status: case.status,
                    operation: "seat a jury",
                })
            }
        };

        let verdict = deliberate(case.tier, &settings, judgment, resolver.as_ref());
        info!(
            case_id,
            guilty = verdict.guilty,
            not_guilty = verdict.not_guilty,
            convicted = verdict.convicted,
            "jury returned"
        );
        case.jury = Some(verdict.clone());
        case.status = LadderStatus::JuryComplete;
        Ok(verdict)
    }

    /// Close the case: sanction on conviction, settle the stake and, at the
    /// final tier, record a precedent for a confident ruling.
    pub fn execute(&mut self, case_id: &str) -> Result<Disposition, AppealError> {
        let min_confidence = self.config.precedent_min_confidence;
        let vocabulary = self.config.keyword_vocabulary.clone();
        let case = self.case_mut(case_id)?;
        let (judgment, convicted) = match (&case.judgment, &case.jury, case.status) {
            (Some(j), Some(jury), LadderStatus::JuryComplete) => (j.clone(), jury.convicted),
            _ => {
                return Err(AppealError::WrongStage {
                    case_id: case_id.to_string(),
                    status: case.status,
                    operation: "execute",
                })
            }
        };

        let (disposition, sanction) = if convicted {
            (
                Disposition::Convicted,
                sanction_for(judgment.offense, judgment.confidence, case.tier),
            )
        } else {
            (Disposition::Acquitted, Sanction::NONE)
        };
        case.disposition = Some(disposition);
        case.sanction = Some(sanction);
        if case.stake > 0 {
            case.stake_outcome = Some(match disposition {
                Disposition::Acquitted => StakeOutcome::Returned,
                _ => StakeOutcome::Forfeited,
            });
        }

        let precedent = (case.tier.is_final() && judgment.confidence >= min_confidence).then(|| {
            Precedent {
                case_id: case.id.clone(),
                verdict: judgment.offense,
                rule: judgment.reasoning.clone(),
                weight: judgment.confidence as f64 / 100.0,
                keywords: extract_keywords(&case.evidence, &vocabulary),
                created_at: Utc::now(),
            }
        });
        if let Some(p) = &precedent {
            case.precedent_created = Some(p.case_id.clone());
        }
        case.status = LadderStatus::Closed;
        case.closed_at = Some(Utc::now());
        info!(
            case_id,
            disposition = %disposition,
            sanction = %sanction.kind,
            "case closed"
        );
        let case = case.clone();

        if let Some(p) = precedent {
            info!(case_id, verdict = %p.verdict, keywords = ?p.keywords, "precedent created");
            self.precedents.add(p);
        }
        self.audit_case(&case, "ladder_case_closed");
        Ok(disposition)
    }

    /// Run every remaining stage of a case.
    pub async fn process(&mut self, case_id: &str) -> Result<&LadderCase, AppealError> {
        loop {
            let case = self.case_ref(case_id)?;
            let (status, tier) = (case.status, case.tier);
            match status {
                LadderStatus::Filed if self.requires_merit(tier) => {
                    self.review_merit(case_id)?;
                }
                LadderStatus::Filed | LadderStatus::MeritAccepted => {
                    self.judge(case_id).await?;
                }
                LadderStatus::Judged => {
                    self.jury_vote(case_id)?;
                }
                LadderStatus::JuryComplete => {
                    self.execute(case_id)?;
                }
                LadderStatus::Closed => break,
            }
        }
        self.case_ref(case_id)
    }

    pub fn case(&self, case_id: &str) -> Option<&LadderCase> {
        self.cases.get(case_id)
    }

    pub fn cases(&self) -> impl Iterator<Item = &LadderCase> {
        self.cases.values()
    }

    pub fn precedents(&self) -> &PrecedentBook {
        &self.precedents
    }

    pub fn stats(&self) -> LadderStats {
        let count = |tier: CourtTier| self.cases.values().filter(|c| c.tier == tier).count();
        LadderStats {
            total_cases: self.cases.len(),
            local: count(CourtTier::Local),
            high: count(CourtTier::High),
            supreme: count(CourtTier::Supreme),
            adjudicator_calls: self.adjudicator_calls,
            precedent_hits: self.precedent_hits,
            precedents: self.precedents.len(),
        }
    }

    /// Persist the precedent book.
    pub fn flush(&mut self) -> Result<(), AppealError> {
        self.precedents.flush()?;
        Ok(())
    }

    // ── Internals ──

    fn allocate_id(&mut self) -> String {
        let id = format!("CASE-{:04}", self.next_number);
        self.next_number += 1;
        id
    }

    fn requires_merit(&self, tier: CourtTier) -> bool {
        tier.settings(&self.config).merit_review
    }

    fn case_ref(&self, case_id: &str) -> Result<&LadderCase, AppealError> {
        self.cases
            .get(case_id)
            .ok_or_else(|| AppealError::UnknownCase(case_id.to_string()))
    }

    fn case_mut(&mut self, case_id: &str) -> Result<&mut LadderCase, AppealError> {
        self.cases
            .get_mut(case_id)
            .ok_or_else(|| AppealError::UnknownCase(case_id.to_string()))
    }

    fn bind_to_precedent(&self, precedent: &Precedent, tier: CourtTier) -> Judgment {
        let base = (precedent.weight * 100.0).round().clamp(0.0, 100.0) as u8;
        Judgment {
            offense: precedent.verdict,
            confidence: base
                .saturating_add(self.config.precedent_confidence_boost)
                .min(100),
            reasoning: format!("Bound by precedent {}: {}", precedent.case_id, precedent.rule),
            model: tier.model(),
            precedent_id: Some(precedent.case_id.clone()),
            from_precedent: true,
        }
    }

    fn audit_case(&self, case: &LadderCase, event: &str) {
        let Some(audit) = &self.audit else {
            return;
        };
        let data = json!({
            "tier": case.tier,
            "status": case.status,
            "parent_id": case.parent_id,
            "disposition": case.disposition,
            "judgment": case.judgment,
            "sanction": case.sanction,
        });
        if let Err(e) = audit.log_event(&case.id, event, data) {
            warn!(case_id = %case.id, error = %e, "audit write failed");
        }
    }
}

/// Reject out-of-range confidence and record which precedent was consulted.
fn check_judgment(
    mut judgment: Judgment,
    precedent: Option<&Precedent>,
) -> Result<Judgment, AdjudicatorError> {
    if judgment.confidence > 100 {
        return Err(AdjudicatorError::Malformed(format!(
            "confidence {} exceeds 100",
            judgment.confidence
        )));
    }
    judgment.precedent_id = precedent.map(|p| p.case_id.clone());
    judgment.from_precedent = false;
    Ok(judgment)
}
