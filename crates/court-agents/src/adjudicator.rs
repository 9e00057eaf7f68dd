//! Mock collaborators for the appeal ladder.

use std::sync::{Mutex, PoisonError};

use adjudication::appeals::{
    AdjudicationModel, AdjudicationRequest, Adjudicator, AdjudicatorError, BorderlineResolver,
    Judgment, JurorProfile, Offense, Vote,
};
use adjudication::config::AppealsConfig;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

const SUPREME_MODEL_BONUS: u8 = 3;

/// Marker words checked in order; the first class with a hit wins.
const CLASSES: [(Offense, u8, &[&str], &str); 3] = [
    (
        Offense::Malicious,
        95,
        &["malicious", "exploit", "steal"],
        "Evidence indicates malicious intent with potential for harm.",
    ),
    (
        Offense::Abuse,
        90,
        &["abuse", "harassment", "threat"],
        "Evidence demonstrates abusive behavior.",
    ),
    (
        Offense::Spam,
        85,
        &["spam", "posted"],
        "Evidence shows spam-like behavior.",
    ),
];

/// Keyword classifier standing in for a model call.
#[derive(Debug, Clone)]
pub struct KeywordAdjudicator {
    precedent_boost: u8,
}

impl Default for KeywordAdjudicator {
    fn default() -> Self {
        Self { precedent_boost: 5 }
    }
}

impl KeywordAdjudicator {
    pub fn from_config(config: &AppealsConfig) -> Self {
        Self {
            precedent_boost: config.precedent_confidence_boost,
        }
    }

    pub fn classify(&self, request: &AdjudicationRequest) -> Judgment {
        let evidence = request.evidence.to_lowercase();
        let (offense, mut confidence, mut reasoning) = CLASSES
            .iter()
            .find(|(_, _, markers, _)| markers.iter().any(|m| evidence.contains(m)))
            .map(|(offense, confidence, _, reasoning)| {
                (*offense, *confidence, reasoning.to_string())
            })
            .unwrap_or((Offense::Safe, 70, "Evidence inconclusive.".to_string()));

        if let Some(precedent) = &request.precedent {
            confidence = confidence.saturating_add(self.precedent_boost);
            reasoning.push_str(&format!(" (considering precedent {})", precedent.case_id));
        }
        if request.model == AdjudicationModel::Supreme {
            confidence = confidence.saturating_add(SUPREME_MODEL_BONUS);
        }

        Judgment {
            offense,
            confidence: confidence.min(100),
            reasoning,
            model: request.model,
            precedent_id: request.precedent.as_ref().map(|p| p.case_id.clone()),
            from_precedent: false,
        }
    }
}

#[async_trait]
impl Adjudicator for KeywordAdjudicator {
    async fn adjudicate(
        &self,
        request: &AdjudicationRequest,
    ) -> Result<Judgment, AdjudicatorError> {
        let judgment = self.classify(request);
        debug!(
            case_id = %request.case_id,
            tier = %request.tier,
            offense = %judgment.offense,
            confidence = judgment.confidence,
            "keyword adjudication"
        );
        Ok(judgment)
    }
}

/// Borderline jurors flip a seeded coin.
pub struct CoinFlipResolver {
    rng: Mutex<StdRng>,
}

impl CoinFlipResolver {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl BorderlineResolver for CoinFlipResolver {
    fn resolve(&self, _juror: &JurorProfile, _judgment: &Judgment) -> Vote {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        if rng.random_bool(0.5) {
            Vote::Guilty
        } else {
            Vote::NotGuilty
        }
    }
}
