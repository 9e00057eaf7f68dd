//! Court configuration: every tunable of the proceedings in one place.
//!
//! Loaded from TOML (all sections optional) and then overridden from the
//! environment, mirroring how the runner reads its endpoints.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or checking a [`CourtConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Repetition guard settings (bag-of-words overlap, not semantic similarity).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepetitionConfig {
    pub enabled: bool,
    /// Reject when `|shared words| / |previous words|` exceeds this.
    pub threshold: f64,
    /// How many of the sender's latest accepted arguments to compare against.
    pub window: usize,
}

impl Default for RepetitionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.7,
            window: 2,
        }
    }
}

/// Structural rules an argument must satisfy before admission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Minimum content length in characters.
    pub min_len: usize,
    /// Maximum content length in characters.
    pub max_len: usize,
    /// Out-of-character terms (case-insensitive substring match).
    pub denylist: Vec<String>,
    pub repetition: RepetitionConfig,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_len: 50,
            max_len: 1000,
            denylist: ["health", "hp", "damage", "game", "win", "lose"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            repetition: RepetitionConfig::default(),
        }
    }
}

/// Median-rule and health settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub damage_multiplier: f64,
    pub min_damage: u32,
    pub max_damage: u32,
    pub starting_health: u32,
    /// Health differential above which the case resolves early.
    pub lead_threshold: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            damage_multiplier: 20.0,
            min_damage: 5,
            max_damage: 30,
            starting_health: 100,
            lead_threshold: 80,
        }
    }
}

/// Loop pacing and the judge panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProceedingsConfig {
    pub max_rounds: u32,
    /// How long one poll of the argument source may suspend.
    pub argument_timeout_ms: u64,
    /// Per-call budget for a single judge evaluation.
    pub judge_timeout_ms: u64,
    /// Attempts per round for judges that fail or time out.
    pub judge_attempts: u32,
    /// Ordered judge ids; evaluations are admitted in this order.
    pub panel: Vec<String>,
}

impl Default for ProceedingsConfig {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            argument_timeout_ms: 30_000,
            judge_timeout_ms: 30_000,
            judge_attempts: 2,
            panel: ["portdev", "mikeweb", "keone", "james", "harpal", "anago"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Parameters of one appeal tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierSettings {
    pub jury_size: u32,
    /// Fraction of guilty votes required to convict.
    pub conviction_threshold: f64,
    /// Minimum stake to file a case into this tier.
    pub appeal_stake: u64,
    /// Whether appeals into this tier go through merit review first.
    pub merit_review: bool,
}

/// Appeal ladder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppealsConfig {
    pub local: TierSettings,
    pub high: TierSettings,
    pub supreme: TierSettings,
    /// Supreme rulings at or above this confidence become precedent.
    pub precedent_min_confidence: u8,
    /// Fraction of a precedent's keywords that must appear in evidence.
    pub precedent_match_ratio: f64,
    /// Confidence bonus an adjudicator grants when a precedent applies.
    pub precedent_confidence_boost: u8,
    /// Minimum merit score for an appeal to proceed.
    pub merit_threshold: u32,
    /// Terms eligible to become precedent keywords.
    pub keyword_vocabulary: Vec<String>,
}

impl Default for AppealsConfig {
    fn default() -> Self {
        Self {
            local: TierSettings {
                jury_size: 5,
                conviction_threshold: 0.5,
                appeal_stake: 0,
                merit_review: false,
            },
            high: TierSettings {
                jury_size: 9,
                conviction_threshold: 0.66,
                appeal_stake: 15,
                merit_review: true,
            },
            supreme: TierSettings {
                jury_size: 15,
                conviction_threshold: 0.75,
                appeal_stake: 50,
                merit_review: false,
            },
            precedent_min_confidence: 90,
            precedent_match_ratio: 0.5,
            precedent_confidence_boost: 5,
            merit_threshold: 40,
            keyword_vocabulary: [
                "spam",
                "abuse",
                "malicious",
                "harassment",
                "threat",
                "doxxing",
                "repeated",
                "targeted",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Top-level court configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CourtConfig {
    pub validation: ValidationConfig,
    pub scoring: ScoringConfig,
    pub proceedings: ProceedingsConfig,
    pub appeals: AppealsConfig,
}

impl CourtConfig {
    /// Parse a TOML document; missing sections take their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: Self = toml::from_str(&raw)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `COURT_*` environment overrides in place.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(v) = env_parse::<u32>("COURT_MAX_ROUNDS")? {
            self.proceedings.max_rounds = v;
        }
        if let Some(v) = env_parse::<u64>("COURT_ARGUMENT_TIMEOUT_MS")? {
            self.proceedings.argument_timeout_ms = v;
        }
        if let Some(v) = env_parse::<u64>("COURT_JUDGE_TIMEOUT_MS")? {
            self.proceedings.judge_timeout_ms = v;
        }
        if let Some(v) = env_parse::<usize>("COURT_MIN_LEN")? {
            self.validation.min_len = v;
        }
        if let Some(v) = env_parse::<usize>("COURT_MAX_LEN")? {
            self.validation.max_len = v;
        }
        Ok(())
    }

    /// Reject settings the state machine cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.validation.min_len > self.validation.max_len {
            return Err(ConfigError::Invalid {
                key: "validation.min_len",
                reason: format!(
                    "{} exceeds max_len {}",
                    self.validation.min_len, self.validation.max_len
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.validation.repetition.threshold) {
            return Err(ConfigError::Invalid {
                key: "validation.repetition.threshold",
                reason: format!("{} not in [0, 1]", self.validation.repetition.threshold),
            });
        }
        if self.scoring.min_damage > self.scoring.max_damage {
            return Err(ConfigError::Invalid {
                key: "scoring.min_damage",
                reason: format!(
                    "{} exceeds max_damage {}",
                    self.scoring.min_damage, self.scoring.max_damage
                ),
            });
        }
        if self.proceedings.max_rounds == 0 {
            return Err(ConfigError::Invalid {
                key: "proceedings.max_rounds",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.proceedings.panel.is_empty() {
            return Err(ConfigError::Invalid {
                key: "proceedings.panel",
                reason: "at least one judge is required".to_string(),
            });
        }
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = self.proceedings.panel.iter().find(|j| !seen.insert(j.as_str())) {
            return Err(ConfigError::Invalid {
                key: "proceedings.panel",
                reason: format!("judge {} listed twice", dup),
            });
        }
        if self.proceedings.judge_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "proceedings.judge_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        for (key, tier) in [
            ("appeals.local", &self.appeals.local),
            ("appeals.high", &self.appeals.high),
            ("appeals.supreme", &self.appeals.supreme),
        ] {
            if !(0.0..=1.0).contains(&tier.conviction_threshold) {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!(
                        "conviction_threshold {} not in [0, 1]",
                        tier.conviction_threshold
                    ),
                });
            }
            if tier.jury_size == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "jury_size must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
