//! Precedent book: binding rules set by high-confidence Supreme rulings.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tier::Offense;
use crate::error::StoreError;

/// A rule derived from a Supreme Court ruling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Precedent {
    /// Supreme case the rule came from.
    pub case_id: String,
    pub verdict: Offense,
    pub rule: String,
    /// Ruling confidence scaled to [0, 1].
    pub weight: f64,
    pub keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Precedent {
    /// Fraction of this precedent's keywords present in `evidence`.
    /// Always 0 for an empty keyword set.
    pub fn match_ratio(&self, evidence: &str) -> f64 {
        if self.keywords.is_empty() {
            return 0.0;
        }
        let evidence = evidence.to_lowercase();
        let hits = self
            .keywords
            .iter()
            .filter(|k| evidence.contains(k.as_str()))
            .count();
        hits as f64 / self.keywords.len() as f64
    }

    pub fn applies_to(&self, evidence: &str, min_ratio: f64) -> bool {
        !self.keywords.is_empty() && self.match_ratio(evidence) >= min_ratio
    }
}

/// Vocabulary terms that occur in `evidence`, in vocabulary order.
pub fn extract_keywords(evidence: &str, vocabulary: &[String]) -> Vec<String> {
    let evidence = evidence.to_lowercase();
    vocabulary
        .iter()
        .map(|term| term.to_lowercase())
        .filter(|term| !term.is_empty() && evidence.contains(term.as_str()))
        .collect()
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PrecedentFile {
    precedents: Vec<Precedent>,
}

/// Precedents backed by an optional JSON file.
#[derive(Debug)]
pub struct PrecedentBook {
    path: Option<PathBuf>,
    precedents: Vec<Precedent>,
    dirty: bool,
}

impl PrecedentBook {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let precedents = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str::<PrecedentFile>(&raw)?.precedents
        } else {
            Vec::new()
        };
        Ok(Self {
            path: Some(path),
            precedents,
            dirty: false,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            precedents: Vec::new(),
            dirty: false,
        }
    }

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
        let file = PrecedentFile {
            precedents: self.precedents.clone(),
        };
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(&file)?)?;
        std::fs::rename(&tmp, path)?;
        self.dirty = false;
        Ok(())
    }

    /// Heaviest precedent matching `evidence`. Earlier entries win ties.
    pub fn find(&self, evidence: &str, min_ratio: f64) -> Option<&Precedent> {
        let mut candidates: Vec<&Precedent> = self.precedents.iter().collect();
        candidates.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        let found = candidates
            .into_iter()
            .find(|p| p.applies_to(evidence, min_ratio));
        if let Some(p) = found {
            debug!(precedent = %p.case_id, verdict = %p.verdict, "precedent matched");
        }
        found
    }

    pub fn add(&mut self, precedent: Precedent) {
        self.precedents.push(precedent);
        self.dirty = true;
    }

    pub fn get(&self, case_id: &str) -> Option<&Precedent> {
        self.precedents.iter().find(|p| p.case_id == case_id)
    }

    pub fn all(&self) -> &[Precedent] {
        &self.precedents
    }

    pub fn len(&self) -> usize {
        self.precedents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.precedents.is_empty()
    }
}
