//! Append-only audit log of state-changing court operations.
//!
//! The court writes here after every mutation and never reads back. Each
//! record carries a short BLAKE3 digest of its own canonical JSON so a log
//! file can be checked for tampering after the fact.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::StoreError;

/// Write-only persistence sink.
pub trait AuditSink: Send + Sync {
    fn log_event(&self, case_id: &str, event_type: &str, data: Value) -> Result<(), StoreError>;
}

/// One audit log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub case_id: String,
    pub event: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
    /// First 16 hex chars of BLAKE3 over the sorted-key JSON of the other fields.
    pub hash: String,
}

impl AuditRecord {
    pub fn new(case_id: &str, event: &str, data: Value) -> Self {
        let timestamp = Utc::now();
        let hash = Self::digest(case_id, event, &data, &timestamp);
        Self {
            case_id: case_id.to_string(),
            event: event.to_string(),
            data,
            timestamp,
            hash,
        }
    }

    fn digest(case_id: &str, event: &str, data: &Value, timestamp: &DateTime<Utc>) -> String {
        // serde_json maps are BTreeMaps, so keys serialize sorted.
        let canonical = json!({
            "case_id": case_id,
            "event": event,
            "data": data,
            "timestamp": timestamp,
        })
        .to_string();
        let hex = blake3::hash(canonical.as_bytes()).to_hex();
        hex.as_str()[..16].to_string()
    }

    /// Recompute the digest from the record's fields.
    pub fn expected_hash(&self) -> String {
        Self::digest(&self.case_id, &self.event, &self.data, &self.timestamp)
    }

    pub fn is_intact(&self) -> bool {
        self.expected_hash() == self.hash
    }
}

/// JSON-lines audit file, opened explicitly and appended to.
pub struct JsonlAuditLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlAuditLog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a prepared record.
    pub fn append(&self, record: &AuditRecord) -> Result<(), StoreError> {
        let line = serde_json::to_string(record)?;
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Flush buffered writes to disk.
    pub fn flush(&self) -> Result<(), StoreError> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.flush()?;
        file.sync_data()?;
        Ok(())
    }

    /// Every record in file order. Unparseable lines are skipped.
    pub fn read_all(&self) -> Result<Vec<AuditRecord>, StoreError> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let records = reader
            .lines()
            .map_while(Result::ok)
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(&line).ok())
            .collect();
        Ok(records)
    }

    pub fn case_history(&self, case_id: &str) -> Result<Vec<AuditRecord>, StoreError> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| r.case_id == case_id)
            .collect())
    }

    /// Recompute every digest. Returns the number of records checked.
    pub fn verify_integrity(&self) -> Result<usize, StoreError> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut checked = 0;
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: AuditRecord = serde_json::from_str(&line)?;
            let expected = record.expected_hash();
            if expected != record.hash {
                return Err(StoreError::Integrity {
                    line: idx + 1,
                    expected,
                    found: record.hash,
                });
            }
            checked += 1;
        }
        Ok(checked)
    }
}

impl AuditSink for JsonlAuditLog {
    fn log_event(&self, case_id: &str, event_type: &str, data: Value) -> Result<(), StoreError> {
        self.append(&AuditRecord::new(case_id, event_type, data))
    }
}

/// In-memory audit sink.
#[derive(Default)]
pub struct MemoryAuditLog {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn case_history(&self, case_id: &str) -> Vec<AuditRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.case_id == case_id)
            .collect()
    }

    /// Event names in insertion order.
    pub fn event_types(&self, case_id: &str) -> Vec<String> {
        self.case_history(case_id)
            .into_iter()
            .map(|r| r.event)
            .collect()
    }
}

impl AuditSink for MemoryAuditLog {
    fn log_event(&self, case_id: &str, event_type: &str, data: Value) -> Result<(), StoreError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(AuditRecord::new(case_id, event_type, data));
        Ok(())
    }
}
