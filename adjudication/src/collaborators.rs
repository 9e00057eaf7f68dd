//! Collaborator contracts the adjudication loop talks to.
//!
//! Argument text, judge scores and notification delivery all live outside
//! the core. Implementations sit behind these traits so a mock can be
//! swapped for a model-backed one without touching the state machine.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::case::{ArgumentSubmission, CaseState, Evaluation, RoundArguments};
use crate::events::CourtEvent;

/// Failure of a single judge call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JudgeError {
    #[error("judge {judge_id} timed out after {timeout_ms}ms")]
    Timeout { judge_id: String, timeout_ms: u64 },

    #[error("judge {judge_id} unavailable: {reason}")]
    Unavailable { judge_id: String, reason: String },

    #[error("judge {judge_id} returned a malformed evaluation: {reason}")]
    Malformed { judge_id: String, reason: String },
}

/// Produces submissions for a case.
#[async_trait]
pub trait ArgumentSource: Send + Sync {
    /// Wait for the next submission. The caller bounds the wait with its own
    /// timeout; dropping the future must leave the source unchanged.
    async fn next_argument(&self, case_id: &str) -> Option<ArgumentSubmission>;

    /// Release anything held for `case_id`. Called once the case resolves.
    fn close(&self, _case_id: &str) {}
}

/// Scores a completed round.
#[async_trait]
pub trait JudgeSource: Send + Sync {
    /// Evaluate one round for one judge. `case` is a read-only snapshot.
    async fn evaluate(
        &self,
        judge_id: &str,
        case: &CaseState,
        round: &RoundArguments,
    ) -> Result<Evaluation, JudgeError>;
}

/// Fire-and-forget notification sink.
pub trait BroadcastSink: Send + Sync {
    fn broadcast(&self, case_id: &str, event: CourtEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBroadcast;

impl BroadcastSink for NullBroadcast {
    fn broadcast(&self, _case_id: &str, _event: CourtEvent) {}
}

struct CaseQueue {
    tx: mpsc::UnboundedSender<ArgumentSubmission>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<ArgumentSubmission>>>,
}

impl CaseQueue {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }
}

/// In-process argument source: one FIFO queue per case.
///
/// Transport layers (or the scripted advocates) push into it; the loop
/// pulls from it. Queues are created on first use from either end and
/// dropped by [`ArgumentSource::close`]. Senders handed out earlier start
/// failing once their queue is closed.
#[derive(Default)]
pub struct QueuedArgumentSource {
    queues: std::sync::Mutex<HashMap<String, CaseQueue>>,
}

impl QueuedArgumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// A sender feeding the queue for `case_id`.
    pub fn sender(&self, case_id: &str) -> mpsc::UnboundedSender<ArgumentSubmission> {
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        queues
            .entry(case_id.to_string())
            .or_insert_with(CaseQueue::new)
            .tx
            .clone()
    }

    /// Enqueue one submission.
    pub fn push(&self, case_id: &str, submission: ArgumentSubmission) {
        // The queue holds its own sender, so the receiver is always alive.
        let _ = self.sender(case_id).send(submission);
    }

    /// Number of cases with a live queue.
    pub fn open_queues(&self) -> usize {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn receiver(&self, case_id: &str) -> Arc<Mutex<mpsc::UnboundedReceiver<ArgumentSubmission>>> {
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        queues
            .entry(case_id.to_string())
            .or_insert_with(CaseQueue::new)
            .rx
            .clone()
    }
}

#[async_trait]
impl ArgumentSource for QueuedArgumentSource {
    async fn next_argument(&self, case_id: &str) -> Option<ArgumentSubmission> {
        let rx = self.receiver(case_id);
        let mut rx = rx.lock().await;
        let next = rx.recv().await;
        debug!(case_id, received = next.is_some(), "argument queue polled");
        next
    }

    fn close(&self, case_id: &str) {
        let removed = self
            .queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(case_id);
        if removed.is_some() {
            debug!(case_id, "argument queue closed");
        }
    }
}
