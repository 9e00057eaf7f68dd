//! Event bus for court notifications.
//!
//! Pub/sub over a Tokio broadcast channel. Publishing never fails the
//! caller: a bus with no subscribers simply drops the event.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use super::types::CourtEvent;
use crate::collaborators::BroadcastSink;

/// Channel capacity for broadcast
const CHANNEL_CAPACITY: usize = 256;

/// Shared reference to EventBus
pub type SharedEventBus = Arc<EventBus>;

/// Broadcast bus for [`CourtEvent`]s.
pub struct EventBus {
    sender: broadcast::Sender<CourtEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn shared(self) -> SharedEventBus {
        Arc::new(self)
    }

    /// Publish an event to all subscribers. Returns the receiver count.
    pub fn publish(&self, event: CourtEvent) -> usize {
        let event_type = event.event_type();
        match self.sender.send(event) {
            Ok(count) => {
                debug!(event_type, receivers = count, "event published");
                count
            }
            Err(_) => {
                debug!(event_type, "event published (no receivers)");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CourtEvent> {
        self.sender.subscribe()
    }

    /// Subscribe to one case's events only.
    pub fn subscribe_case(&self, case_id: &str) -> CaseReceiver {
        CaseReceiver {
            receiver: self.subscribe(),
            case_id: case_id.to_string(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastSink for EventBus {
    fn broadcast(&self, _case_id: &str, event: CourtEvent) {
        self.publish(event);
    }
}

/// Receiver that yields only events for one case.
pub struct CaseReceiver {
    receiver: broadcast::Receiver<CourtEvent>,
    case_id: String,
}

impl CaseReceiver {
    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    /// Next event for this case. Lagged gaps surface as errors.
    pub async fn recv(&mut self) -> Result<CourtEvent, broadcast::error::RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if event.case_id() == self.case_id {
                return Ok(event);
            }
        }
    }

    /// Non-blocking variant of [`CaseReceiver::recv`].
    pub fn try_recv(&mut self) -> Result<CourtEvent, broadcast::error::TryRecvError> {
        loop {
            let event = self.receiver.try_recv()?;
            if event.case_id() == self.case_id {
                return Ok(event);
            }
        }
    }
}
