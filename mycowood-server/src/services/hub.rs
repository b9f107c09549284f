use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::models::TelemetryRecord;

/// Records buffered per subscriber before it starts missing frames.
const SUBSCRIBER_BUFFER: usize = 32;

/// Fan-out point between the ingestion loop and live dashboards.
///
/// Delivery is best-effort: a subscriber that stops draining its queue
/// misses records instead of blocking the producer or its peers.
pub struct TelemetryHub {
    subscribers: Arc<RwLock<HashMap<Uuid, mpsc::Sender<TelemetryRecord>>>>,
}

impl TelemetryHub {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registers a live subscriber.
    ///
    /// Only records published after this call are delivered; there is no
    /// catch-up of earlier telemetry.
    pub async fn subscribe(&self) -> (Uuid, mpsc::Receiver<TelemetryRecord>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);

        self.subscribers.write().await.insert(id, tx);
        (id, rx)
    }

    pub async fn unsubscribe(&self, id: &Uuid) {
        self.subscribers.write().await.remove(id);
    }

    /// Pushes one record to every current subscriber without awaiting any
    /// of them. A full queue drops the record for that subscriber only.
    pub async fn publish(&self, record: TelemetryRecord) {
        let subscribers = self.subscribers.read().await;

        for (id, sender) in subscribers.iter() {
            match sender.try_send(record.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::debug!(subscriber = %id, "subscriber lagging, record dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!(subscriber = %id, "subscriber gone, record dropped");
                }
            }
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }
}
