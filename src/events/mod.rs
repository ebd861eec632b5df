use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::production_batch::{StageType, TriggerReason};
use crate::entities::qc_record::QcType;

/// Events emitted by the mutating commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Batch lifecycle
    BatchCreated {
        batch_id: Uuid,
        work_order_id: Uuid,
        batch_number: i32,
        trigger_reason: TriggerReason,
    },
    BatchClosed {
        batch_id: Uuid,
        work_order_id: Uuid,
    },
    BatchStageChanged {
        batch_id: Uuid,
        from: StageType,
        to: StageType,
    },
    BatchStatusChanged {
        batch_id: Uuid,
    },
    BatchQuantityChanged {
        batch_id: Uuid,
        quantity: i32,
    },

    // Quality gates
    BatchQcSubmitted {
        batch_id: Uuid,
        qc_type: QcType,
        production_allowed: bool,
        dispatch_allowed: bool,
    },

    // Production log
    ProductionRecorded {
        batch_id: Uuid,
        quantity: i32,
        rejected_qty: i32,
    },

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    pub fn with_data(message: String) -> Self {
        Event::Generic {
            message,
            timestamp: Utc::now(),
        }
    }
}

/// Entity classes the change feed reports on. Read-side subscribers
/// register interest per class and recompute their full view on any row
/// change within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityClass {
    Batch,
    QcRecord,
    ExternalMove,
    Carton,
    ProductionLog,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityChange {
    pub class: EntityClass,
    pub id: Uuid,
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Best-effort send. Event delivery is a secondary concern: a full or
    /// closed channel is logged and dropped, never surfaced to the caller.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping event: {}", e);
            metrics::counter!("shopfloor.events.dropped", 1);
        }
    }
}

/// Push-based change propagation. `process_events` folds command events
/// into per-entity-class change notices on a broadcast channel; read
/// models subscribe and re-run their aggregation per notice rather than
/// applying incremental diffs.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<EntityChange>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EntityChange> {
        self.sender.subscribe()
    }

    pub fn publish(&self, change: EntityChange) {
        // A send error only means there are currently no subscribers.
        let _ = self.sender.send(change);
    }
}

fn changes_for(event: &Event) -> Vec<EntityChange> {
    match event {
        Event::BatchCreated { batch_id, .. }
        | Event::BatchClosed { batch_id, .. }
        | Event::BatchStageChanged { batch_id, .. }
        | Event::BatchStatusChanged { batch_id }
        | Event::BatchQuantityChanged { batch_id, .. } => vec![EntityChange {
            class: EntityClass::Batch,
            id: *batch_id,
        }],
        Event::BatchQcSubmitted { batch_id, .. } => vec![
            EntityChange {
                class: EntityClass::Batch,
                id: *batch_id,
            },
            EntityChange {
                class: EntityClass::QcRecord,
                id: *batch_id,
            },
        ],
        Event::ProductionRecorded { batch_id, .. } => vec![
            EntityChange {
                class: EntityClass::ProductionLog,
                id: *batch_id,
            },
            EntityChange {
                class: EntityClass::Batch,
                id: *batch_id,
            },
        ],
        Event::Generic { .. } => vec![],
    }
}

/// Event processing loop. Runs for the lifetime of the process; consumes
/// command events, logs them, and republishes row-change notices on the
/// feed.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, feed: ChangeFeed) {
    info!("Starting event processing loop");
    while let Some(event) = rx.recv().await {
        info!(event = ?event, "processing event");
        metrics::counter!("shopfloor.events.processed", 1);
        for change in changes_for(&event) {
            feed.publish(change);
        }
    }
    info!("Event channel closed, stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qc_submission_touches_batch_and_qc_record_classes() {
        let event = Event::BatchQcSubmitted {
            batch_id: Uuid::new_v4(),
            qc_type: QcType::Final,
            production_allowed: true,
            dispatch_allowed: true,
        };
        let classes: Vec<EntityClass> = changes_for(&event).iter().map(|c| c.class).collect();
        assert_eq!(classes, vec![EntityClass::Batch, EntityClass::QcRecord]);
    }

    #[tokio::test]
    async fn feed_delivers_to_subscribers() {
        let feed = ChangeFeed::default();
        let mut rx = feed.subscribe();
        let id = Uuid::new_v4();
        feed.publish(EntityChange {
            class: EntityClass::Carton,
            id,
        });
        let change = rx.recv().await.unwrap();
        assert_eq!(change.class, EntityClass::Carton);
        assert_eq!(change.id, id);
    }
}
