//! Publish/subscribe event bus.
//!
//! The watcher publishes one `FileChanged` per applied change and one
//! `ContextUpdated` per flushed batch. Anything that cares subscribes.

use crate::entities::FileChange;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ContextEvent {
    FileChanged {
        project_id: String,
        change: FileChange,
    },
    ContextUpdated {
        project_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl ContextEvent {
    pub fn project_id(&self) -> &str {
        match self {
            Self::FileChanged { project_id, .. } | Self::ContextUpdated { project_id, .. } => {
                project_id
            }
        }
    }
}

pub trait EventBus: Send + Sync {
    fn publish(&self, event: ContextEvent);
    fn subscribe(&self) -> broadcast::Receiver<ContextEvent>;
}

/// In-process bus over a tokio broadcast channel.
pub struct BroadcastBus {
    sender: broadcast::Sender<ContextEvent>,
}

impl BroadcastBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for BroadcastBus {
    fn publish(&self, event: ContextEvent) {
        // Err only means nobody is listening right now.
        if self.sender.send(event).is_err() {
            debug!("Published event with no subscribers");
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ContextEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ChangeKind;

    #[tokio::test]
    async fn test_subscriber_receives_published_event() {
        let bus = BroadcastBus::new();
        let mut rx = bus.subscribe();

        bus.publish(ContextEvent::FileChanged {
            project_id: "p".into(),
            change: FileChange::new("src/a.ts", ChangeKind::Updated),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.project_id(), "p");
        assert!(matches!(event, ContextEvent::FileChanged { .. }));
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let bus = BroadcastBus::new();
        bus.publish(ContextEvent::ContextUpdated {
            project_id: "p".into(),
            timestamp: Utc::now(),
        });
    }
}
