use scribe_core::{CatalogEntry, ItemId};
use tokio::sync::broadcast;

use crate::store::AssetView;

/// State change emitted by the batch and the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestEvent {
    ItemAdded(AssetView),
    ItemUpdated(AssetView),
    ItemRemoved { id: ItemId, position: usize },
    /// Uploaded items that the catalog refused; they stay `Uploaded` but unregistered.
    RegistrationFailed { items: Vec<ItemId>, message: String },
    /// The catalog gained entries; cached listings must be refreshed.
    CatalogChanged { entries: Vec<CatalogEntry> },
}

/// Broadcast bus for [`IngestEvent`]s.
///
/// `publish()` is sync and never blocks, so it is safe from compression worker threads.
/// Events are dropped when nobody subscribes; lagging subscribers get
/// `RecvError::Lagged` instead of slowing producers.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<IngestEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: IngestEvent) {
        let _ = self.tx.send(event);
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<IngestEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_is_dropped() {
        let bus = EventBus::new(4);
        bus.publish(IngestEvent::CatalogChanged { entries: vec![] });
    }

    #[tokio::test]
    async fn every_subscriber_receives() {
        let bus = EventBus::new(4);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.clone().subscribe();
        let id = ItemId::new();

        bus.publish(IngestEvent::ItemRemoved { id, position: 2 });

        assert_eq!(
            rx1.recv().await.unwrap(),
            IngestEvent::ItemRemoved { id, position: 2 }
        );
        assert_eq!(
            rx2.recv().await.unwrap(),
            IngestEvent::ItemRemoved { id, position: 2 }
        );
    }

    #[tokio::test]
    async fn slow_subscriber_lags() {
        let bus = EventBus::new(1);
        let mut rx = bus.subscribe();
        for _ in 0..3 {
            bus.publish(IngestEvent::CatalogChanged { entries: vec![] });
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
    }
}
