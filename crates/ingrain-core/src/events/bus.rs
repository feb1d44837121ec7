//! Event bus using tokio broadcast channel
//!
//! Hosts emit document lifecycle events here; sessions subscribe. Slow
//! subscribers miss events rather than blocking the host.

use crate::events::DocumentEvent;
use tokio::sync::broadcast;

/// Default channel capacity
const DEFAULT_CAPACITY: usize = 256;

/// Event bus for document lifecycle events
///
/// Events are fire-and-forget; if no subscribers are listening, they are
/// simply dropped.
#[derive(Clone)]
pub struct DocumentEventBus {
    sender: broadcast::Sender<DocumentEvent>,
}

impl DocumentEventBus {
    /// Create a new event bus with default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new event bus with custom capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events emitted after this call.
    pub fn subscribe(&self) -> DocumentSubscriber {
        DocumentSubscriber {
            receiver: self.sender.subscribe(),
        }
    }

    /// Emit an event to all subscribers. Never blocks, never fails.
    pub fn emit(&self, event: DocumentEvent) {
        let _ = self.sender.send(event);
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for DocumentEventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscriber to a [`DocumentEventBus`]
pub struct DocumentSubscriber {
    receiver: broadcast::Receiver<DocumentEvent>,
}

impl DocumentSubscriber {
    /// Receive the next event
    ///
    /// Returns None once the bus is dropped. Lagging is logged and skipped.
    /// Cancel-safe.
    pub async fn recv(&mut self) -> Option<DocumentEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Document subscriber lagged by {} events", n);
                    continue;
                }
            }
        }
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Option<DocumentEvent> {
        self.receiver.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentHandle;

    #[tokio::test]
    async fn test_event_bus_basic() {
        let bus = DocumentEventBus::new();
        let mut sub = bus.subscribe();

        bus.emit(DocumentEvent::Created(DocumentHandle::from_path("a.md")));

        let received = sub.recv().await.unwrap();
        assert_eq!(received.path(), "a.md");
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = DocumentEventBus::new();
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        bus.emit(DocumentEvent::Deleted {
            path: "a.md".to_string(),
        });

        let r1 = sub1.recv().await.unwrap();
        let r2 = sub2.recv().await.unwrap();
        assert_eq!(r1, r2);
    }

    #[tokio::test]
    async fn test_recv_returns_none_after_bus_dropped() {
        let bus = DocumentEventBus::new();
        let mut sub = bus.subscribe();
        drop(bus);
        assert!(sub.recv().await.is_none());
    }

    #[test]
    fn test_no_subscribers_no_panic() {
        let bus = DocumentEventBus::new();
        bus.emit(DocumentEvent::Created(DocumentHandle::from_path("a.md")));
        assert_eq!(bus.subscriber_count(), 0);

        let _sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
    }
}
