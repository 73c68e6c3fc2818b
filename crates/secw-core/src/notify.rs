//! Best-effort delivery of change events to subscribers.
//!
//! Events ride a bounded broadcast ring: a subscriber that falls behind
//! loses the oldest events, never the dispatcher's time. Lost events are
//! counted and exposed for observability.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

use secw_types::Notification;

pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct NotificationPublisher {
    tx: broadcast::Sender<Notification>,
    dropped: Arc<AtomicU64>,
}

impl NotificationPublisher {
    pub fn new(capacity: usize) -> NotificationPublisher {
        let (tx, _) = broadcast::channel(capacity);
        NotificationPublisher {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn subscribe(&self) -> NotificationStream {
        NotificationStream {
            rx: self.tx.subscribe(),
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// Publish one event. Never blocks; with no subscribers the event is
    /// simply discarded.
    pub fn publish(&self, event: Notification) {
        let _ = self.tx.send(event);
    }

    /// Total events lost to slow subscribers since startup.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for NotificationPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

pub struct NotificationStream {
    rx: broadcast::Receiver<Notification>,
    dropped: Arc<AtomicU64>,
}

impl NotificationStream {
    /// Next event, or `None` once the publisher is gone. Overruns are
    /// accounted and skipped.
    pub async fn recv(&mut self) -> Option<Notification> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    self.dropped.fetch_add(n, Ordering::Relaxed);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant used by polling callers.
    pub fn try_recv(&mut self) -> Option<Notification> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    self.dropped.fetch_add(n, Ordering::Relaxed);
                }
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secw_types::{Document, NotificationAction, Payload};

    fn event(name: &str, sequence: u64) -> Notification {
        let doc = Document::new(name, Payload::snmpv1("public")).redacted();
        Notification::created("default", doc, sequence)
    }

    #[tokio::test]
    async fn events_arrive_in_order() {
        let publisher = NotificationPublisher::new(8);
        let mut stream = publisher.subscribe();

        for seq in 1..=3 {
            publisher.publish(event("doc", seq));
        }

        for seq in 1..=3 {
            let received = stream.recv().await.unwrap();
            assert_eq!(received.sequence, seq);
            assert_eq!(received.action, NotificationAction::Created);
        }
    }

    #[tokio::test]
    async fn overflow_drops_oldest_and_counts() {
        let publisher = NotificationPublisher::new(2);
        let mut stream = publisher.subscribe();

        for seq in 1..=5 {
            publisher.publish(event("doc", seq));
        }

        // Only the two most recent events survive.
        assert_eq!(stream.recv().await.unwrap().sequence, 4);
        assert_eq!(stream.recv().await.unwrap().sequence, 5);
        assert_eq!(publisher.dropped_count(), 3);
    }

    #[tokio::test]
    async fn closed_publisher_ends_stream() {
        let publisher = NotificationPublisher::new(2);
        let mut stream = publisher.subscribe();
        publisher.publish(event("doc", 1));
        drop(publisher);

        assert!(stream.recv().await.is_some());
        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_fine() {
        let publisher = NotificationPublisher::new(2);
        publisher.publish(event("doc", 1));
        assert_eq!(publisher.subscriber_count(), 0);
    }
}
