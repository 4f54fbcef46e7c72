use crate::models::PurchasesEvent;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;

/// Fan-out publisher for purchase events.
///
/// Every subscriber owns an unbounded queue, so events arrive in publish
/// order and a slow subscriber never causes drops. Subscribers whose handle
/// was dropped are pruned on the next publish.
#[derive(Debug, Default)]
pub struct EventPublisher {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<PurchasesEvent>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to every live subscriber, returning how many received it
    pub fn publish(&self, event: PurchasesEvent) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        subscribers.len()
    }

    pub fn subscribe(&self) -> EventSubscription {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.push(tx);

        debug!("New event subscription ({} active)", subscribers.len());

        EventSubscription { receiver: rx }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }
}

/// Receiving side of an event subscription; dropping it unsubscribes
#[derive(Debug)]
pub struct EventSubscription {
    receiver: mpsc::UnboundedReceiver<PurchasesEvent>,
}

impl EventSubscription {
    /// Wait for the next event; `None` once the publisher is gone
    pub async fn recv(&mut self) -> Option<PurchasesEvent> {
        self.receiver.recv().await
    }

    /// Take the next event if one is already queued
    pub fn try_recv(&mut self) -> Option<PurchasesEvent> {
        self.receiver.try_recv().ok()
    }

    /// Drain every queued event without waiting
    pub fn drain(&mut self) -> Vec<PurchasesEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    pub fn into_stream(self) -> UnboundedReceiverStream<PurchasesEvent> {
        UnboundedReceiverStream::new(self.receiver)
    }
}
