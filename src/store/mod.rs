//! Signup store abstraction and the live snapshot subscription.

pub mod memory;
pub mod surreal;

pub use memory::MemorySignupStore;
pub use surreal::SurrealSignupStore;

use crate::error::Result;
use crate::signup::Signup;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionEvent {
    /// Emitted around the initial fetch.
    Loading(bool),
    /// Complete signup list for the event; replaces whatever came before.
    Snapshot(Vec<Signup>),
}

/// Remote collection of signups.
#[async_trait]
pub trait SignupStore: Send + Sync {
    /// Start a live subscription for one event. Non-admin subscriptions only
    /// carry public attributes.
    async fn subscribe(&self, event_id: &str, is_admin: bool) -> Result<Subscription>;

    /// Persist `did_attend = true` for the signup.
    async fn mark_attendance(&self, signup: &Signup) -> Result<()>;
}

/// Receiving end of a live subscription.
///
/// Releasing (explicitly or on drop) cancels the producer; events still
/// buffered at that point are never delivered.
#[derive(Debug)]
pub struct Subscription {
    event_id: String,
    rx: mpsc::Receiver<SubscriptionEvent>,
    cancel: CancellationToken,
}

impl Subscription {
    pub fn channel(event_id: impl Into<String>, capacity: usize) -> (SnapshotSender, Subscription) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let cancel = CancellationToken::new();
        let sender = SnapshotSender {
            tx,
            cancel: cancel.clone(),
        };
        let subscription = Subscription {
            event_id: event_id.into(),
            rx,
            cancel,
        };
        (sender, subscription)
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Idempotent.
    pub fn unsubscribe(&mut self) {
        if !self.cancel.is_cancelled() {
            tracing::debug!("Releasing subscription for event {}", self.event_id);
        }
        self.cancel.cancel();
        self.rx.close();
    }

    /// Next event, or `None` once released or the producer is gone.
    pub async fn next(&mut self) -> Option<SubscriptionEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            event = self.rx.recv() => event,
        }
    }

    /// Non-blocking variant of `next`.
    pub fn try_next(&mut self) -> Option<SubscriptionEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Producing end handed to the store's feed task.
#[derive(Debug, Clone)]
pub struct SnapshotSender {
    tx: mpsc::Sender<SubscriptionEvent>,
    cancel: CancellationToken,
}

impl SnapshotSender {
    /// Returns false once the subscriber is gone; the feed should stop then.
    pub async fn send(&self, event: SubscriptionEvent) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            res = self.tx.send(event) => res.is_ok(),
        }
    }

    pub async fn loading(&self, loading: bool) -> bool {
        self.send(SubscriptionEvent::Loading(loading)).await
    }

    pub async fn snapshot(&self, signups: Vec<Signup>) -> bool {
        tracing::debug!("Snapshot with {} signups", signups.len());
        self.send(SubscriptionEvent::Snapshot(signups)).await
    }

    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signup::SignupStatus;

    #[tokio::test]
    async fn test_events_flow_in_order() {
        let (tx, mut sub) = Subscription::channel("e1", 4);
        assert!(tx.loading(true).await);
        assert!(tx.snapshot(vec![Signup::new("s1", "e1", SignupStatus::New)]).await);
        assert_eq!(sub.next().await, Some(SubscriptionEvent::Loading(true)));
        match sub.next().await {
            Some(SubscriptionEvent::Snapshot(list)) => assert_eq!(list.len(), 1),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent_and_drops_buffered() {
        let (tx, mut sub) = Subscription::channel("e1", 4);
        assert!(tx.loading(true).await);
        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());
        assert!(sub.next().await.is_none());
        assert!(sub.try_next().is_none());
        assert!(!tx.loading(false).await);
        assert!(tx.is_cancelled());
    }

    #[tokio::test]
    async fn test_drop_cancels_producer() {
        let (tx, sub) = Subscription::channel("e1", 1);
        drop(sub);
        assert!(tx.is_cancelled());
        // must resolve immediately
        tx.cancelled().await;
        assert!(!tx.snapshot(Vec::new()).await);
    }

    #[tokio::test]
    async fn test_producer_gone_ends_stream() {
        let (tx, mut sub) = Subscription::channel("e1", 1);
        drop(tx);
        assert!(sub.next().await.is_none());
        assert_eq!(sub.event_id(), "e1");
    }
}
