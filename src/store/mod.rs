//! Persistence of per-user progress
//!
//! A [`ProgressStore`] holds one [`ProgressRecord`] per user. Writes are
//! partial ([`ProgressPatch`]) and merged field by field; every successful
//! write is broadcast to the subscribers of that user.

pub mod file;
pub mod memory;
pub mod record;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use crate::error::Result;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use record::{Field, ProgressPatch, ProgressRecord};

const CHANGE_BUFFER: usize = 64;

/// Backend holding progress records
pub trait ProgressStore: Send {
    /// Record for a user, if one was ever written
    fn get(&self, user_id: &str) -> Result<Option<ProgressRecord>>;

    /// Merge a partial update into a user's record
    fn set(&self, user_id: &str, patch: ProgressPatch) -> Result<()>;

    /// Watch a user's record; dropping the subscription unsubscribes
    fn subscribe(&self, user_id: &str) -> Subscription;
}

/// A record after a write
#[derive(Debug, Clone)]
pub struct StoreChange {
    pub user_id: String,
    pub record: ProgressRecord,
}

/// Fan-out of store changes, shared by the store implementations
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<StoreChange>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(CHANGE_BUFFER);
        Self { tx }
    }
}

impl ChangeFeed {
    /// Announce a written record; nobody listening is fine
    pub fn publish(&self, user_id: &str, record: ProgressRecord) {
        let _ = self.tx.send(StoreChange { user_id: user_id.to_string(), record });
    }

    pub fn subscribe(&self, user_id: &str) -> Subscription {
        Subscription { user_id: user_id.to_string(), rx: self.tx.subscribe() }
    }
}

/// Stream of record updates for one user
#[derive(Debug)]
pub struct Subscription {
    user_id: String,
    rx: broadcast::Receiver<StoreChange>,
}

impl Subscription {
    /// User being watched
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Wait for the next update; `None` once the store is gone
    pub async fn next(&mut self) -> Option<ProgressRecord> {
        loop {
            match self.rx.recv().await {
                Ok(change) if change.user_id == self.user_id => return Some(change.record),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Progress subscription lagged; skipping updates");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next update that is already queued, without waiting
    pub fn try_next(&mut self) -> Option<ProgressRecord> {
        loop {
            match self.rx.try_recv() {
                Ok(change) if change.user_id == self.user_id => return Some(change.record),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Progress subscription lagged; skipping updates");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hours: f64) -> ProgressRecord {
        ProgressRecord { total_hours: hours, ..Default::default() }
    }

    #[tokio::test]
    async fn subscription_filters_by_user() {
        let feed = ChangeFeed::default();
        let mut sub = feed.subscribe("ada");

        feed.publish("bob", record(1.0));
        feed.publish("ada", record(2.0));

        assert_eq!(sub.next().await.map(|r| r.total_hours), Some(2.0));
    }

    #[test]
    fn try_next_drains_queued_updates() {
        let feed = ChangeFeed::default();
        let mut sub = feed.subscribe("ada");
        assert!(sub.try_next().is_none());

        feed.publish("ada", record(1.0));
        feed.publish("ada", record(2.0));

        assert_eq!(sub.try_next().map(|r| r.total_hours), Some(1.0));
        assert_eq!(sub.try_next().map(|r| r.total_hours), Some(2.0));
        assert!(sub.try_next().is_none());
    }

    #[test]
    fn lagged_subscription_keeps_latest() {
        let feed = ChangeFeed::default();
        let mut sub = feed.subscribe("ada");
        for i in 0..(CHANGE_BUFFER + 5) {
            feed.publish("ada", record(i as f64));
        }

        let mut last = None;
        while let Some(r) = sub.try_next() {
            last = Some(r.total_hours);
        }
        assert_eq!(last, Some((CHANGE_BUFFER + 4) as f64));
    }

    #[tokio::test]
    async fn closed_feed_ends_subscription() {
        let feed = ChangeFeed::default();
        let mut sub = feed.subscribe("ada");
        drop(feed);
        assert!(sub.next().await.is_none());
    }
}
