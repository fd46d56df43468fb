//! In-process progress store

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{ChangeFeed, ProgressPatch, ProgressRecord, ProgressStore, Subscription};
use crate::error::{Result, TrackerError};

/// Keeps records in memory; writes can be made to fail for offline testing
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, ProgressRecord>>,
    feed: ChangeFeed,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read and write fail until switched back
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Replace a record as if another client wrote it
    pub fn put_remote(&self, user_id: &str, record: ProgressRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.insert(user_id.to_string(), record.clone());
        }
        self.feed.publish(user_id, record);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(TrackerError::Store("store is offline".into()))
        } else {
            Ok(())
        }
    }
}

impl ProgressStore for MemoryStore {
    fn get(&self, user_id: &str) -> Result<Option<ProgressRecord>> {
        self.check_online()?;
        let records = self.records.lock().map_err(|e| TrackerError::Store(e.to_string()))?;
        Ok(records.get(user_id).cloned())
    }

    fn set(&self, user_id: &str, patch: ProgressPatch) -> Result<()> {
        self.check_online()?;
        let record = {
            let mut records = self.records.lock().map_err(|e| TrackerError::Store(e.to_string()))?;
            let record = records.entry(user_id.to_string()).or_default();
            record.merge(patch);
            record.clone()
        };
        self.feed.publish(user_id, record);
        Ok(())
    }

    fn subscribe(&self, user_id: &str) -> Subscription {
        self.feed.subscribe(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_other_fields() {
        let store = MemoryStore::new();
        store.set("ada", ProgressPatch { total_hours: Some(2.0), ..Default::default() }).unwrap();
        store.set("ada", ProgressPatch { current_streak: Some(3), ..Default::default() }).unwrap();

        let record = store.get("ada").unwrap().unwrap();
        assert_eq!(record.total_hours, 2.0);
        assert_eq!(record.current_streak, 3);
    }

    #[test]
    fn offline_store_fails_and_recovers() {
        let store = MemoryStore::new();
        store.set_offline(true);

        let err = store.set("ada", ProgressPatch::default()).unwrap_err();
        assert!(err.is_io());
        assert!(store.get("ada").is_err());

        store.set_offline(false);
        assert!(store.set("ada", ProgressPatch::default()).is_ok());
    }

    #[test]
    fn remote_writes_reach_subscribers() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe("ada");

        store.put_remote("ada", ProgressRecord { current_streak: 4, ..Default::default() });

        assert_eq!(sub.try_next().map(|r| r.current_streak), Some(4));
        assert_eq!(store.get("ada").unwrap().map(|r| r.current_streak), Some(4));
    }
}
