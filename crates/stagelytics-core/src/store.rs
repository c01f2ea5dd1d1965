use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::event::Event;
use crate::stage::stage_ids;
use crate::stats::unique_user_count;

/// Content-derived dataset id: the first 8 bytes of SHA-256 over the upload,
/// as 16 hex chars. Uploading the same file twice yields the same id.
pub fn dataset_id_for(bytes: &[u8]) -> String {
    let hash = Sha256::digest(bytes);
    hex::encode(&hash[..8])
}

/// A normalised event log held for later queries.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub id: String,
    pub events: Vec<Event>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub dataset_id: String,
    pub event_count: u64,
    pub stage_count: u64,
    pub user_count: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl Dataset {
    pub fn new(raw: &[u8], events: Vec<Event>) -> Self {
        Self {
            id: dataset_id_for(raw),
            events,
            uploaded_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            dataset_id: self.id.clone(),
            event_count: self.events.len() as u64,
            stage_count: stage_ids(&self.events).len() as u64,
            user_count: unique_user_count(&self.events),
            uploaded_at: self.uploaded_at,
        }
    }
}

/// Storage interface for uploaded datasets.
///
/// The server ships an in-memory implementation; handlers only see this trait.
#[async_trait]
pub trait DatasetStore: Send + Sync + 'static {
    /// Insert or replace by id. Returns the ids evicted to make room.
    async fn put(&self, dataset: Dataset) -> anyhow::Result<Vec<String>>;
    async fn get(&self, id: &str) -> anyhow::Result<Option<Arc<Dataset>>>;
    async fn list(&self) -> anyhow::Result<Vec<DatasetSummary>>;
    async fn remove(&self, id: &str) -> anyhow::Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::test_support::{by_user, event};
    use crate::event::EventAction;

    #[test]
    fn dataset_id_is_16_hex_chars_and_stable() {
        let id = dataset_id_for(b"Event Action,Event Label\ntry,2001\n");
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, dataset_id_for(b"Event Action,Event Label\ntry,2001\n"));
        assert_ne!(id, dataset_id_for(b"Event Action,Event Label\ntry,2002\n"));
    }

    #[test]
    fn summary_counts() {
        let events = vec![
            by_user(event(EventAction::Try, "2001"), "a"),
            by_user(event(EventAction::Try, "2002"), "a"),
            event(EventAction::Try, "2002"),
        ];
        let summary = Dataset::new(b"x", events).summary();
        assert_eq!(summary.event_count, 3);
        assert_eq!(summary.stage_count, 2);
        assert_eq!(summary.user_count, 1);
    }
}
