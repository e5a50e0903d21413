//! In-memory feature store.

use super::{FeatureStore, FeatureStoreError, Record};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of [`FeatureStore`].
///
/// Useful for tests and for running the runtime locally without a store.
#[derive(Default, Clone)]
pub struct MemoryFeatureStore {
    records: Arc<RwLock<HashMap<(String, String), Record>>>,
}

impl MemoryFeatureStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `record_id` in `feature_group`.
    pub async fn put_record(
        &self,
        feature_group: impl Into<String>,
        record_id: impl Into<String>,
        record: Record,
    ) {
        let mut records = self.records.write().await;
        records.insert((feature_group.into(), record_id.into()), record);
    }

    /// Remove a record, returning it if present.
    pub async fn delete_record(&self, feature_group: &str, record_id: &str) -> Option<Record> {
        let mut records = self.records.write().await;
        records.remove(&(feature_group.to_string(), record_id.to_string()))
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl FeatureStore for MemoryFeatureStore {
    async fn get_record(
        &self,
        feature_group: &str,
        record_id: &str,
    ) -> Result<Option<Record>, FeatureStoreError> {
        let records = self.records.read().await;
        Ok(records
            .get(&(feature_group.to_string(), record_id.to_string()))
            .cloned())
    }
}
