//! In-memory record store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Document, Filter, Record, RecordStore, StoreError, Upserted};

/// All collections, each an insertion-ordered list of documents.
pub type Collections = BTreeMap<String, Vec<Document>>;

/// Process-local [`RecordStore`].
///
/// Every operation takes the lock once, so conditional writes are atomic
/// with respect to each other.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `collections`.
    pub fn from_collections(collections: Collections) -> Self {
        MemoryStore {
            collections: RwLock::new(collections),
        }
    }

    /// Copy of every collection, for persistence.
    pub async fn snapshot(&self) -> Collections {
        self.collections.read().await.clone()
    }

    /// Replace every collection with `collections`.
    pub async fn restore(&self, collections: Collections) {
        *self.collections.write().await = collections;
    }
}

fn merge(target: &mut Record, partial: Record) {
    for (key, value) in partial {
        target.insert(key, value);
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn add(&self, collection: &str, record: Record) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(Document {
                id: id.clone(),
                data: record,
            });
        debug!(collection, id = %id, "record added");
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .cloned())
    }

    async fn query(
        &self,
        collection: &str,
        filter: Option<&Filter>,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(docs
            .iter()
            .filter(|d| filter.map_or(true, |f| f.matches(&d.data)))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn update(&self, collection: &str, id: &str, partial: Record) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        merge(&mut doc.data, partial);
        Ok(())
    }

    async fn update_if(
        &self,
        collection: &str,
        id: &str,
        expected: &Filter,
        partial: Record,
    ) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        if !expected.matches(&doc.data) {
            debug!(collection, id, field = %expected.field, "conditional update skipped");
            return Ok(false);
        }
        merge(&mut doc.data, partial);
        Ok(true)
    }

    async fn insert_unique(
        &self,
        collection: &str,
        key: &Filter,
        mut record: Record,
    ) -> Result<Option<String>, StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        if docs.iter().any(|d| key.matches(&d.data)) {
            debug!(collection, field = %key.field, "unique insert skipped");
            return Ok(None);
        }

        record.insert(key.field.clone(), key.value.clone());
        let id = uuid::Uuid::new_v4().to_string();
        docs.push(Document {
            id: id.clone(),
            data: record,
        });
        Ok(Some(id))
    }

    async fn upsert_by(
        &self,
        collection: &str,
        key: &Filter,
        mut record: Record,
    ) -> Result<Upserted, StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        if let Some(doc) = docs.iter_mut().find(|d| key.matches(&d.data)) {
            merge(&mut doc.data, record);
            return Ok(Upserted {
                id: doc.id.clone(),
                created: false,
            });
        }

        record.insert(key.field.clone(), key.value.clone());
        let id = uuid::Uuid::new_v4().to_string();
        docs.push(Document {
            id: id.clone(),
            data: record,
        });
        Ok(Upserted { id, created: true })
    }
}
