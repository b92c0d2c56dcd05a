//! JSON-file record store.
//!
//! The whole store lives in memory and is rewritten to disk after every
//! successful write. Writes are serialized so the file always reflects a
//! prefix of the write history. A write whose save fails is rolled back in
//! memory before the error is returned.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::memory::{Collections, MemoryStore};
use super::{Document, Filter, Record, RecordStore, StoreError, Upserted};

/// [`RecordStore`] persisted to a single JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open the store at `path`, loading existing contents if the file exists.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let collections: Collections = if path.exists() {
            let data = tokio::fs::read_to_string(&path).await?;
            let loaded: Collections = serde_json::from_str(&data)?;
            info!(
                path = %path.display(),
                collections = loaded.len(),
                "loaded record store"
            );
            loaded
        } else {
            debug!(path = %path.display(), "no store file, starting empty");
            Collections::new()
        };

        Ok(FileStore {
            path,
            inner: MemoryStore::from_collections(collections),
            write_lock: Mutex::new(()),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let snapshot = self.inner.snapshot().await;
        let json = serde_json::to_string_pretty(&snapshot)?;

        // Write-then-rename: readers never see a half-written file.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), "saved record store");
        Ok(())
    }

    /// Persist the current state, or put `before` back if the file cannot
    /// be written. Callers hold `write_lock`.
    async fn commit(&self, before: Collections) -> Result<(), StoreError> {
        if let Err(e) = self.save().await {
            warn!(path = %self.path.display(), error = %e, "store save failed, rolling back");
            self.inner.restore(before).await;
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn add(&self, collection: &str, record: Record) -> Result<String, StoreError> {
        let _guard = self.write_lock.lock().await;
        let before = self.inner.snapshot().await;
        let id = self.inner.add(collection, record).await?;
        self.commit(before).await?;
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn query(
        &self,
        collection: &str,
        filter: Option<&Filter>,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError> {
        self.inner.query(collection, filter, limit).await
    }

    async fn update(&self, collection: &str, id: &str, partial: Record) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let before = self.inner.snapshot().await;
        self.inner.update(collection, id, partial).await?;
        self.commit(before).await
    }

    async fn update_if(
        &self,
        collection: &str,
        id: &str,
        expected: &Filter,
        partial: Record,
    ) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let before = self.inner.snapshot().await;
        let written = self.inner.update_if(collection, id, expected, partial).await?;
        if written {
            self.commit(before).await?;
        }
        Ok(written)
    }

    async fn insert_unique(
        &self,
        collection: &str,
        key: &Filter,
        record: Record,
    ) -> Result<Option<String>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let before = self.inner.snapshot().await;
        let id = self.inner.insert_unique(collection, key, record).await?;
        if id.is_some() {
            self.commit(before).await?;
        }
        Ok(id)
    }

    async fn upsert_by(
        &self,
        collection: &str,
        key: &Filter,
        record: Record,
    ) -> Result<Upserted, StoreError> {
        let _guard = self.write_lock.lock().await;
        let before = self.inner.snapshot().await;
        let upserted = self.inner.upsert_by(collection, key, record).await?;
        self.commit(before).await?;
        Ok(upserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("store.json")).await.unwrap();
        assert!(store.query("bots", None, None).await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let id = {
            let store = FileStore::open(&path).await.unwrap();
            let id = store
                .add("bots", record(json!({"name": "B1", "assignedTo": ""})))
                .await
                .unwrap();
            store
                .update_if(
                    "bots",
                    &id,
                    &Filter::eq("assignedTo", ""),
                    record(json!({"assignedTo": "acct1"})),
                )
                .await
                .unwrap();
            id
        };

        let reopened = FileStore::open(&path).await.unwrap();
        let doc = reopened.get("bots", &id).await.unwrap().unwrap();
        assert_eq!(doc.data["name"], "B1");
        assert_eq!(doc.data["assignedTo"], "acct1");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json {{").unwrap();

        let err = FileStore::open(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = FileStore::open(&path).await.unwrap();
        let id = store
            .add("bots", record(json!({"name": "B1", "assignedTo": ""})))
            .await
            .unwrap();

        // A directory in place of the file makes the final rename fail.
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(store
            .add("bots", record(json!({"name": "B2"})))
            .await
            .is_err());
        assert!(store
            .update_if(
                "bots",
                &id,
                &Filter::eq("assignedTo", ""),
                record(json!({"assignedTo": "acct1"})),
            )
            .await
            .is_err());

        let docs = store.query("bots", None, None).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].data["assignedTo"], "");
    }

    #[tokio::test]
    async fn test_taken_unique_key_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = FileStore::open(&path).await.unwrap();
        let key = Filter::eq("email", "a@x.io");

        assert!(store
            .insert_unique("accounts", &key, record(json!({})))
            .await
            .unwrap()
            .is_some());
        let saved = std::fs::read_to_string(&path).unwrap();

        assert!(store
            .insert_unique("accounts", &key, record(json!({"role": "admin"})))
            .await
            .unwrap()
            .is_none());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), saved);
    }
}
