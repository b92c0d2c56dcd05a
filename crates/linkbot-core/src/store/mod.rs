//! Record store — collection-scoped document storage.
//!
//! Records are flat JSON objects keyed by a generated id. Filtering is
//! equality-only. Every call is atomic on its own; there are no multi-call
//! transactions, so operations that must not race (bot checkout, binding
//! dedup, unique email) go through [`RecordStore::update_if`],
//! [`RecordStore::upsert_by`] and [`RecordStore::insert_unique`].
//!
//! Implementations:
//! - [`MemoryStore`] — process-local, used by tests and as the base of
//! - [`FileStore`] — the memory store persisted to one JSON file.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Collection names used by the services.
pub mod collections {
    pub const ACCOUNTS: &str = "accounts";
    pub const BOTS: &str = "bots";
    pub const BINDINGS: &str = "bindings";
    pub const LOGS: &str = "logs";
}

/// A stored record body.
pub type Record = serde_json::Map<String, Value>;

/// A record together with its store-assigned id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: Record,
}

impl Document {
    /// Deserialize the record body into a typed value.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(Value::Object(self.data.clone())).map_err(|e| {
            StoreError::InvalidRecord(format!("{}: {}", self.id, e))
        })
    }
}

/// Serialize a typed value into a record body.
pub fn to_record<T: Serialize>(value: &T) -> Result<Record, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidRecord(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Equality filter on a single top-level field.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    /// `field == value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether `record` satisfies this filter.
    ///
    /// A missing or null field matches an empty-string filter, so records
    /// written without `assignedTo` count as unassigned.
    pub fn matches(&self, record: &Record) -> bool {
        match record.get(&self.field) {
            Some(Value::Null) | None => self.value.as_str() == Some(""),
            Some(v) => v == &self.value,
        }
    }
}

/// Result of an [`RecordStore::upsert_by`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Upserted {
    pub id: String,
    /// `true` when a new record was inserted, `false` when one was updated.
    pub created: bool,
}

/// Record store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("record {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Collection-scoped record storage.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a record, returning its new id.
    async fn add(&self, collection: &str, record: Record) -> Result<String, StoreError>;

    /// Fetch a record by id.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Records matching `filter` (all records when `None`) in insertion order,
    /// truncated to `limit` when given.
    async fn query(
        &self,
        collection: &str,
        filter: Option<&Filter>,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError>;

    /// Shallow-merge `partial` into an existing record.
    async fn update(&self, collection: &str, id: &str, partial: Record) -> Result<(), StoreError>;

    /// Merge `partial` only if the record currently satisfies `expected`.
    ///
    /// Returns `false` (and writes nothing) when the condition does not hold.
    async fn update_if(
        &self,
        collection: &str,
        id: &str,
        expected: &Filter,
        partial: Record,
    ) -> Result<bool, StoreError>;

    /// Insert `record` (with the key field set) unless a record already
    /// matches `key`. Returns the new id, or `None` when the key is taken.
    async fn insert_unique(
        &self,
        collection: &str,
        key: &Filter,
        record: Record,
    ) -> Result<Option<String>, StoreError>;

    /// Update the first record matching `key`, or insert `record` (with the
    /// key field set) when none matches.
    async fn upsert_by(
        &self,
        collection: &str,
        key: &Filter,
        record: Record,
    ) -> Result<Upserted, StoreError>;
}
