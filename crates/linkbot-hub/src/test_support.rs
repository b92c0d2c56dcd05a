//! Fakes shared by the hub's unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use linkbot_core::store::{Filter, MemoryStore, RecordStore};
use linkbot_line::{MessagePayload, PushApi, PushError, PushResponse};

/// One recorded push call.
#[derive(Clone, Debug)]
pub struct PushCall {
    pub access_token: String,
    pub to: String,
    pub messages: Vec<MessagePayload>,
}

/// [`PushApi`] that records calls and answers per access token.
#[derive(Default)]
pub struct RecordingPush {
    calls: Mutex<Vec<PushCall>>,
    statuses: Mutex<HashMap<String, u16>>,
    network_failures: Mutex<Vec<String>>,
}

impl RecordingPush {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer pushes made with `access_token` with `status`.
    pub fn respond_with(&self, access_token: &str, status: u16) {
        self.statuses
            .lock()
            .unwrap()
            .insert(access_token.to_string(), status);
    }

    /// Fail pushes made with `access_token` with a transport error.
    pub fn fail_network(&self, access_token: &str) {
        self.network_failures
            .lock()
            .unwrap()
            .push(access_token.to_string());
    }

    pub fn calls(&self) -> Vec<PushCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushApi for RecordingPush {
    async fn push(
        &self,
        access_token: &str,
        to: &str,
        messages: &[MessagePayload],
    ) -> Result<PushResponse, PushError> {
        self.calls.lock().unwrap().push(PushCall {
            access_token: access_token.to_string(),
            to: to.to_string(),
            messages: messages.to_vec(),
        });

        if self
            .network_failures
            .lock()
            .unwrap()
            .iter()
            .any(|t| t == access_token)
        {
            return Err(PushError::Network("connection reset".into()));
        }

        let status = self
            .statuses
            .lock()
            .unwrap()
            .get(access_token)
            .copied()
            .unwrap_or(200);
        Ok(PushResponse {
            status,
            body: json!({"status": status}),
        })
    }
}

pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

/// Number of records in `collection`.
pub async fn count(store: &dyn RecordStore, collection: &str) -> usize {
    store.query(collection, None, None).await.unwrap().len()
}

/// Number of records in `collection` with `field == value`.
pub async fn count_where(store: &dyn RecordStore, collection: &str, field: &str, value: &str) -> usize {
    store
        .query(collection, Some(&Filter::eq(field, value)), None)
        .await
        .unwrap()
        .len()
}
