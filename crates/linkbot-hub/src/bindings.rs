//! Chat-user ↔ account bindings.
//!
//! A chat user is bound to at most one account. Binding again replaces the
//! account instead of adding a second record.

use std::sync::Arc;

use tracing::info;

use linkbot_core::store::{collections, to_record, Filter, RecordStore};
use linkbot_core::types::Binding;
use linkbot_core::{LinkbotError, Result};

const CHAT_USER_ID: &str = "chatUserId";

/// Result of [`BindingStore::bind`].
#[derive(Clone, Debug, PartialEq)]
pub struct BindOutcome {
    pub binding: Binding,
    /// `false` when an existing binding for the chat user was replaced.
    pub created: bool,
}

#[derive(Clone)]
pub struct BindingStore {
    store: Arc<dyn RecordStore>,
}

impl BindingStore {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Bind `chat_user_id` to `account_id`.
    pub async fn bind(&self, account_id: &str, chat_user_id: &str) -> Result<BindOutcome> {
        if account_id.is_empty() || chat_user_id.is_empty() {
            return Err(LinkbotError::validation(
                "account id and chat user id are required",
            ));
        }

        let binding = Binding::new(account_id, chat_user_id);
        let upserted = self
            .store
            .upsert_by(
                collections::BINDINGS,
                &Filter::eq(CHAT_USER_ID, chat_user_id),
                to_record(&binding)?,
            )
            .await?;

        info!(
            account_id,
            chat_user_id,
            created = upserted.created,
            "chat user bound"
        );
        Ok(BindOutcome {
            binding,
            created: upserted.created,
        })
    }

    /// The binding for `chat_user_id`, if any.
    pub async fn find_by_chat_user(&self, chat_user_id: &str) -> Result<Option<Binding>> {
        if chat_user_id.is_empty() {
            return Ok(None);
        }
        let docs = self
            .store
            .query(
                collections::BINDINGS,
                Some(&Filter::eq(CHAT_USER_ID, chat_user_id)),
                Some(1),
            )
            .await?;

        docs.first()
            .map(|doc| doc.decode::<Binding>())
            .transpose()
            .map_err(Into::into)
    }

    /// Every chat user bound to `account_id`.
    pub async fn bindings_for_account(&self, account_id: &str) -> Result<Vec<Binding>> {
        let docs = self
            .store
            .query(
                collections::BINDINGS,
                Some(&Filter::eq("accountId", account_id)),
                None,
            )
            .await?;
        docs.iter()
            .map(|doc| doc.decode::<Binding>().map_err(LinkbotError::from))
            .collect()
    }
}
