//! Bot directory — which messaging bot belongs to which account.
//!
//! A bot with an empty `assignedTo` sits in the available pool. Checkout
//! from the pool is a conditional write on `assignedTo`, so two callers can
//! never claim the same bot.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use linkbot_core::store::{collections, to_record, Filter, RecordStore};
use linkbot_core::types::Bot;
use linkbot_core::utils::now_millis;
use linkbot_core::{LinkbotError, Result};

const ASSIGNED_TO: &str = "assignedTo";

/// Fields for a new bot record.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBot {
    pub name: String,
    pub access_token: String,
    pub chat_user_id: String,
    pub assigned_to: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BotRecord<'a> {
    #[serde(flatten)]
    bot: &'a NewBot,
    created_at: i64,
}

/// Account ↔ bot assignments over the record store.
#[derive(Clone)]
pub struct BotDirectory {
    store: Arc<dyn RecordStore>,
}

impl BotDirectory {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Create a bot already assigned to `bot.assigned_to`.
    ///
    /// Existing assignments of the same account are not checked.
    pub async fn create_bot(&self, bot: NewBot) -> Result<String> {
        if bot.assigned_to.is_empty() {
            return Err(LinkbotError::validation("assignedTo is required"));
        }
        let id = self.insert(&bot).await?;
        info!(bot = %bot.name, id = %id, account_id = %bot.assigned_to, "bot created");
        Ok(id)
    }

    /// Create an unassigned bot in the available pool.
    pub async fn add_pool_bot(
        &self,
        name: impl Into<String>,
        access_token: impl Into<String>,
        chat_user_id: impl Into<String>,
    ) -> Result<String> {
        let bot = NewBot {
            name: name.into(),
            access_token: access_token.into(),
            chat_user_id: chat_user_id.into(),
            assigned_to: String::new(),
        };
        let id = self.insert(&bot).await?;
        info!(bot = %bot.name, id = %id, "pool bot added");
        Ok(id)
    }

    async fn insert(&self, bot: &NewBot) -> Result<String> {
        let record = to_record(&BotRecord {
            bot,
            created_at: now_millis(),
        })?;
        Ok(self.store.add(collections::BOTS, record).await?)
    }

    /// The first bot assigned to `account_id`, if any.
    pub async fn get_bot_by_account(&self, account_id: &str) -> Result<Option<Bot>> {
        if account_id.is_empty() {
            return Err(LinkbotError::validation("account id is required"));
        }
        let docs = self
            .store
            .query(
                collections::BOTS,
                Some(&Filter::eq(ASSIGNED_TO, account_id)),
                Some(1),
            )
            .await?;

        docs.first()
            .map(Bot::from_document)
            .transpose()
            .map_err(Into::into)
    }

    /// The first unassigned bot. Read-only: the bot stays in the pool.
    pub async fn get_available_bot(&self) -> Result<Bot> {
        let docs = self
            .store
            .query(collections::BOTS, Some(&Filter::eq(ASSIGNED_TO, "")), Some(1))
            .await?;

        match docs.first() {
            Some(doc) => Ok(Bot::from_document(doc)?),
            None => Err(LinkbotError::NotFound("no available bot".into())),
        }
    }

    /// Atomically take a bot from the pool and assign it to `account_id`.
    ///
    /// Candidates that another caller claims first are skipped. Fails with
    /// `Conflict` if the account already has a bot and `NotFound` when the
    /// pool is empty.
    pub async fn claim_available_bot(&self, account_id: &str) -> Result<Bot> {
        if let Some(existing) = self.get_bot_by_account(account_id).await? {
            return Err(LinkbotError::Conflict(format!(
                "account {account_id} already has bot {}",
                existing.display_name()
            )));
        }

        let unassigned = Filter::eq(ASSIGNED_TO, "");
        let candidates = self
            .store
            .query(collections::BOTS, Some(&unassigned), None)
            .await?;

        for doc in &candidates {
            // Decode first: a bot that cannot be returned must stay in the pool.
            let mut bot = match Bot::from_document(doc) {
                Ok(bot) => bot,
                Err(e) => {
                    warn!(id = %doc.id, error = %e, "skipping unreadable pool bot");
                    continue;
                }
            };

            let mut partial = serde_json::Map::new();
            partial.insert(ASSIGNED_TO.to_string(), json!(account_id));

            if self
                .store
                .update_if(collections::BOTS, &doc.id, &unassigned, partial)
                .await?
            {
                bot.assigned_to = account_id.to_string();
                info!(bot = %bot.display_name(), account_id, "bot claimed from pool");
                return Ok(bot);
            }
            debug!(id = %doc.id, "lost race for pool bot, trying next");
        }

        Err(LinkbotError::NotFound("no available bot".into()))
    }

    /// Every bot, in creation order.
    pub async fn list_bots(&self) -> Result<Vec<Bot>> {
        let docs = self.store.query(collections::BOTS, None, None).await?;
        docs.iter()
            .map(|doc| Bot::from_document(doc).map_err(LinkbotError::from))
            .collect()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
