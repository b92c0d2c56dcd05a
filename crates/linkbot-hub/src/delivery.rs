//! Delivery engine — outbound sends through an account's bot.
//!
//! A single send resolves the caller's bot, pushes one formatted message and
//! appends a delivery log entry whatever status the provider answers with.
//! A broadcast pushes to every bot, isolating per-recipient failures, and is
//! not logged.

use std::sync::Arc;

use tracing::{error, info, warn};

use linkbot_core::store::{collections, to_record, RecordStore};
use linkbot_core::types::{BroadcastResult, LogEntry};
use linkbot_core::utils::now_millis;
use linkbot_core::{LinkbotError, Result};
use linkbot_line::{format, PushApi, PushResponse};

use crate::bots::BotDirectory;

/// Status recorded for a broadcast recipient whose push never got an answer.
const NETWORK_FAILURE_STATUS: u16 = 500;

pub struct DeliveryEngine {
    store: Arc<dyn RecordStore>,
    bots: BotDirectory,
    push: Arc<dyn PushApi>,
}

impl DeliveryEngine {
    pub fn new(store: Arc<dyn RecordStore>, push: Arc<dyn PushApi>) -> Self {
        Self {
            bots: BotDirectory::new(store.clone()),
            store,
            push,
        }
    }

    /// Send `message` through the bot assigned to `account_id`.
    ///
    /// Fails with `NotLinked` before any push when the account has no bot.
    /// A transport failure propagates as `RemoteDelivery` and is not logged.
    pub async fn send(&self, account_id: &str, message: &str) -> Result<PushResponse> {
        let bot = self
            .bots
            .get_bot_by_account(account_id)
            .await?
            .ok_or_else(|| LinkbotError::NotLinked(account_id.to_string()))?;

        let messages = format(message);
        let response = self
            .push
            .push(&bot.access_token, &bot.chat_user_id, &messages)
            .await?;

        if !response.is_success() {
            warn!(account_id, bot = %bot.display_name(), status = response.status, "push not accepted");
        }

        let entry = LogEntry {
            account_id: account_id.to_string(),
            bot_name: bot.name.clone(),
            message: message.to_string(),
            timestamp: now_millis(),
        };
        self.store.add(collections::LOGS, to_record(&entry)?).await?;

        info!(account_id, bot = %bot.display_name(), status = response.status, "message sent");
        Ok(response)
    }

    /// Push `message` to every bot.
    ///
    /// Every bot must carry a chat user id and an access token, otherwise
    /// nothing is sent. Per-recipient failures are reported in the result.
    pub async fn broadcast(&self, message: &str) -> Result<Vec<BroadcastResult>> {
        let bots = self.bots.list_bots().await?;

        for bot in &bots {
            let missing = if bot.chat_user_id.is_empty() {
                Some("chatUserId")
            } else if bot.access_token.is_empty() {
                Some("accessToken")
            } else {
                None
            };
            if let Some(field) = missing {
                error!(bot = %bot.display_name(), field, "broadcast aborted");
                return Err(LinkbotError::MalformedBot {
                    bot: bot.display_name().to_string(),
                    field,
                });
            }
        }

        let messages = format(message);
        let mut results = Vec::with_capacity(bots.len());

        for bot in &bots {
            let status = match self
                .push
                .push(&bot.access_token, &bot.chat_user_id, &messages)
                .await
            {
                Ok(response) => response.status,
                Err(e) => {
                    error!(bot = %bot.display_name(), error = %e, "broadcast push failed");
                    NETWORK_FAILURE_STATUS
                }
            };
            results.push(BroadcastResult {
                bot_name: bot.display_name().to_string(),
                status,
            });
        }

        info!(recipients = results.len(), "broadcast finished");
        Ok(results)
    }

    /// Every delivery log entry, newest first.
    pub async fn logs(&self) -> Result<Vec<LogEntry>> {
        let docs = self.store.query(collections::LOGS, None, None).await?;
        let mut entries = docs
            .iter()
            .map(|doc| doc.decode::<LogEntry>())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // Entries written in the same millisecond stay newest-first.
        entries.reverse();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
