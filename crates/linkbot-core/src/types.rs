//! Core types for Linkbot — accounts, messaging bots, chat bindings, and
//! the delivery audit log.
//!
//! Every type maps to a record in the [`RecordStore`](crate::store::RecordStore)
//! with camelCase field names. The store id is not part of the record body;
//! it is attached when a [`Document`] is decoded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::store::{Document, StoreError};

// ─────────────────────────────────────────────
// Accounts
// ─────────────────────────────────────────────

/// Application-level role of an account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An application account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(skip)]
    pub id: String,
    pub email: String,
    /// Accounts written without a role are plain users.
    #[serde(default)]
    pub role: Role,
}

impl Account {
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let mut account: Account = doc.decode()?;
        account.id = doc.id.clone();
        Ok(account)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// An account together with how many bots are assigned to it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub bot_count: usize,
    pub has_bot: bool,
}

// ─────────────────────────────────────────────
// Bots
// ─────────────────────────────────────────────

/// Messaging-bot credentials, optionally assigned to one account.
///
/// An empty `assigned_to` means the bot is in the available pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bot {
    #[serde(skip)]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    /// Bearer credential for the push endpoint.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub access_token: String,
    /// Chat user that receives this bot's pushes.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub chat_user_id: String,
    /// `null` reads as empty, matching how the store filters `assignedTo`.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub assigned_to: String,
    /// Creation time in milliseconds since the epoch.
    #[serde(default)]
    pub created_at: i64,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Bot {
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let mut bot: Bot = doc.decode()?;
        bot.id = doc.id.clone();
        Ok(bot)
    }

    /// Whether the bot is unassigned.
    pub fn is_available(&self) -> bool {
        self.assigned_to.is_empty()
    }

    /// The owning account, if any.
    pub fn assignee(&self) -> Option<&str> {
        if self.assigned_to.is_empty() {
            None
        } else {
            Some(&self.assigned_to)
        }
    }

    /// Name used in reports; falls back to the id for unnamed bots.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Public view of a pool bot, without its access token.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    pub chat_user_id: String,
    pub assigned: bool,
}

impl From<&Bot> for BotInfo {
    fn from(bot: &Bot) -> Self {
        BotInfo {
            id: bot.id.clone(),
            name: bot.name.clone(),
            chat_user_id: bot.chat_user_id.clone(),
            assigned: !bot.is_available(),
        }
    }
}

// ─────────────────────────────────────────────
// Bindings
// ─────────────────────────────────────────────

/// Link between a chat-user identity and an application account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub account_id: String,
    pub chat_user_id: String,
    pub created_at: DateTime<Utc>,
}

impl Binding {
    pub fn new(account_id: impl Into<String>, chat_user_id: impl Into<String>) -> Self {
        Binding {
            account_id: account_id.into(),
            chat_user_id: chat_user_id.into(),
            created_at: Utc::now(),
        }
    }
}

// ─────────────────────────────────────────────
// Delivery log
// ─────────────────────────────────────────────

/// Audit record written after every single-recipient send.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub account_id: String,
    pub bot_name: String,
    pub message: String,
    /// Milliseconds since the epoch.
    pub timestamp: i64,
}

/// Outcome of one recipient in a broadcast.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastResult {
    pub bot_name: String,
    /// HTTP status returned by the push endpoint, or a synthetic 500 on
    /// network failure.
    pub status: u16,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
