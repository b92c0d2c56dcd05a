//! Inbound webhook payload types.
//!
//! Only the fields the dispatcher consumes are modelled; everything is
//! optional so a malformed delivery degrades to "no chat user" instead of
//! a parse failure.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Body of a webhook delivery.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookBody {
    /// Bot user id that received the events.
    pub destination: Option<String>,
    pub events: Vec<WebhookEvent>,
}

/// A single webhook event.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub reply_token: Option<String>,
    pub source: Option<EventSource>,
    /// Raw message object for `message` events.
    pub message: Option<Value>,
    pub timestamp: Option<i64>,
}

/// Where an event came from.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventSource {
    #[serde(rename = "type")]
    pub source_type: Option<String>,
    pub user_id: Option<String>,
    pub group_id: Option<String>,
    pub room_id: Option<String>,
}

impl WebhookBody {
    /// Parse a raw delivery. Bodies that do not match the expected shape are
    /// treated as carrying no events.
    pub fn from_value(value: &Value) -> Self {
        match serde_json::from_value(value.clone()) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "unrecognised webhook body");
                WebhookBody::default()
            }
        }
    }

    /// The event the dispatcher acts on.
    pub fn first_event(&self) -> Option<&WebhookEvent> {
        self.events.first()
    }

    /// Chat-user id of the first event, if present and non-empty.
    pub fn chat_user_id(&self) -> Option<&str> {
        self.first_event().and_then(WebhookEvent::user_id)
    }
}

impl WebhookEvent {
    pub fn user_id(&self) -> Option<&str> {
        self.source
            .as_ref()
            .and_then(|s| s.user_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn kind(&self) -> &str {
        self.event_type.as_deref().unwrap_or("unknown")
    }
}
