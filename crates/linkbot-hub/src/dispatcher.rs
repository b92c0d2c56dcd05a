//! Webhook dispatcher — drives one inbound chat event to a binding outcome.
//!
//! | Event | Outcome | Notice |
//! |---|---|---|
//! | no chat user id | `Ignored` | none |
//! | token verifies | `Bound` (binding written) | confirmation |
//! | token fails verification | `Rejected` | none |
//! | no token, no binding | `Unlinked` | "scan the QR code again" |
//! | no token, binding exists | `Linked` | greeting |
//!
//! [`WebhookDispatcher::dispatch`] never returns an error. Store failures
//! become `Failed`, and the notice push is reported separately from the
//! state change so a committed binding with an undelivered confirmation is
//! visible to the caller.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use linkbot_core::config::LineConfig;
use linkbot_core::store::RecordStore;
use linkbot_line::{MessagePayload, PushApi, WebhookBody};

use crate::bindings::BindingStore;
use crate::identity::IdentityService;

/// State reached by one inbound event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The event carried no chat user identity.
    Ignored,
    /// A verified token bound the chat user to an account.
    Bound {
        account_id: String,
        chat_user_id: String,
    },
    /// No token and no binding for the chat user.
    Unlinked { chat_user_id: String },
    /// The chat user is already bound.
    Linked { account_id: String },
    /// The token failed verification.
    Rejected { reason: String },
    /// The binding store could not be read or written.
    Failed { reason: String },
}

/// How the caller should treat an outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    Handled,
    SoftFailure,
    HardFailure,
}

/// Result of the notice pushed back to the chat user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    NotAttempted,
    Sent { status: u16 },
    Failed { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchReport {
    pub outcome: DispatchOutcome,
    pub notice: Notice,
}

impl DispatchOutcome {
    /// Wire status: `ignored`, `bound`, `unlinked`, `linked` or `error`.
    pub fn status(&self) -> &'static str {
        match self {
            DispatchOutcome::Ignored => "ignored",
            DispatchOutcome::Bound { .. } => "bound",
            DispatchOutcome::Unlinked { .. } => "unlinked",
            DispatchOutcome::Linked { .. } => "linked",
            DispatchOutcome::Rejected { .. } | DispatchOutcome::Failed { .. } => "error",
        }
    }

    pub fn disposition(&self) -> Disposition {
        match self {
            DispatchOutcome::Rejected { .. } => Disposition::SoftFailure,
            DispatchOutcome::Failed { .. } => Disposition::HardFailure,
            _ => Disposition::Handled,
        }
    }
}

impl DispatchReport {
    fn new(outcome: DispatchOutcome, notice: Notice) -> Self {
        Self { outcome, notice }
    }

    pub fn status(&self) -> &'static str {
        self.outcome.status()
    }

    pub fn disposition(&self) -> Disposition {
        self.outcome.disposition()
    }

    /// A notice was attempted and did not reach the provider.
    pub fn notify_failed(&self) -> bool {
        matches!(self.notice, Notice::Failed { .. })
    }

    /// JSON body answered to the webhook caller.
    pub fn response(&self) -> Value {
        let mut body = Map::new();
        body.insert("status".into(), json!(self.status()));
        match &self.outcome {
            DispatchOutcome::Bound {
                account_id,
                chat_user_id,
            } => {
                body.insert("accountId".into(), json!(account_id));
                body.insert("chatUserId".into(), json!(chat_user_id));
            }
            DispatchOutcome::Unlinked { chat_user_id } => {
                body.insert("chatUserId".into(), json!(chat_user_id));
            }
            DispatchOutcome::Linked { account_id } => {
                body.insert("accountId".into(), json!(account_id));
            }
            DispatchOutcome::Rejected { reason } | DispatchOutcome::Failed { reason } => {
                body.insert("error".into(), json!(reason));
            }
            DispatchOutcome::Ignored => {}
        }
        body.insert("notifyFailed".into(), json!(self.notify_failed()));
        Value::Object(body)
    }
}

fn confirmation_text(chat_user_id: &str, account_id: &str) -> String {
    format!("✅ Connected!\nChat ID: {chat_user_id}\nAccount: {account_id}")
}

const UNLINKED_TEXT: &str =
    "❗ This chat is not linked to an account yet. Please scan the QR code again to connect.";

fn greeting_text(account_id: &str) -> String {
    format!("📬 Hello {account_id}, your message has been received!")
}

pub struct WebhookDispatcher {
    bindings: BindingStore,
    identity: Arc<dyn IdentityService>,
    push: Arc<dyn PushApi>,
    /// Credential for notices pushed back to the chat user.
    channel_access_token: String,
}

impl WebhookDispatcher {
    pub fn new(
        store: Arc<dyn RecordStore>,
        identity: Arc<dyn IdentityService>,
        push: Arc<dyn PushApi>,
        config: &LineConfig,
    ) -> Self {
        Self {
            bindings: BindingStore::new(store),
            identity,
            push,
            channel_access_token: config.channel_access_token.clone(),
        }
    }

    /// Handle one webhook delivery. `token` is the out-of-band binding token.
    pub async fn dispatch(&self, body: &WebhookBody, token: Option<&str>) -> DispatchReport {
        let Some(chat_user_id) = body.chat_user_id() else {
            debug!(events = body.events.len(), "webhook without chat user ignored");
            return DispatchReport::new(DispatchOutcome::Ignored, Notice::NotAttempted);
        };
        if let Some(event) = body.first_event() {
            debug!(chat_user_id, kind = event.kind(), "webhook event");
        }

        match token.filter(|t| !t.is_empty()) {
            Some(token) => self.bind(chat_user_id, token).await,
            None => self.route(chat_user_id).await,
        }
    }

    async fn bind(&self, chat_user_id: &str, token: &str) -> DispatchReport {
        let claims = match self.identity.verify(token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!(chat_user_id, error = %e, "binding token rejected");
                return DispatchReport::new(
                    DispatchOutcome::Rejected {
                        reason: e.to_string(),
                    },
                    Notice::NotAttempted,
                );
            }
        };

        let account_id = claims.sub;
        if let Err(e) = self.bindings.bind(&account_id, chat_user_id).await {
            warn!(chat_user_id, account_id = %account_id, error = %e, "binding failed");
            return DispatchReport::new(
                DispatchOutcome::Failed {
                    reason: e.to_string(),
                },
                Notice::NotAttempted,
            );
        }

        let notice = self
            .notify(chat_user_id, confirmation_text(chat_user_id, &account_id))
            .await;
        DispatchReport::new(
            DispatchOutcome::Bound {
                account_id,
                chat_user_id: chat_user_id.to_string(),
            },
            notice,
        )
    }

    async fn route(&self, chat_user_id: &str) -> DispatchReport {
        match self.bindings.find_by_chat_user(chat_user_id).await {
            Ok(Some(binding)) => {
                let notice = self
                    .notify(chat_user_id, greeting_text(&binding.account_id))
                    .await;
                DispatchReport::new(
                    DispatchOutcome::Linked {
                        account_id: binding.account_id,
                    },
                    notice,
                )
            }
            Ok(None) => {
                info!(chat_user_id, "message from unlinked chat user");
                let notice = self.notify(chat_user_id, UNLINKED_TEXT.to_string()).await;
                DispatchReport::new(
                    DispatchOutcome::Unlinked {
                        chat_user_id: chat_user_id.to_string(),
                    },
                    notice,
                )
            }
            Err(e) => {
                warn!(chat_user_id, error = %e, "binding lookup failed");
                DispatchReport::new(
                    DispatchOutcome::Failed {
                        reason: e.to_string(),
                    },
                    Notice::NotAttempted,
                )
            }
        }
    }

    async fn notify(&self, chat_user_id: &str, text: String) -> Notice {
        if self.channel_access_token.is_empty() {
            warn!(chat_user_id, "notice skipped: line.channelAccessToken is not set");
            return Notice::Failed {
                reason: "channel access token is not configured".into(),
            };
        }

        let messages = [MessagePayload::text(text)];
        match self
            .push
            .push(&self.channel_access_token, chat_user_id, &messages)
            .await
        {
            Ok(response) if response.is_success() => Notice::Sent {
                status: response.status,
            },
            Ok(response) => {
                warn!(chat_user_id, status = response.status, "notice rejected");
                Notice::Failed {
                    reason: format!("push answered with status {}", response.status),
                }
            }
            Err(e) => {
                warn!(chat_user_id, error = %e, "notice failed");
                Notice::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
