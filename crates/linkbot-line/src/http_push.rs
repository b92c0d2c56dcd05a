//! HTTP push client for the messaging provider.
//!
//! Sends `POST {api_base}/v2/bot/message/push` with a bearer credential and
//! a `{ "to": ..., "messages": [...] }` body. No retries, no rate limiting.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use linkbot_core::config::LineConfig;

use crate::formatter::MessagePayload;
use crate::traits::{PushApi, PushError, PushResponse};

const PUSH_PATH: &str = "/v2/bot/message/push";

#[derive(Serialize)]
struct PushBody<'a> {
    to: &'a str,
    messages: &'a [MessagePayload],
}

/// [`PushApi`] over HTTPS via `reqwest`.
pub struct HttpPushClient {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.line.me"`).
    api_base: String,
}

impl std::fmt::Debug for HttpPushClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPushClient")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl HttpPushClient {
    pub fn new(config: &LineConfig) -> Result<Self, PushError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PushError::Client(e.to_string()))?;

        Ok(HttpPushClient {
            client,
            api_base: config.api_base.clone(),
        })
    }

    /// Build the full push URL.
    fn push_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{base}{PUSH_PATH}")
    }
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[async_trait]
impl PushApi for HttpPushClient {
    async fn push(
        &self,
        access_token: &str,
        to: &str,
        messages: &[MessagePayload],
    ) -> Result<PushResponse, PushError> {
        debug!(to, messages = messages.len(), "Pushing message");

        let result = self
            .client
            .post(self.push_url())
            .bearer_auth(access_token)
            .json(&PushBody { to, messages })
            .send()
            .await;

        let response = match result {
            Ok(resp) => resp,
            Err(e) => {
                error!(to, error = %e, "Push request failed");
                return Err(PushError::Network(e.to_string()));
            }
        };

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| PushError::Network(format!("failed to read push response: {e}")))?;
        let body = parse_body(&text);

        if (200..300).contains(&status) {
            debug!(to, status, "Push accepted");
        } else {
            error!(to, status, body = %text, "Push rejected");
        }

        Ok(PushResponse { status, body })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
