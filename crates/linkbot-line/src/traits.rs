//! Push API trait — the seam between Linkbot services and the messaging
//! provider's push endpoint.
//!
//! `HttpPushClient` in `http_push.rs` is the production implementation;
//! tests substitute recording fakes.

use async_trait::async_trait;
use linkbot_core::LinkbotError;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::formatter::MessagePayload;

/// What the push endpoint answered.
///
/// The status code is the only delivery signal: 2xx means the provider
/// accepted the push, not that the recipient saw it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PushResponse {
    pub status: u16,
    /// Response body as JSON; non-JSON bodies are kept as a string,
    /// empty bodies as `null`.
    pub body: Value,
}

impl PushResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Push call failures that produced no HTTP response.
#[derive(Debug, Error)]
pub enum PushError {
    /// Connection, timeout, or body-read failure.
    #[error("push request failed: {0}")]
    Network(String),

    /// The HTTP client could not be constructed.
    #[error("push client error: {0}")]
    Client(String),
}

impl From<PushError> for LinkbotError {
    fn from(err: PushError) -> Self {
        LinkbotError::RemoteDelivery(err.to_string())
    }
}

/// A messaging provider push endpoint.
#[async_trait]
pub trait PushApi: Send + Sync {
    /// Push `messages` to the chat user `to`, authenticating with `access_token`.
    ///
    /// Non-2xx answers are returned as `Ok`; only transport failures are `Err`.
    async fn push(
        &self,
        access_token: &str,
        to: &str,
        messages: &[MessagePayload],
    ) -> Result<PushResponse, PushError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_range() {
        let ok = PushResponse {
            status: 200,
            body: json!({}),
        };
        assert!(ok.is_success());
        let accepted = PushResponse {
            status: 299,
            body: Value::Null,
        };
        assert!(accepted.is_success());
        let limited = PushResponse {
            status: 429,
            body: json!({"message": "rate limited"}),
        };
        assert!(!limited.is_success());
    }

    #[test]
    fn test_push_error_maps_to_remote_delivery() {
        let err: LinkbotError = PushError::Network("connection refused".into()).into();
        assert!(matches!(err, LinkbotError::RemoteDelivery(_)));
        assert!(err.to_string().contains("connection refused"));
    }
}
