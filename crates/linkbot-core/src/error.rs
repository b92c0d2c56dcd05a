//! Error taxonomy shared by every Linkbot service.

use thiserror::Error;

use crate::store::StoreError;

/// Convenience alias used across the workspace.
pub type Result<T, E = LinkbotError> = std::result::Result<T, E>;

/// Failures surfaced by the binding and delivery services.
#[derive(Debug, Error)]
pub enum LinkbotError {
    /// A caller-supplied required field was missing or empty.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An expected entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The account has no messaging bot assigned to it.
    #[error("no bot is linked to account {0}")]
    NotLinked(String),

    /// A session token failed signature or expiry checks.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The push endpoint could not be reached or rejected the call.
    #[error("remote delivery failed: {0}")]
    RemoteDelivery(String),

    /// A stored bot record is missing a credential needed for delivery.
    #[error("bot {bot} is missing {field}")]
    MalformedBot { bot: String, field: &'static str },

    /// The caller is not allowed to perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The write would violate a uniqueness rule.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LinkbotError {
    /// Shorthand for a [`LinkbotError::Validation`] error.
    pub fn validation(msg: impl Into<String>) -> Self {
        LinkbotError::Validation(msg.into())
    }
}
