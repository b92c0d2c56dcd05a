//! Messaging provider layer for Linkbot.
//!
//! # Architecture
//!
//! - [`formatter`] — text command → provider message payloads
//! - [`webhook`] — inbound webhook payload types
//! - [`traits::PushApi`] — the push endpoint seam every sender goes through
//! - [`http_push::HttpPushClient`] — `reqwest` implementation of [`PushApi`]

pub mod formatter;
pub mod http_push;
pub mod traits;
pub mod webhook;

// Re-export main types for convenience
pub use formatter::{format, format_checked, FormatError, MessagePayload};
pub use http_push::HttpPushClient;
pub use traits::{PushApi, PushError, PushResponse};
pub use webhook::{EventSource, WebhookBody, WebhookEvent};
