//! Linkbot hub — the services that bind chat identities to accounts and
//! route messages through per-account bots.
//!
//! - [`identity`] — session-token issue/verify
//! - [`accounts`] — registration, login, roles
//! - [`bots`] — the bot directory and pool checkout
//! - [`bindings`] — chat-user → account bindings
//! - [`delivery`] — single sends, broadcasts, and the delivery log
//! - [`dispatcher`] — the inbound webhook state machine

pub mod accounts;
pub mod bindings;
pub mod bots;
pub mod delivery;
pub mod dispatcher;
pub mod identity;

#[cfg(test)]
pub(crate) mod test_support;

pub use accounts::AccountService;
pub use bindings::{BindOutcome, BindingStore};
pub use bots::{BotDirectory, NewBot};
pub use delivery::DeliveryEngine;
pub use dispatcher::{DispatchOutcome, DispatchReport, Disposition, Notice, WebhookDispatcher};
pub use identity::{Claims, IdentityService, JwtIdentity};
