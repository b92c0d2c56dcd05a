//! Linkbot core — shared building blocks for the account-binding service.
//!
//! - [`types`] — accounts, bots, bindings, and delivery log entries
//! - [`error`] — the error taxonomy shared by every service
//! - [`config`] — `~/.linkbot/config.json` schema, loading, env overrides
//! - [`store`] — the collection-scoped record store and its implementations

pub mod config;
pub mod error;
pub mod store;
pub mod types;
pub mod utils;

pub use error::{LinkbotError, Result};
pub use store::{Document, Filter, MemoryStore, Record, RecordStore, StoreError};
