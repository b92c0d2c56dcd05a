//! Configuration system — schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use linkbot_core::config;
//!
//! let cfg = config::load_config(None);
//! println!("Push API: {}", cfg.line.api_base);
//! ```

pub mod loader;
pub mod schema;

// Re-export key types
pub use loader::{get_config_path, load_config, save_config};
pub use schema::{AuthConfig, Config, LineConfig, StoreConfig};
