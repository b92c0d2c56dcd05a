//! Configuration schema.
//!
//! Hierarchy: `Config` → `LineConfig`, `AuthConfig`, `StoreConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.linkbot/config.json` + env vars.
///
/// Each service receives the section it needs at construction time.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub line: LineConfig,
    pub auth: AuthConfig,
    pub store: StoreConfig,
}

// ─────────────────────────────────────────────
// Messaging provider
// ─────────────────────────────────────────────

/// Push endpoint settings and the channel credential used for webhook notices.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineConfig {
    /// API base URL; the push path is appended to it.
    pub api_base: String,
    /// Bearer credential for notices sent from the webhook.
    pub channel_access_token: String,
    /// Per-request timeout for push calls.
    pub timeout_secs: u64,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.line.me".to_string(),
            channel_access_token: String::new(),
            timeout_secs: 30,
        }
    }
}

impl LineConfig {
    /// Whether webhook notices can be sent.
    pub fn is_configured(&self) -> bool {
        !self.channel_access_token.is_empty()
    }
}

// ─────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────

/// Session-token signing settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthConfig {
    /// HMAC secret for issuing and verifying tokens.
    pub jwt_secret: String,
    /// Token lifetime.
    pub token_ttl_hours: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: 24 * 7,
        }
    }
}

impl AuthConfig {
    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty()
    }
}

// ─────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────

/// Record store location.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Path of the JSON store file (`~` is expanded).
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "~/.linkbot/store.json".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.line.api_base, "https://api.line.me");
        assert_eq!(config.line.timeout_secs, 30);
        assert_eq!(config.auth.token_ttl_hours, 168);
        assert_eq!(config.store.path, "~/.linkbot/store.json");
        assert!(!config.line.is_configured());
        assert!(!config.auth.is_configured());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"line": {"channelAccessToken": "chan-tok"}, "auth": {"jwtSecret": "s3cret"}}"#,
        )
        .unwrap();
        assert!(config.line.is_configured());
        assert_eq!(config.line.api_base, "https://api.line.me");
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert_eq!(config.auth.token_ttl_hours, 168);
    }

    #[test]
    fn test_serializes_camel_case() {
        let value = serde_json::to_value(Config::default()).unwrap();
        assert!(value["line"].get("channelAccessToken").is_some());
        assert!(value["line"].get("channel_access_token").is_none());
        assert!(value["auth"].get("tokenTtlHours").is_some());
    }
}
