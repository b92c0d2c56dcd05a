//! Config loader — reads `~/.linkbot/config.json`, merges env vars, and
//! applies legacy migrations.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.linkbot/config.json`
//! 3. Environment variables `LINKBOT_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let mut raw: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    migrate_config(&mut raw);

    let config: Config = match serde_json::from_value(raw) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to deserialize config: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply legacy config migrations.
///
/// Moves top-level `jwtSecret` → `auth.jwtSecret` and
/// `channelAccessToken` → `line.channelAccessToken`.
fn migrate_config(raw: &mut serde_json::Value) {
    let Some(root) = raw.as_object_mut() else {
        return;
    };

    for (legacy, section, field) in [
        ("jwtSecret", "auth", "jwtSecret"),
        ("channelAccessToken", "line", "channelAccessToken"),
    ] {
        let Some(value) = root.remove(legacy) else {
            continue;
        };
        let target = root
            .entry(section)
            .or_insert_with(|| serde_json::json!({}));
        if let Some(obj) = target.as_object_mut() {
            if !obj.contains_key(field) {
                obj.insert(field.to_string(), value);
                debug!("Migrated {} → {}.{}", legacy, section, field);
            }
        }
    }
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `LINKBOT_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `LINKBOT_LINE__API_BASE` → `line.api_base`
/// - `LINKBOT_LINE__CHANNEL_ACCESS_TOKEN` → `line.channel_access_token`
/// - `LINKBOT_LINE__TIMEOUT_SECS` → `line.timeout_secs`
/// - `LINKBOT_AUTH__JWT_SECRET` → `auth.jwt_secret`
/// - `LINKBOT_AUTH__TOKEN_TTL_HOURS` → `auth.token_ttl_hours`
/// - `LINKBOT_STORE__PATH` → `store.path`
fn apply_env_overrides(mut config: Config) -> Config {
    // Messaging provider
    if let Ok(val) = std::env::var("LINKBOT_LINE__API_BASE") {
        config.line.api_base = val;
    }
    if let Ok(val) = std::env::var("LINKBOT_LINE__CHANNEL_ACCESS_TOKEN") {
        config.line.channel_access_token = val;
    }
    if let Ok(val) = std::env::var("LINKBOT_LINE__TIMEOUT_SECS") {
        if let Ok(n) = val.parse::<u64>() {
            config.line.timeout_secs = n;
        }
    }

    // Auth
    if let Ok(val) = std::env::var("LINKBOT_AUTH__JWT_SECRET") {
        config.auth.jwt_secret = val;
    }
    if let Ok(val) = std::env::var("LINKBOT_AUTH__TOKEN_TTL_HOURS") {
        if let Ok(n) = val.parse::<u64>() {
            config.auth.token_ttl_hours = n;
        }
    }

    // Store
    if let Ok(val) = std::env::var("LINKBOT_STORE__PATH") {
        config.store.path = val;
    }

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_missing_file() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json"));
        assert_eq!(config.line.timeout_secs, 30);
        assert_eq!(config.auth.token_ttl_hours, 168);
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(
            r#"{
            "line": {
                "apiBase": "http://localhost:9000",
                "timeoutSecs": 5
            }
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.line.api_base, "http://localhost:9000");
        assert_eq!(config.line.timeout_secs, 5);
        // Default preserved
        assert_eq!(config.auth.token_ttl_hours, 168);
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        let config = load_config_from_path(file.path());
        assert_eq!(config.line.api_base, "https://api.line.me");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.line.channel_access_token = "chan-tok".to_string();
        config.auth.token_ttl_hours = 12;

        save_config(&config, Some(&path)).unwrap();

        let reloaded = load_config_from_path(&path);
        assert_eq!(reloaded.line.channel_access_token, "chan-tok");
        assert_eq!(reloaded.auth.token_ttl_hours, 12);
    }

    #[test]
    fn test_migrate_legacy_top_level_secret() {
        let file = write_temp_json(r#"{ "jwtSecret": "legacy", "channelAccessToken": "tok" }"#);

        let config = load_config_from_path(file.path());
        assert_eq!(config.auth.jwt_secret, "legacy");
        assert_eq!(config.line.channel_access_token, "tok");
    }

    #[test]
    fn test_migrate_no_overwrite() {
        let file = write_temp_json(
            r#"{
            "jwtSecret": "legacy",
            "auth": { "jwtSecret": "current" }
        }"#,
        );

        let config = load_config_from_path(file.path());
        // Existing value should NOT be overwritten by migration
        assert_eq!(config.auth.jwt_secret, "current");
    }

    #[test]
    fn test_env_override_store_path() {
        // Only this test reads or writes store.path.
        std::env::set_var("LINKBOT_STORE__PATH", "/srv/linkbot/store.json");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.store.path, "/srv/linkbot/store.json");
        std::env::remove_var("LINKBOT_STORE__PATH");
    }

    #[test]
    fn test_env_override_timeout_ignores_garbage() {
        std::env::set_var("LINKBOT_LINE__TIMEOUT_SECS", "soon");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.line.timeout_secs, 30);
        std::env::remove_var("LINKBOT_LINE__TIMEOUT_SECS");
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        save_config(&Config::default(), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert!(raw["auth"].get("tokenTtlHours").is_some());
        assert!(raw["auth"].get("token_ttl_hours").is_none());
    }
}
