//! Utility helpers — data directory, timestamps, string masking.

use std::path::PathBuf;

/// Get the Linkbot data directory (e.g. `~/.linkbot/`).
pub fn get_data_path() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".linkbot")
}

/// Current time in milliseconds since the epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Mask a secret for display, keeping the first `keep` characters.
/// Unicode-safe.
pub fn mask_secret(s: &str, keep: usize) -> String {
    if s.is_empty() {
        return String::new();
    }
    let head: String = s.chars().take(keep).collect();
    format!("{head}...")
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("abcdefghijkl", 4), "abcd...");
        assert_eq!(mask_secret("ab", 4), "ab...");
        assert_eq!(mask_secret("", 4), "");
    }

    #[test]
    fn test_mask_secret_unicode() {
        assert_eq!(mask_secret("こんにちは世界", 2), "こん...");
    }

    #[test]
    fn test_data_path_ends_with_linkbot() {
        assert!(get_data_path().ends_with(".linkbot"));
    }

    #[test]
    fn test_now_millis_is_recent() {
        // 2020-01-01 in milliseconds
        assert!(now_millis() > 1_577_836_800_000);
    }
}
