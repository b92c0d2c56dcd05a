//! Shared CLI helpers — path expansion and output formatting.

use std::path::PathBuf;

use colored::Colorize;
use serde_json::Value;

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Print a success line.
pub fn print_ok(message: &str) {
    println!("  {} {}", "✓".green(), message);
}

/// Print a pretty JSON value.
pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{value}"),
    }
}

/// Print a section heading.
pub fn print_heading(title: &str) {
    println!();
    println!("{}", format!("  {title}").cyan().bold());
    println!();
}

/// Format a Unix epoch timestamp (ms) as a local datetime string.
pub fn format_timestamp_ms(ms: i64) -> String {
    use chrono::{Local, TimeZone};
    match Local.timestamp_millis_opt(ms) {
        chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        _ => "—".to_string(),
    }
}

/// `"✓ <text>"` in green, or `"· <fallback>"` dimmed.
pub fn check_mark(ok: bool, text: &str, fallback: &str) -> String {
    if ok {
        format!("{} {}", "✓".green(), text)
    } else {
        format!("{}", format!("· {fallback}").dimmed())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_tilde_home() {
        let result = expand_tilde("~/foo/bar");
        assert!(result.ends_with("foo/bar"));
        assert!(!result.starts_with("~"));
    }

    #[test]
    fn expand_tilde_no_tilde() {
        let result = expand_tilde("/absolute/path");
        assert_eq!(result, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn expand_tilde_relative() {
        let result = expand_tilde("relative/path");
        assert_eq!(result, PathBuf::from("relative/path"));
    }

    #[test]
    fn timestamp_formats() {
        let result = format_timestamp_ms(1_707_696_000_000);
        assert!(result.starts_with("2024-02-1"));
    }

    #[test]
    fn check_mark_variants() {
        colored::control::set_override(false);
        assert_eq!(check_mark(true, "set", "missing"), "✓ set");
        assert_eq!(check_mark(false, "set", "missing"), "· missing");
    }
}
