//! `linkbot onboard` — initialize configuration and data directory.
//!
//! - Creates `~/.linkbot/config.json` with defaults
//! - Creates the directory that will hold the record store

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use linkbot_core::config::{get_config_path, load_config, save_config, Config};
use linkbot_core::utils::get_data_path;

use crate::helpers::expand_tilde;

/// Run the onboard command.
pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔗 Linkbot — Setup".cyan().bold());
    println!();

    std::fs::create_dir_all(get_data_path())?;
    let config_path = get_config_path();
    let config = ensure_config(&config_path)?;

    let store_path = expand_tilde(&config.store.path);
    if let Some(parent) = store_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    println!("  {} store at {}", "✓".green(), store_path.display());

    println!();
    if !config.auth.is_configured() {
        println!(
            "  {} set {} before registering accounts",
            "!".yellow(),
            "auth.jwtSecret".bold()
        );
    }
    if !config.line.is_configured() {
        println!(
            "  {} set {} to send webhook notices",
            "!".yellow(),
            "line.channelAccessToken".bold()
        );
    }
    println!(
        "{}",
        "  Setup complete! Run `linkbot account register` to create an account.".green()
    );
    println!();

    Ok(())
}

/// Write a default config at `path` unless one exists. Returns the config in effect.
fn ensure_config(path: &Path) -> Result<Config> {
    if path.exists() {
        println!("  {} config already exists at {}", "✓".green(), path.display());
    } else {
        let config = load_config(Some(path)); // defaults + env
        save_config(&config, Some(path))
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("  {} created config at {}", "✓".green(), path.display());
    }
    Ok(load_config(Some(path)))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
