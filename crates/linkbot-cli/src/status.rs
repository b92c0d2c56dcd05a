//! `linkbot status` — show configuration and store status.

use anyhow::Result;
use colored::Colorize;

use linkbot_core::config::{get_config_path, load_config};
use linkbot_core::store::{collections, FileStore, RecordStore};
use linkbot_core::utils::mask_secret;

use crate::helpers::{check_mark, expand_tilde};

/// Run the status command.
pub async fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "🔗 Linkbot Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found)".red().to_string()
        }
    );
    println!("  {:<18} {}", "API base:".bold(), config.line.api_base);
    println!(
        "  {:<18} {}",
        "Channel token:".bold(),
        check_mark(
            config.line.is_configured(),
            &mask_secret(&config.line.channel_access_token, 6),
            "not configured"
        )
    );
    println!(
        "  {:<18} {}",
        "JWT secret:".bold(),
        check_mark(config.auth.is_configured(), "(set)", "not configured")
    );
    println!(
        "  {:<18} {}",
        "Token lifetime:".bold(),
        format!("{}h", config.auth.token_ttl_hours).dimmed()
    );

    let store_path = expand_tilde(&config.store.path);
    println!();
    if !store_path.exists() {
        println!(
            "  {:<18} {} {}",
            "Store:".bold(),
            store_path.display(),
            "(not found)".red()
        );
        println!();
        return Ok(());
    }

    println!("  {:<18} {}", "Store:".bold(), store_path.display());
    match FileStore::open(&store_path).await {
        Ok(store) => {
            for collection in [
                collections::ACCOUNTS,
                collections::BOTS,
                collections::BINDINGS,
                collections::LOGS,
            ] {
                let records = store.query(collection, None, None).await?.len();
                println!("    {:<16} {}", collection, records);
            }
        }
        Err(e) => println!("    {} {}", "✗".red(), e),
    }

    println!();
    Ok(())
}
