//! `linkbot send | broadcast | logs` — outbound delivery.

use anyhow::{Context, Result};
use colored::Colorize;

use crate::context::AppContext;
use crate::helpers::{format_timestamp_ms, print_heading, print_json};

/// `linkbot send <MESSAGE>`
pub async fn send(token: &str, message: &str) -> Result<()> {
    let ctx = AppContext::load().await?;
    let account = ctx.authenticate(token).await?;

    let response = ctx
        .delivery()?
        .send(&account.id, message)
        .await
        .context("send failed")?;

    let label = if response.is_success() {
        format!("{}", response.status).green()
    } else {
        format!("{}", response.status).red()
    };
    println!("  {} {}", "Status:".bold(), label);
    if !response.body.is_null() {
        print_json(&response.body);
    }
    Ok(())
}

/// `linkbot broadcast <MESSAGE>` (admin only)
pub async fn broadcast(token: &str, message: &str) -> Result<()> {
    let ctx = AppContext::load().await?;
    ctx.authenticate_admin(token).await?;

    let results = ctx
        .delivery()?
        .broadcast(message)
        .await
        .context("broadcast aborted")?;

    print_heading("Broadcast");
    for result in &results {
        let status = if (200..300).contains(&result.status) {
            result.status.to_string().green()
        } else {
            result.status.to_string().red()
        };
        println!("  {:<24} {}", result.bot_name, status);
    }
    println!();
    Ok(())
}

/// `linkbot logs [-n N]`
pub async fn logs(token: &str, limit: Option<usize>) -> Result<()> {
    let ctx = AppContext::load().await?;
    ctx.authenticate(token).await?;

    let entries = ctx.delivery()?.logs().await?;
    if entries.is_empty() {
        println!("  No deliveries logged.");
        return Ok(());
    }

    print_heading("Delivery log");
    for entry in entries.iter().take(limit.unwrap_or(usize::MAX)) {
        println!(
            "  {} {:<16} {}",
            format_timestamp_ms(entry.timestamp).dimmed(),
            entry.bot_name,
            entry.message
        );
    }
    println!();
    Ok(())
}
