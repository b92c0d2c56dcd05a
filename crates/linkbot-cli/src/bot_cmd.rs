//! `linkbot bot` — register bots and manage the available pool.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use serde_json::json;

use linkbot_core::types::BotInfo;
use linkbot_hub::NewBot;

use crate::context::AppContext;
use crate::helpers::{format_timestamp_ms, print_heading, print_json, print_ok};

#[derive(Subcommand)]
pub enum BotCommands {
    /// Register a bot assigned to your account
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Push credential for the bot
        #[arg(long)]
        access_token: String,

        /// Chat user that receives this bot's pushes
        #[arg(long)]
        chat_user_id: String,

        #[arg(long, env = "LINKBOT_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Add an unassigned bot to the pool (admin only)
    Add {
        #[arg(short, long)]
        name: String,

        #[arg(long)]
        access_token: String,

        #[arg(long)]
        chat_user_id: String,

        #[arg(long, env = "LINKBOT_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Show the bot assigned to your account
    Mine {
        #[arg(long, env = "LINKBOT_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Show the next bot in the available pool
    Available,

    /// Take a bot from the pool for your account
    Claim {
        #[arg(long, env = "LINKBOT_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// List every bot (admin only)
    List {
        #[arg(long, env = "LINKBOT_TOKEN", hide_env_values = true)]
        token: String,
    },
}

pub async fn dispatch(cmd: BotCommands) -> Result<()> {
    let ctx = AppContext::load().await?;
    let bots = ctx.bots();

    match cmd {
        BotCommands::Register {
            name,
            access_token,
            chat_user_id,
            token,
        } => {
            let account = ctx.authenticate(&token).await?;
            let id = bots
                .create_bot(NewBot {
                    name: name.clone(),
                    access_token,
                    chat_user_id,
                    assigned_to: account.id,
                })
                .await
                .context("failed to register bot")?;
            print_ok(&format!("registered bot {} ({})", name, id.cyan()));
        }
        BotCommands::Add {
            name,
            access_token,
            chat_user_id,
            token,
        } => {
            ctx.authenticate_admin(&token).await?;
            let id = bots
                .add_pool_bot(name.as_str(), access_token, chat_user_id)
                .await
                .context("failed to add bot")?;
            print_ok(&format!("added pool bot {} ({})", name, id.cyan()));
        }
        BotCommands::Mine { token } => {
            let account = ctx.authenticate(&token).await?;
            match bots.get_bot_by_account(&account.id).await? {
                Some(bot) => print_json(&json!(BotInfo::from(&bot))),
                None => println!("  {} no bot is assigned to your account", "·".dimmed()),
            }
        }
        BotCommands::Available => {
            let bot = bots.get_available_bot().await?;
            print_json(&json!(BotInfo::from(&bot)));
        }
        BotCommands::Claim { token } => {
            let account = ctx.authenticate(&token).await?;
            let bot = bots
                .claim_available_bot(&account.id)
                .await
                .context("failed to claim a bot")?;
            print_ok(&format!("claimed {} ({})", bot.display_name(), bot.id.cyan()));
        }
        BotCommands::List { token } => {
            ctx.authenticate_admin(&token).await?;
            let all = bots.list_bots().await?;

            print_heading("Bots");
            println!(
                "  {:<38} {:<16} {:<38} {}",
                "ID".bold(),
                "Name".bold(),
                "Assigned to".bold(),
                "Created".bold()
            );
            println!("  {}", "─".repeat(110));
            for bot in &all {
                let assignee = match bot.assignee() {
                    Some(id) => id.to_string(),
                    None => "available".green().to_string(),
                };
                println!(
                    "  {:<38} {:<16} {:<38} {}",
                    bot.id,
                    bot.display_name(),
                    assignee,
                    format_timestamp_ms(bot.created_at)
                );
            }
            println!();
        }
    }

    Ok(())
}
