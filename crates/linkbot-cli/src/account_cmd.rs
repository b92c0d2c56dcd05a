//! `linkbot account` — register, sign in, and manage roles.
//!
//! - `linkbot account register <EMAIL> <PASSWORD>`
//! - `linkbot account login <EMAIL> <PASSWORD>` — prints a session token
//! - `linkbot account me --token T`
//! - `linkbot account promote <ACCOUNT_ID> --token T` — admin only
//! - `linkbot account list --token T` — admin only, with bot counts

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use crate::context::AppContext;
use crate::helpers::{print_heading, print_ok};

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Register { email: String, password: String },

    /// Sign in and print a session token
    Login { email: String, password: String },

    /// Show the signed-in account with its bot and bound chats
    Me {
        #[arg(long, env = "LINKBOT_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Grant the admin role to another account
    Promote {
        /// Account to promote
        account_id: String,

        #[arg(long, env = "LINKBOT_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// List accounts with their bot counts
    List {
        #[arg(long, env = "LINKBOT_TOKEN", hide_env_values = true)]
        token: String,
    },
}

pub async fn dispatch(cmd: AccountCommands) -> Result<()> {
    let ctx = AppContext::load().await?;
    let accounts = ctx.accounts()?;

    match cmd {
        AccountCommands::Register { email, password } => {
            let account = accounts
                .register(&email, &password)
                .await
                .context("registration failed")?;
            print_ok(&format!("registered {} ({})", account.email, account.id.cyan()));
        }
        AccountCommands::Login { email, password } => {
            let token = accounts.login(&email, &password).await.context("login failed")?;
            // Bare token on stdout so it can be captured into LINKBOT_TOKEN.
            println!("{token}");
        }
        AccountCommands::Me { token } => {
            let account = ctx.authenticate(&token).await?;
            let bot = ctx.bots().get_bot_by_account(&account.id).await?;
            println!("  {:<10} {}", "ID:".bold(), account.id);
            println!("  {:<10} {}", "Email:".bold(), account.email);
            println!("  {:<10} {}", "Role:".bold(), account.role);
            println!(
                "  {:<10} {}",
                "Bot:".bold(),
                bot.map(|b| b.display_name().to_string())
                    .unwrap_or_else(|| "none".dimmed().to_string())
            );

            let bindings = ctx.bindings().bindings_for_account(&account.id).await?;
            if bindings.is_empty() {
                println!("  {:<10} {}", "Chats:".bold(), "none".dimmed());
            } else {
                println!("  {}", "Chats:".bold());
                for binding in &bindings {
                    println!("    {}", binding.chat_user_id.cyan());
                }
            }
        }
        AccountCommands::Promote { account_id, token } => {
            let actor = ctx.authenticate(&token).await?;
            let promoted = accounts
                .promote(&actor.id, &account_id)
                .await
                .context("promotion failed")?;
            print_ok(&format!("{} is now {}", promoted.email, promoted.role));
        }
        AccountCommands::List { token } => {
            let actor = ctx.authenticate(&token).await?;
            let summaries = accounts.list_with_bot_count(Some(&actor.id)).await?;

            print_heading("Accounts");
            println!(
                "  {:<38} {:<28} {:<7} {}",
                "ID".bold(),
                "Email".bold(),
                "Role".bold(),
                "Bots".bold()
            );
            println!("  {}", "─".repeat(80));
            for summary in &summaries {
                println!(
                    "  {:<38} {:<28} {:<7} {}",
                    summary.id, summary.email, summary.role.as_str(), summary.bot_count
                );
            }
            println!();
        }
    }

    Ok(())
}
