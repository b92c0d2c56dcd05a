//! Linkbot CLI — entry point.
//!
//! # Commands
//!
//! - `linkbot onboard` — create config and data directory
//! - `linkbot status` — show configuration and store status
//! - `linkbot account register|login|me|promote|list`
//! - `linkbot bot register|add|mine|available|claim|list`
//! - `linkbot send | broadcast | logs` — outbound delivery
//! - `linkbot webhook --file <json>` — process one inbound webhook payload

mod account_cmd;
mod bot_cmd;
mod context;
mod helpers;
mod message_cmd;
mod onboard;
mod status;
mod webhook_cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// 🔗 Linkbot — bind chat users to accounts and route messages through bots
#[derive(Parser)]
#[command(name = "linkbot", version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true, default_value_t = false)]
    logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and data directory
    Onboard,

    /// Show configuration and store status
    Status,

    /// Manage accounts
    Account {
        #[command(subcommand)]
        action: account_cmd::AccountCommands,
    },

    /// Manage messaging bots
    Bot {
        #[command(subcommand)]
        action: bot_cmd::BotCommands,
    },

    /// Send a message through your bot
    Send {
        /// Session token
        #[arg(long, env = "LINKBOT_TOKEN", hide_env_values = true)]
        token: String,

        /// Message text (`image:`, `sticker:` and `flex:` prefixes are recognised)
        message: String,
    },

    /// Send a message through every bot (admin only)
    Broadcast {
        /// Session token
        #[arg(long, env = "LINKBOT_TOKEN", hide_env_values = true)]
        token: String,

        /// Message text
        message: String,
    },

    /// Show the delivery log, newest first
    Logs {
        /// Session token
        #[arg(long, env = "LINKBOT_TOKEN", hide_env_values = true)]
        token: String,

        /// Show at most N entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Process one inbound webhook payload
    Webhook {
        /// JSON payload file, or `-` for stdin
        #[arg(short, long)]
        file: String,

        /// Binding token passed alongside the webhook
        #[arg(long)]
        token: Option<String>,
    },
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logs);

    match cli.command {
        Commands::Onboard => onboard::run(),
        Commands::Status => status::run().await,
        Commands::Account { action } => account_cmd::dispatch(action).await,
        Commands::Bot { action } => bot_cmd::dispatch(action).await,
        Commands::Send { token, message } => message_cmd::send(&token, &message).await,
        Commands::Broadcast { token, message } => message_cmd::broadcast(&token, &message).await,
        Commands::Logs { token, limit } => message_cmd::logs(&token, limit).await,
        Commands::Webhook { file, token } => webhook_cmd::run(&file, token.as_deref()).await,
    }
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("linkbot=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_webhook_from_stdin() {
        let cli = Cli::try_parse_from(["linkbot", "webhook", "--file", "-", "--token", "t"]).unwrap();
        match cli.command {
            Commands::Webhook { file, token } => {
                assert_eq!(file, "-");
                assert_eq!(token.as_deref(), Some("t"));
            }
            _ => panic!("expected webhook command"),
        }
    }

    #[test]
    fn global_logs_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["linkbot", "status", "--logs"]).unwrap();
        assert!(cli.logs);
    }
}
