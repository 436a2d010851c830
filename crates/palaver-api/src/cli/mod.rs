//! CLI command definitions for the `palaver` binary.
//!
//! Server-side commands (`serve`, `user`) open the database; client-side
//! commands (`login`, `logout`, `whoami`, `chat`, `history`) only talk to a
//! running server through the stored session.

pub mod auth;
pub mod chat;
pub mod history;
pub mod serve;
pub mod user;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

/// Chat with a hosted model from your terminal.
#[derive(Parser)]
#[command(name = "palaver", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config.toml (defaults to the data directory).
    #[arg(long, global = true, env = "PALAVER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server.
    Serve {
        /// Address to bind, overriding `server.bind`.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Manage local users (local auth provider only).
    User {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Sign in to the server.
    Login {
        /// Email for password sign-in (gotrue).
        #[arg(long)]
        email: Option<String>,

        /// An API token issued by `palaver user add`.
        #[arg(long, conflicts_with = "email")]
        token: Option<String>,
    },

    /// Sign out and forget the stored session.
    Logout,

    /// Show the signed-in user.
    Whoami,

    /// Open the interactive chat.
    Chat {
        /// Resume a conversation instead of showing the full history.
        #[arg(long)]
        conversation: Option<Uuid>,
    },

    /// Print message history.
    History {
        /// Only this conversation's messages.
        #[arg(long)]
        conversation: Option<Uuid>,
    },
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Create a user and print its API token.
    Add {
        #[arg(long)]
        email: String,

        /// Display name.
        #[arg(long)]
        name: Option<String>,
    },

    /// List local users.
    #[command(alias = "ls")]
    List,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_chat_with_conversation() {
        let id = Uuid::now_v7();
        let cli = Cli::parse_from(["palaver", "-v", "chat", "--conversation", &id.to_string()]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Chat { conversation } => assert_eq!(conversation, Some(id)),
            _ => panic!("expected chat"),
        }
    }

    #[test]
    fn test_login_flags_conflict() {
        let result = Cli::try_parse_from(["palaver", "login", "--email", "a@b.c", "--token", "plv_x"]);
        assert!(result.is_err());
    }
}
