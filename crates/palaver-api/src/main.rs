//! Palaver server and terminal client entry point.
//!
//! Binary name: `palaver`
//!
//! Parses CLI arguments, loads configuration and sets up tracing, then
//! dispatches to the server-side commands (which open the database) or the
//! client-side commands (which only talk to a running server).

mod cli;
mod http;
mod state;

use clap::Parser;

use cli::{Cli, Commands, UserCommand};
use state::{AppState, ClientState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = state::load_app_config(cli.config.as_deref()).await;

    palaver_observe::init_tracing(&config.logging, cli.verbose, cli.quiet)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli, config).await;
    palaver_observe::shutdown_tracing();
    result
}

async fn run(cli: Cli, config: palaver_types::config::AppConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { bind } => {
            let state = AppState::init(config).await?;
            cli::serve::serve(state, bind).await?;
        }

        Commands::User { action } => {
            let state = AppState::init(config).await?;
            match action {
                UserCommand::Add { email, name } => {
                    cli::user::add_user(&state, &email, name.as_deref(), cli.json).await?;
                }
                UserCommand::List => {
                    cli::user::list_users(&state, cli.json).await?;
                }
            }
            state.db_pool.close().await;
        }

        Commands::Login { email, token } => {
            let client = ClientState::init(config).await?;
            cli::auth::login(&client, email, token, cli.json).await?;
        }

        Commands::Logout => {
            let client = ClientState::init(config).await?;
            cli::auth::logout(&client, cli.json).await?;
        }

        Commands::Whoami => {
            let client = ClientState::init(config).await?;
            cli::auth::whoami(&client, cli.json).await?;
        }

        Commands::Chat { conversation } => {
            let client = ClientState::init(config).await?;
            cli::chat::loop_runner::run_chat_loop(&client, conversation).await?;
        }

        Commands::History { conversation } => {
            let client = ClientState::init(config).await?;
            cli::history::print_history(&client, conversation, cli.json).await?;
        }
    }

    Ok(())
}
