//! `palaver history` -- print stored messages, oldest first.

use console::style;
use uuid::Uuid;

use palaver_core::session::{SessionGate, SessionStore};
use palaver_core::view::ChatApi;
use palaver_types::chat::MessageRole;

use super::auth::print_login_hint;
use super::chat::renderer::render_terminal;
use crate::state::ClientState;

pub async fn print_history(
    client: &ClientState,
    conversation: Option<Uuid>,
    json: bool,
) -> anyhow::Result<()> {
    let mut gate = SessionGate::new();
    gate.check(client.store.as_ref()).await;
    if gate.is_redirecting() {
        print_login_hint();
        return Ok(());
    }
    let Some(session) = client.store.get_session().await? else {
        print_login_hint();
        return Ok(());
    };

    let messages = match client.api.history(&session.access_token, conversation.as_ref()).await {
        Ok(messages) => messages,
        Err(e) if e.is_unauthorized() => {
            print_login_hint();
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!("\n  {}\n", style("No messages yet.").dim());
        return Ok(());
    }

    println!();
    for message in &messages {
        let time = message.created_at.format("%Y-%m-%d %H:%M");
        match message.role {
            MessageRole::User => {
                println!("  {} {}", style("You").green().bold(), style(time).dim());
                println!("  {}", message.content);
            }
            MessageRole::Assistant => {
                println!("  {} {}", style("Palaver").cyan().bold(), style(time).dim());
                println!("{}", render_terminal(&message.content));
            }
        }
        println!();
    }
    Ok(())
}
