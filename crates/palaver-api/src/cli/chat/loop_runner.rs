//! Main chat loop orchestration.
//!
//! Mounts a [`ChatView`] against the server, then multiplexes three inputs:
//! the session change feed, a periodic check of the session file, and the
//! prompt. Any sign-out ends the loop with the login hint.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use palaver_core::session::{GateState, SessionStore};
use palaver_core::view::{ChatView, SubmitOutcome};
use palaver_infra::client::{FileSessionStore, HttpChatApi};
use palaver_types::chat::{Feedback, MessageRole};
use palaver_types::error::ClientError;

use crate::cli::auth::print_login_hint;
use crate::state::ClientState;

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::{print_conversations, print_message, print_messages};

type View = ChatView<FileSessionStore, HttpChatApi>;

const SESSION_POLL: Duration = Duration::from_secs(2);

/// What the loop does after handling one input.
enum Flow {
    Continue,
    Exit,
    SignedOut,
}

/// Run the interactive chat loop.
pub async fn run_chat_loop(client: &ClientState, conversation: Option<Uuid>) -> anyhow::Result<()> {
    let mut view = ChatView::new(client.store.clone(), client.api.clone(), client.markup);
    if let Some(id) = conversation {
        view = view.with_conversation(id);
    }
    let mut feed = client.store.subscribe();

    if let GateState::RedirectingToLogin = view.mount().await {
        print_login_hint();
        return Ok(());
    }
    let Some(user) = view.user().cloned() else {
        print_login_hint();
        return Ok(());
    };

    let active = view
        .active_conversation()
        .and_then(|id| view.conversations().iter().find(|c| c.id == id));
    print_welcome_banner(&user, &client.config.client.server_url, active);
    print_messages(view.messages());
    print_notice(&mut view);

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut input, _writer) = ChatInput::new(prompt)?;

    let mut poll = tokio::time::interval(SESSION_POLL);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut feed_open = true;

    let flow = loop {
        let flow = tokio::select! {
            event = feed.recv(), if feed_open => match event {
                Ok(event) => {
                    view.handle_auth_event(&event);
                    if view.gate().is_redirecting() { Flow::SignedOut } else { Flow::Continue }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Auth feed lagged");
                    Flow::Continue
                }
                Err(RecvError::Closed) => {
                    feed_open = false;
                    Flow::Continue
                }
            },
            _ = poll.tick() => {
                client.store.detect_sign_out().await;
                Flow::Continue
            }
            event = input.read() => match event {
                InputEvent::Eof => Flow::Exit,
                InputEvent::Interrupted => {
                    println!("\n  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
                    Flow::Continue
                }
                InputEvent::Blank => Flow::Continue,
                InputEvent::Command(command) => run_command(&mut view, &mut input, command).await,
                InputEvent::Message(text) => send_message(&mut view, &text).await,
            },
        };

        match flow {
            Flow::Continue => continue,
            other => break other,
        }
    };

    match flow {
        Flow::SignedOut => {
            println!("\n  {}", style("Your session has ended.").dim());
            print_login_hint();
        }
        _ => println!("\n  {}\n", style("Goodbye.").dim()),
    }
    Ok(())
}

async fn send_message(view: &mut View, text: &str) -> Flow {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("    {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(Duration::from_millis(80));

    let outcome = view.submit(text).await;
    spinner.finish_and_clear();

    match outcome {
        SubmitOutcome::Ignored => Flow::Continue,
        SubmitOutcome::Sent => {
            let messages = view.messages();
            if let Some((i, reply)) = messages
                .iter()
                .enumerate()
                .rev()
                .find(|(_, m)| m.role == MessageRole::Assistant)
            {
                println!();
                print_message(i + 1, reply);
            }
            info!(messages = messages.len(), "Exchange complete");
            Flow::Continue
        }
        SubmitOutcome::Failed => {
            if view.gate().is_redirecting() {
                return Flow::SignedOut;
            }
            print_notice(view);
            Flow::Continue
        }
    }
}

async fn run_command(view: &mut View, input: &mut ChatInput, command: ChatCommand) -> Flow {
    let result = match command {
        ChatCommand::Help => {
            commands::print_help();
            Ok(())
        }
        ChatCommand::Clear => {
            input.clear();
            Ok(())
        }
        ChatCommand::Exit => return Flow::Exit,
        ChatCommand::Logout => {
            return match view.sign_out().await {
                Ok(()) => Flow::SignedOut,
                Err(e) => {
                    print_error(&e);
                    Flow::Continue
                }
            };
        }
        ChatCommand::Invalid(message) => {
            println!(
                "\n  {} {}. Type /help for available commands.\n",
                style("?").yellow().bold(),
                style(message).dim()
            );
            Ok(())
        }
        ChatCommand::New => {
            view.new_conversation();
            println!(
                "\n  {}\n",
                style("New conversation. It is saved when you send the first message.").dim()
            );
            Ok(())
        }
        ChatCommand::List => view.refresh_conversations().await.map(|()| {
            print_conversations(view.conversations(), view.active_conversation());
        }),
        ChatCommand::Switch(n) => match conversation_at(view, n) {
            Some(id) => view.switch_conversation(id).await.map(|()| {
                println!();
                print_messages(view.messages());
            }),
            None => Err(no_such("conversation", n)),
        },
        ChatCommand::Delete(n) => match conversation_at(view, n) {
            Some(id) => view.delete_conversation(id).await.map(|()| {
                println!("\n  {} Conversation deleted.\n", style("✓").green().bold());
            }),
            None => Err(no_such("conversation", n)),
        },
        ChatCommand::Copy(n) => {
            match message_at(view, n).and_then(|id| view.copy_text(&id).map(str::to_string)) {
                Some(text) => {
                    println!("\n{text}\n");
                    Ok(())
                }
                None => Err(no_such("message", n)),
            }
        }
        ChatCommand::Up(n) => react(view, n, Feedback::Up).await,
        ChatCommand::Down(n) => react(view, n, Feedback::Down).await,
        ChatCommand::Edit(n, text) => match message_at(view, n) {
            Some(id) => view.edit_message(&id, &text).await.map(|()| {
                if let Some(message) = view.messages().get(n - 1) {
                    println!();
                    print_message(n, message);
                }
            }),
            None => Err(no_such("message", n)),
        },
    };

    match result {
        Ok(()) => Flow::Continue,
        Err(e) if e.is_unauthorized() || view.gate().is_redirecting() => {
            warn!(error = %e, "Session rejected by server");
            Flow::SignedOut
        }
        Err(e) => {
            print_error(&e);
            Flow::Continue
        }
    }
}

async fn react(view: &mut View, n: usize, feedback: Feedback) -> Result<(), ClientError> {
    let Some(id) = message_at(view, n) else {
        return Err(no_such("message", n));
    };
    let now = view.toggle_feedback(&id, feedback).await?;
    let label = match now {
        Some(Feedback::Up) => "Marked helpful.",
        Some(Feedback::Down) => "Marked unhelpful.",
        None => "Reaction cleared.",
    };
    println!("\n  {} {}\n", style("✓").green().bold(), label);
    Ok(())
}

fn message_at(view: &View, n: usize) -> Option<String> {
    view.messages().get(n.checked_sub(1)?).map(|m| m.id.clone())
}

fn conversation_at(view: &View, n: usize) -> Option<Uuid> {
    view.conversations().get(n.checked_sub(1)?).map(|c| c.id)
}

fn no_such(what: &str, n: usize) -> ClientError {
    ClientError::Rejected(format!("No {what} numbered {n}"))
}

fn print_notice(view: &mut View) {
    if let Some(notice) = view.notice() {
        println!("\n  {} {}\n", style("!").red().bold(), notice);
        view.dismiss_notice();
    }
}

fn print_error(e: &ClientError) {
    println!("\n  {} {}\n", style("!").red().bold(), e);
}
