//! Slash command parsing for the chat loop.
//!
//! Message and conversation arguments are the 1-based numbers printed next
//! to each entry.

use console::style;

#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    Help,
    Clear,
    Exit,
    /// Start a fresh conversation (created on the next message).
    New,
    /// List conversations.
    List,
    Switch(usize),
    Delete(usize),
    Copy(usize),
    Up(usize),
    Down(usize),
    Edit(usize, String),
    Logout,
    /// Unknown command or bad arguments, with a message for the user.
    Invalid(String),
}

/// Parse user input as a slash command. `None` if it is not one.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next().map(str::trim).unwrap_or_default();

    let command = match cmd.as_str() {
        "/help" | "/h" | "/?" => ChatCommand::Help,
        "/clear" | "/cls" => ChatCommand::Clear,
        "/exit" | "/quit" | "/q" => ChatCommand::Exit,
        "/new" => ChatCommand::New,
        "/list" | "/ls" => ChatCommand::List,
        "/logout" => ChatCommand::Logout,
        "/switch" => numbered(arg, "/switch <n>", ChatCommand::Switch),
        "/delete" => numbered(arg, "/delete <n>", ChatCommand::Delete),
        "/copy" => numbered(arg, "/copy <n>", ChatCommand::Copy),
        "/up" => numbered(arg, "/up <n>", ChatCommand::Up),
        "/down" => numbered(arg, "/down <n>", ChatCommand::Down),
        "/edit" => {
            let mut rest = arg.splitn(2, char::is_whitespace);
            let n = rest.next().and_then(parse_index);
            let text = rest.next().map(str::trim).unwrap_or_default();
            match n {
                Some(n) if !text.is_empty() => ChatCommand::Edit(n, text.to_string()),
                _ => ChatCommand::Invalid("usage: /edit <n> <new text>".to_string()),
            }
        }
        other => ChatCommand::Invalid(format!("unknown command {other}")),
    };
    Some(command)
}

fn parse_index(s: &str) -> Option<usize> {
    s.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

fn numbered(arg: &str, usage: &str, make: fn(usize) -> ChatCommand) -> ChatCommand {
    match parse_index(arg) {
        Some(n) => make(n),
        None => ChatCommand::Invalid(format!("usage: {usage}")),
    }
}

/// Print the help text listing all available commands.
pub fn print_help() {
    let rows = [
        ("/help", "Show this help message"),
        ("/new", "Start a new conversation"),
        ("/list", "List your conversations"),
        ("/switch <n>", "Open conversation n"),
        ("/delete <n>", "Delete conversation n"),
        ("/copy <n>", "Print the raw text of message n"),
        ("/up <n>", "Thumbs up message n (again to clear)"),
        ("/down <n>", "Thumbs down message n (again to clear)"),
        ("/edit <n> <text>", "Rewrite your message n"),
        ("/clear", "Clear the screen"),
        ("/logout", "Sign out"),
        ("/exit", "Leave the chat"),
    ];

    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    for (cmd, help) in rows {
        println!("  {:<18} {}", style(cmd).cyan(), help);
    }
    println!();
    println!("  {}", style("Ctrl+D to exit").dim());
    println!();
}
