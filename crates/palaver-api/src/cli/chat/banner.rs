//! Welcome banner shown when the chat opens.

use console::style;

use palaver_types::chat::Conversation;
use palaver_types::identity::UserProfile;

pub fn print_welcome_banner(user: &UserProfile, server_url: &str, conversation: Option<&Conversation>) {
    println!();
    println!(
        "  {} {}",
        style("Palaver").cyan().bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim()
    );
    println!(
        "  {}",
        style(format!("Hi, {}!", user.display_label())).dim()
    );
    println!();
    println!("  {}  {}", style("Server:").bold(), style(server_url).dim());
    let thread = match conversation {
        Some(c) => c.title.clone().unwrap_or_else(|| c.id.to_string()),
        None => "all messages".to_string(),
    };
    println!("  {}  {}", style("Thread:").bold(), style(thread).dim());
    println!();
    println!("  {}", style("Type /help for commands, Ctrl+D to exit").dim());
    println!("  {}", style("---").dim());
    println!();
}
