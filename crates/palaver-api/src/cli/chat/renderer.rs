//! Terminal rendering of chat messages.
//!
//! Walks the same [`markup::tokenize`] output the HTML renderer uses and
//! maps each span to a `console` style instead of a tag.

use console::{Style, style};
use uuid::Uuid;

use palaver_core::markup::{self, BULLET, Inline};
use palaver_core::view::ViewMessage;
use palaver_types::chat::{Conversation, Feedback, MessageRole};

const INDENT: &str = "    ";

/// Render message markup for the terminal, indented for the chat column.
pub fn render_terminal(text: &str) -> String {
    markup::tokenize(text)
        .iter()
        .map(|line| {
            let mut out = String::from(INDENT);
            if line.bullet {
                out.push_str(&format!("{} ", style(BULLET).cyan()));
            }
            out.push_str(&styled_spans(&line.spans, Style::new()));
            out
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Style spans, layering bold and italic over whatever `outer` carries.
fn styled_spans(spans: &[Inline], outer: Style) -> String {
    spans
        .iter()
        .map(|span| match span {
            Inline::Text(s) => outer.apply_to(s).to_string(),
            Inline::Bold(inner) => styled_spans(inner, outer.clone().bold()),
            Inline::Italic(inner) => styled_spans(inner, outer.clone().italic()),
            Inline::Code(s) => s
                .split('\n')
                .map(|part| outer.clone().yellow().apply_to(part).to_string())
                .collect::<Vec<_>>()
                .join(&format!("\n{INDENT}")),
        })
        .collect()
}

/// Print one numbered message.
pub fn print_message(number: usize, message: &ViewMessage) {
    let marker = match message.feedback {
        Some(Feedback::Up) => format!(" {}", style("+1").green()),
        Some(Feedback::Down) => format!(" {}", style("-1").red()),
        None => String::new(),
    };
    let pending = if message.pending {
        format!(" {}", style("(sending)").dim())
    } else {
        String::new()
    };

    match message.role {
        MessageRole::User => {
            println!(
                "  {} {}{}",
                style(format!("[{number}]")).dim(),
                style("You").green().bold(),
                pending
            );
            println!("{INDENT}{}", message.content);
        }
        MessageRole::Assistant => {
            println!(
                "  {} {}{}",
                style(format!("[{number}]")).dim(),
                style("Palaver").cyan().bold(),
                marker
            );
            println!("{}", render_terminal(&message.content));
        }
    }
    println!();
}

pub fn print_messages(messages: &[ViewMessage]) {
    for (i, message) in messages.iter().enumerate() {
        print_message(i + 1, message);
    }
}

pub fn print_conversations(conversations: &[Conversation], active: Option<Uuid>) {
    if conversations.is_empty() {
        println!("\n  {}\n", style("No conversations yet.").dim());
        return;
    }

    println!();
    for (i, conversation) in conversations.iter().enumerate() {
        let current = if active == Some(conversation.id) {
            style("*").green().bold().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "  {} {} {}  {}",
            current,
            style(format!("{:>2}.", i + 1)).dim(),
            conversation.title.as_deref().unwrap_or("(untitled)"),
            style(conversation.updated_at.format("%Y-%m-%d %H:%M")).dim()
        );
    }
    println!();
}
