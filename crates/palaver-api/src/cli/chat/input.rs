//! Async line input for the chat loop.
//!
//! Wraps `rustyline_async::Readline` and classifies each line as a chat
//! message or a slash command before the loop sees it.

use rustyline_async::{Readline, ReadlineError, ReadlineEvent, SharedWriter};

use super::commands::{self, ChatCommand};

#[derive(Debug)]
pub enum InputEvent {
    /// Text to send.
    Message(String),
    Command(ChatCommand),
    /// Ctrl+D.
    Eof,
    /// Ctrl+C.
    Interrupted,
    /// Empty line.
    Blank,
}

impl InputEvent {
    fn from_line(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return InputEvent::Blank;
        }
        match commands::parse(line) {
            Some(command) => InputEvent::Command(command),
            None => InputEvent::Message(line.to_string()),
        }
    }
}

pub struct ChatInput {
    rl: Readline,
}

impl ChatInput {
    /// Returns the input handler and a writer that prints above the prompt.
    pub fn new(prompt: String) -> Result<(Self, SharedWriter), ReadlineError> {
        let (rl, stdout) = Readline::new(prompt)?;
        Ok((Self { rl }, stdout))
    }

    pub async fn read(&mut self) -> InputEvent {
        match self.rl.readline().await {
            Ok(ReadlineEvent::Line(line)) => {
                let event = InputEvent::from_line(&line);
                if matches!(event, InputEvent::Message(_)) {
                    self.rl.add_history_entry(line.trim().to_string());
                }
                event
            }
            Ok(ReadlineEvent::Eof) => InputEvent::Eof,
            Ok(ReadlineEvent::Interrupted) => InputEvent::Interrupted,
            Err(e) => {
                tracing::debug!(error = %e, "Readline failed");
                InputEvent::Eof
            }
        }
    }

    pub fn clear(&mut self) {
        let _ = self.rl.clear();
    }
}
