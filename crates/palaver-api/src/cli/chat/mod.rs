//! Interactive terminal chat.
//!
//! A thin front end over the headless `ChatView`: it draws the view's
//! messages, maps slash commands to view actions, shows a spinner while a
//! request is in flight and leaves as soon as the session feed reports a
//! sign-out. Entry point: `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
