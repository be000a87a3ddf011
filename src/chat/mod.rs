//! Interactive chat application support.
//!
//! The `chatbox` binary is a REPL over [`crate::controller::ChatController`]:
//! each line typed at the prompt is a form submission, and the conversation is
//! printed by a [`crate::render::TerminalSink`].
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: Slash command parsing for REPL control

mod commands;
mod config;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, DEFAULT_LOG_FILTER};
