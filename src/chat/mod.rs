//! Terminal chat application module.
//!
//! This module backs the `smena-chat` binary: a REPL over the library's
//! session machinery. It is organized into:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: slash command parsing and handling

mod commands;
mod config;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
