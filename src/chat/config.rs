//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling the chat session.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::types::ChatMode;

/// Default history file, relative to the working directory.
const DEFAULT_HISTORY_FILE: &str = "smena-history.json";

/// Default token file, relative to the working directory.
const DEFAULT_TOKEN_FILE: &str = "smena-token";

/// Command-line arguments for the smena-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Backend base URL.
    #[arrrg(optional, "Backend base URL (default: https://api.smena.tv/)", "URL")]
    pub base_url: Option<String>,

    /// Conversational mode to start in.
    #[arrrg(optional, "Starting mode: fast, turbo, ultra, creative, image, local", "MODE")]
    pub mode: Option<String>,

    /// Path of the persisted chat history.
    #[arrrg(optional, "History file (default: smena-history.json)", "FILE")]
    pub history_file: Option<String>,

    /// Path of the persisted bearer token.
    #[arrrg(optional, "Token file (default: smena-token)", "FILE")]
    pub token_file: Option<String>,

    /// Per-dispatch deadline in seconds.
    #[arrrg(optional, "Dispatch timeout in seconds (default: 30)", "SECONDS")]
    pub timeout_secs: Option<u32>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Resolved configuration for a chat session.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Backend base URL; `None` uses the client default.
    pub base_url: Option<String>,

    /// Mode new dispatches are sent with.
    pub mode: ChatMode,

    /// Where the capped history is persisted.
    pub history_file: PathBuf,

    /// Where the bearer token is persisted.
    pub token_file: PathBuf,

    /// Hard deadline for one dispatch.
    pub timeout: Duration,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a ChatConfig with default values.
    pub fn new() -> Self {
        Self {
            base_url: None,
            mode: ChatMode::Fast,
            history_file: PathBuf::from(DEFAULT_HISTORY_FILE),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            timeout: crate::dispatch::DISPATCH_TIMEOUT,
            use_color: true,
        }
    }

    /// Sets the backend base URL.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Sets the starting mode.
    pub fn with_mode(mut self, mode: ChatMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the history file path.
    pub fn with_history_file(mut self, path: PathBuf) -> Self {
        self.history_file = path;
        self
    }

    /// Sets the token file path.
    pub fn with_token_file(mut self, path: PathBuf) -> Self {
        self.token_file = path;
        self
    }

    /// Sets the dispatch deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let mode = args
            .mode
            .and_then(|s| s.parse::<ChatMode>().ok())
            .unwrap_or(ChatMode::Fast);

        ChatConfig {
            base_url: args.base_url,
            mode,
            history_file: args
                .history_file
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY_FILE)),
            token_file: args
                .token_file
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE)),
            timeout: args
                .timeout_secs
                .map(|secs| Duration::from_secs(u64::from(secs)))
                .unwrap_or(crate::dispatch::DISPATCH_TIMEOUT),
            use_color: !args.no_color,
        }
    }
}
