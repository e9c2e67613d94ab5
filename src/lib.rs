// Public modules
pub mod auth;
pub mod chat;
pub mod client;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod fallback;
pub mod history;
pub mod observability;
pub mod status;
pub mod types;
pub mod utils;

// Re-exports
pub use auth::{Authenticator, TokenStore};
pub use client::Smena;
pub use dispatch::{DISPATCH_TIMEOUT, Dispatcher, SendOutcome};
pub use error::{Error, Result};
pub use fallback::{CONNECTION_REPLY, FallbackGenerator, TIMEOUT_REPLY};
pub use history::{HISTORY_CAP, HistoryStore};
pub use status::{POLL_INTERVAL, StatusPoller, poll_once};
pub use types::*;
