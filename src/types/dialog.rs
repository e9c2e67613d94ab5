use serde::Deserialize;
use time::OffsetDateTime;

use crate::types::mode::ChatMode;

/// One stored exchange from `GET /dialogs/history`.
///
/// The backend stores whole exchanges, not individual turns; the dispatcher
/// splits each entry into a user/assistant message pair when merging.
#[derive(Debug, Clone, Deserialize)]
pub struct DialogEntry {
    /// Server-side exchange id (unix milliseconds of the user turn).
    pub id: u64,
    /// The user's text.
    pub user_message: String,
    /// The assistant's reply.
    pub ai_response: String,
    /// When the exchange happened.
    #[serde(with = "crate::utils::time")]
    pub timestamp: OffsetDateTime,
    /// Profile that served the exchange.
    #[serde(default)]
    pub mode: Option<ChatMode>,
    /// Which upstream provider answered.
    #[serde(default)]
    pub api_used: Option<String>,
}

/// Envelope for `GET /dialogs/history`.
#[derive(Debug, Deserialize)]
pub struct DialogHistoryResponse {
    /// Whether the fetch was served.
    pub success: bool,
    /// Stored exchanges, oldest first.
    #[serde(default)]
    pub history: Vec<DialogEntry>,
}
