use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::mode::ChatMode;
use crate::utils::time as time_utils;

/// Provider tag attached to locally synthesized replies.
pub const FALLBACK_API: &str = "fallback";

/// What a message carries.
///
/// A tagged variant rather than independent `is_error`/`is_image` booleans,
/// so the dual-true case cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Ordinary text.
    Text,
    /// Inline encoded-image payload in `text`.
    Image,
    /// A benign fallback substituted for a failed dispatch.
    Error,
}

/// One chat turn, user- or assistant-authored.
///
/// Messages form an append-only sequence; insertion order is display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique within a session; derived from submission time, strictly
    /// monotonic (see [`MessageIdGen`]).
    pub id: u64,
    /// Content; for images an inline `data:` payload.
    pub text: String,
    /// True for user-authored turns.
    pub from_user: bool,
    /// Event time.
    #[serde(with = "crate::utils::time")]
    pub timestamp: OffsetDateTime,
    /// Which conversational profile produced or received this message.
    pub mode: ChatMode,
    /// Message payload kind.
    pub kind: MessageKind,
    /// Server-assigned provider tag; [`FALLBACK_API`] for local replies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_used: Option<String>,
}

impl Message {
    /// Creates a user-authored text message.
    pub fn user(id: u64, text: impl Into<String>, mode: ChatMode) -> Self {
        Message {
            id,
            text: text.into(),
            from_user: true,
            timestamp: time_utils::now(),
            mode,
            kind: MessageKind::Text,
            api_used: None,
        }
    }

    /// Creates an assistant text message with the server's provider tag.
    pub fn assistant(
        id: u64,
        text: impl Into<String>,
        mode: ChatMode,
        api_used: Option<String>,
    ) -> Self {
        Message {
            id,
            text: text.into(),
            from_user: false,
            timestamp: time_utils::now(),
            mode,
            kind: MessageKind::Text,
            api_used,
        }
    }

    /// Creates an assistant image message carrying an inline payload.
    ///
    /// The mode is the one that served the request; a chat reply the
    /// backend retags keeps the backend's tag rather than `Image`.
    pub fn image(
        id: u64,
        payload: impl Into<String>,
        mode: ChatMode,
        api_used: Option<String>,
    ) -> Self {
        Message {
            id,
            text: payload.into(),
            from_user: false,
            timestamp: time_utils::now(),
            mode,
            kind: MessageKind::Image,
            api_used,
        }
    }

    /// Creates a locally synthesized fallback reply.
    pub fn fallback(id: u64, text: impl Into<String>, mode: ChatMode) -> Self {
        Message {
            id,
            text: text.into(),
            from_user: false,
            timestamp: time_utils::now(),
            mode,
            kind: MessageKind::Error,
            api_used: Some(FALLBACK_API.to_string()),
        }
    }

    /// Returns true if this message carries an inline image payload.
    pub fn is_image(&self) -> bool {
        self.kind == MessageKind::Image
    }
}

/// Allocates message ids from submission time.
///
/// Ids are unix milliseconds, bumped past the previous allocation so two
/// messages created in the same millisecond still get distinct, increasing
/// ids.
#[derive(Debug, Default)]
pub struct MessageIdGen {
    last: u64,
}

impl MessageIdGen {
    /// Creates a generator that will never allocate at or below `floor`.
    ///
    /// Seed this with the highest id in a loaded history so merged and new
    /// messages keep a single total order.
    pub fn starting_after(floor: u64) -> Self {
        MessageIdGen { last: floor }
    }

    /// Allocates the next id.
    pub fn next_id(&mut self) -> u64 {
        let now = time_utils::unix_millis(time_utils::now());
        self.last = now.max(self.last + 1);
        self.last
    }
}
