use serde::{Deserialize, Serialize};

use crate::types::message::{Message, MessageKind};

/// Maximum number of turns forwarded to the text-generation worker.
pub const CONTEXT_MAX_TURNS: usize = 6;

/// Maximum characters per forwarded turn.
pub const CONTEXT_MAX_CHARS: usize = 500;

/// Placeholder substituted for inline image payloads in forwarded context.
pub const IMAGE_PLACEHOLDER: &str = "[image]";

/// Role of a forwarded context entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextRole {
    /// User-authored turn.
    User,
    /// Assistant-authored turn.
    Assistant,
}

/// One role/content pair forwarded to the text-generation worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Who authored the turn.
    pub role: ContextRole,
    /// Clipped turn content.
    pub content: String,
}

/// Body for the text-generation worker endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct TextGenRequest {
    /// Trimmed, filtered conversation context.
    pub messages: Vec<ContextEntry>,
}

/// Response from the text-generation worker.
#[derive(Debug, Clone, Deserialize)]
pub struct TextGenResponse {
    /// The generated reply.
    #[serde(default)]
    pub reply: Option<String>,
    /// Worker-supplied reason; present on failure.
    #[serde(default)]
    pub error: Option<String>,
}

/// Body for the image-generation worker endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ImageGenRequest {
    /// Text prompt.
    pub prompt: String,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
}

/// Response from the image-generation worker.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageGenResponse {
    /// Whether an image was produced.
    pub success: bool,
    /// Encoded image payload; present on success.
    #[serde(default)]
    pub image: Option<String>,
    /// Worker-supplied reason; present on failure.
    #[serde(default)]
    pub error: Option<String>,
}

/// Prepares the conversation context the text-generation worker accepts.
///
/// Keeps only the most recent [`CONTEXT_MAX_TURNS`] messages, collapses
/// inline image payloads to [`IMAGE_PLACEHOLDER`], and clips each turn to
/// [`CONTEXT_MAX_CHARS`] characters. Fallback error turns are dropped; the
/// worker should not see replies it could not have produced.
pub fn prepare_context(messages: &[Message]) -> Vec<ContextEntry> {
    messages
        .iter()
        .filter(|m| m.kind != MessageKind::Error)
        .rev()
        .take(CONTEXT_MAX_TURNS)
        .map(|m| {
            let role = if m.from_user {
                ContextRole::User
            } else {
                ContextRole::Assistant
            };
            let content = if m.kind == MessageKind::Image || m.text.starts_with("data:image") {
                IMAGE_PLACEHOLDER.to_string()
            } else {
                m.text.chars().take(CONTEXT_MAX_CHARS).collect()
            };
            ContextEntry { role, content }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect()
}
