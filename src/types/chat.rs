use serde::{Deserialize, Serialize};

use crate::types::mode::ChatMode;
use crate::types::user::User;

/// Body for `POST /v2/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// The user-authored text.
    pub message: String,
    /// Requested conversational profile.
    pub mode: ChatMode,
}

/// Response from `POST /v2/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Whether the backend produced a reply.
    pub success: bool,
    /// Reply text, or an inline image payload when `is_image` is set.
    #[serde(default)]
    pub message: Option<String>,
    /// The profile that actually served the request; the backend may
    /// downgrade from the requested one.
    #[serde(default)]
    pub mode: Option<ChatMode>,
    /// Which upstream provider answered.
    #[serde(default)]
    pub api_used: Option<String>,
    /// True when `message` carries an encoded image.
    #[serde(default)]
    pub is_image: bool,
    /// Echo of the authenticated identity, if any.
    #[serde(default)]
    pub user: Option<User>,
    /// Backend-supplied reason; present on failure.
    #[serde(default)]
    pub error: Option<String>,
}
