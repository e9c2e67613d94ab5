use serde::{Deserialize, Serialize};

/// Authenticated session identity.
///
/// Set on successful login, cleared on logout. The absence of a user (and
/// token) is the fully supported anonymous state, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Login name.
    pub username: String,
    /// Role string assigned by the backend (e.g. "viewer", "moderator").
    #[serde(default)]
    pub role: String,
    /// Display emoji chosen by the backend.
    #[serde(default)]
    pub emoji: String,
}

/// Envelope for `GET /auth/me`.
#[derive(Debug, Deserialize)]
pub struct MeResponse {
    /// The authenticated identity the token resolves to.
    pub user: User,
}
