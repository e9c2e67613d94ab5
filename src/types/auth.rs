use serde::{Deserialize, Serialize};

use crate::types::user::User;

/// Body for `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    /// The name to exchange for a token.
    pub username: String,
}

/// Response from `POST /auth/login`.
///
/// The backend signals failure in-band with `success: false` and an error
/// string rather than a non-2xx status, so both shapes deserialize here.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Whether the login was accepted.
    pub success: bool,
    /// Opaque bearer token; present on success.
    #[serde(default)]
    pub token: Option<String>,
    /// The authenticated identity; present on success.
    #[serde(default)]
    pub user: Option<User>,
    /// Backend-supplied reason; present on failure.
    #[serde(default)]
    pub error: Option<String>,
}
