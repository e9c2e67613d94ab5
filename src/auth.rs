//! Session identity: login, token persistence, startup restore, logout.
//!
//! The token is the sole credential. Its absence is the fully supported
//! anonymous state; nothing here ever blocks the session except a failed
//! explicit login, which is the one place an error is surfaced.

use std::fs;
use std::path::{Path, PathBuf};

use crate::client::Smena;
use crate::error::{Error, Result};
use crate::observability;
use crate::types::User;

/// Plain-string token persistence under a fixed path.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Creates a store over the given file path.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored token, if a non-empty one exists.
    pub fn load(&self) -> Option<String> {
        let token = fs::read_to_string(&self.path).ok()?;
        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    /// Persists the token. Failures are counted and swallowed; a token that
    /// outlives the process is a convenience, not a requirement.
    pub fn store(&self, token: &str) {
        let result = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(fs::create_dir_all)
            .unwrap_or(Ok(()))
            .and_then(|_| fs::write(&self.path, token));
        if result.is_err() {
            observability::TOKEN_STORE_ERRORS.click();
        }
    }

    /// Removes the stored token. Already-gone is fine.
    pub fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(_) => observability::TOKEN_STORE_ERRORS.click(),
        }
    }
}

/// Exchanges usernames for tokens and restores sessions across restarts.
#[derive(Debug, Clone)]
pub struct Authenticator {
    tokens: TokenStore,
}

impl Authenticator {
    /// Creates an authenticator persisting tokens at the given path.
    pub fn new<P: Into<PathBuf>>(token_path: P) -> Self {
        Self {
            tokens: TokenStore::new(token_path),
        }
    }

    /// Logs in with the given username.
    ///
    /// Empty or whitespace-only usernames are rejected locally before any
    /// network call. On success the token is persisted and installed on the
    /// client; the caller should follow up with a remote-history merge. On
    /// failure nothing is persisted and the error is surfaced: this is the
    /// only blocking error path in the system.
    pub async fn login(&self, client: &mut Smena, username: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::validation(
                "username must not be empty",
                Some("username".to_string()),
            ));
        }

        let response = client.login(username).await?;
        if !response.success {
            return Err(Error::authentication(
                response
                    .error
                    .unwrap_or_else(|| "login rejected".to_string()),
            ));
        }
        let (Some(token), Some(user)) = (response.token, response.user) else {
            return Err(Error::serialization(
                "login response missing token or user",
                None,
            ));
        };

        self.tokens.store(&token);
        client.set_token(token);
        Ok(user)
    }

    /// Restores a previous session from the stored token, if any.
    ///
    /// Called once at startup. Any failure (no token, network error,
    /// rejected token) silently demotes to anonymous: the stored token is
    /// removed and `None` returned. Calling this twice with an invalid
    /// token leaves the same anonymous state both times.
    pub async fn restore(&self, client: &mut Smena) -> Option<User> {
        let token = self.tokens.load()?;
        client.set_token(token);
        match client.me().await {
            Ok(user) => Some(user),
            Err(_) => {
                self.tokens.clear();
                client.clear_token();
                None
            }
        }
    }

    /// Ends the session: clears the stored token and the client credential.
    pub fn logout(&self, client: &mut Smena) {
        self.tokens.clear();
        client.clear_token();
    }
}
