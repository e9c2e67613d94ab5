use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};
use crate::observability;
use crate::types::{
    ChatMode, ChatRequest, ChatResponse, ContextEntry, ContextRole, DialogHistoryResponse,
    ImageGenRequest, ImageGenResponse, LoginRequest, LoginResponse, MeResponse, Message,
    SystemStatus, SystemStatusResponse, TextGenRequest, TextGenResponse, User,
};

const DEFAULT_API_URL: &str = "https://api.smena.tv/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How long the fire-and-forget interaction log is allowed to take.
const LOG_TIMEOUT: Duration = Duration::from_secs(3);

/// How many trailing messages accompany an interaction-log entry.
const LOG_TAIL: usize = 3;

/// Client for the sMeNa.Tv backend.
///
/// Carries an optional bearer token; when no token is installed, requests go
/// out anonymous, which the backend fully supports.
#[derive(Debug, Clone)]
pub struct Smena {
    client: ReqwestClient,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl Smena {
    /// Create a new client against the default API endpoint.
    ///
    /// The base URL can be overridden through the SMENA_API_URL environment
    /// variable.
    pub fn new() -> Result<Self> {
        let base_url = env::var("SMENA_API_URL").ok();
        Self::with_options(base_url, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        // Validate early; a bad base URL should fail construction, not the
        // first send.
        let parsed = Url::parse(&base_url)?;
        let mut base_url = parsed.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            token: None,
            timeout,
        })
    }

    /// Installs the bearer token attached to subsequent requests.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Removes the bearer token; the client reverts to anonymous.
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Returns the installed token, if any.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Returns the resolved base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.token
            && let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}"))
        {
            headers.insert(header::AUTHORIZATION, value);
        }
        headers
    }

    /// Converts a reqwest transport error into our taxonomy.
    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Process API response errors and convert to our Error type.
    async fn process_error_response(response: Response) -> Error {
        let status = response.status();
        let status_code = status.as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let error_message = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.error)
            .unwrap_or_else(|| error_body.clone());

        match status_code {
            400 => Error::validation(error_message, None),
            401 | 403 => Error::authentication(error_message),
            408 => Error::timeout(error_message, None),
            429 => Error::rate_limit(error_message, retry_after),
            500 => Error::internal_server(error_message),
            502..=504 => Error::service_unavailable(error_message, retry_after),
            _ => Error::api(status_code, None, error_message),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        observability::CLIENT_REQUESTS.click();

        let response = self
            .client
            .get(&url)
            .headers(self.default_headers())
            .send()
            .await
            .map_err(|e| {
                observability::CLIENT_REQUEST_ERRORS.click();
                self.transport_error(e)
            })?;

        if !response.status().is_success() {
            observability::CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }

        response.json::<T>().await.map_err(|e| {
            observability::CLIENT_REQUEST_ERRORS.click();
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        observability::CLIENT_REQUESTS.click();

        let response = self
            .client
            .post(&url)
            .headers(self.default_headers())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                observability::CLIENT_REQUEST_ERRORS.click();
                self.transport_error(e)
            })?;

        if !response.status().is_success() {
            observability::CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }

        response.json::<T>().await.map_err(|e| {
            observability::CLIENT_REQUEST_ERRORS.click();
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    /// Fetches the current capability snapshot.
    pub async fn system_status(&self) -> Result<SystemStatus> {
        let response: SystemStatusResponse = self.get_json("system/status").await?;
        Ok(response.status)
    }

    /// Resolves the installed bearer token to a user.
    pub async fn me(&self) -> Result<User> {
        if self.token.is_none() {
            return Err(Error::authentication("no token installed"));
        }
        let response: MeResponse = self.get_json("auth/me").await?;
        Ok(response.user)
    }

    /// Exchanges a username for a token.
    ///
    /// In-band failure (`success: false`) is returned as-is; the caller
    /// decides how to surface it.
    pub async fn login(&self, username: &str) -> Result<LoginResponse> {
        let request = LoginRequest {
            username: username.to_string(),
        };
        self.post_json("auth/login", &request).await
    }

    /// Fetches the most recent stored exchanges for the authenticated user.
    pub async fn dialog_history(&self, limit: usize) -> Result<DialogHistoryResponse> {
        self.get_json(&format!("dialogs/history?limit={limit}"))
            .await
    }

    /// Sends one chat turn to the backend.
    pub async fn chat(&self, message: &str, mode: ChatMode) -> Result<ChatResponse> {
        let request = ChatRequest {
            message: message.to_string(),
            mode,
        };
        self.post_json("v2/chat", &request).await
    }

    /// Calls the text-generation worker with a prepared context.
    pub async fn generate_text(&self, context: Vec<ContextEntry>) -> Result<String> {
        let request = TextGenRequest { messages: context };
        let response: TextGenResponse = self.post_json("workers/text", &request).await?;
        match (response.reply, response.error) {
            (Some(reply), _) => Ok(reply),
            (None, Some(error)) => Err(Error::api(200, Some("worker_error".to_string()), error)),
            (None, None) => Err(Error::serialization(
                "text worker returned neither reply nor error",
                None,
            )),
        }
    }

    /// Calls the image-generation worker.
    pub async fn generate_image(&self, prompt: &str, width: u32, height: u32) -> Result<String> {
        let request = ImageGenRequest {
            prompt: prompt.to_string(),
            width,
            height,
        };
        let response: ImageGenResponse = self.post_json("workers/image", &request).await?;
        if response.success
            && let Some(image) = response.image
        {
            return Ok(image);
        }
        Err(Error::api(
            200,
            Some("worker_error".to_string()),
            response
                .error
                .unwrap_or_else(|| "image worker returned no image".to_string()),
        ))
    }

    /// Best-effort interaction log: the last few messages plus the reply.
    ///
    /// Never fails; transport and server errors are counted and swallowed,
    /// and the call is bounded by its own short timeout regardless of the
    /// client-wide setting.
    pub async fn log_interaction(&self, recent: &[Message], reply: &str) {
        #[derive(Serialize)]
        struct InteractionLog {
            messages: Vec<ContextEntry>,
            reply: String,
        }

        let tail = recent.len().saturating_sub(LOG_TAIL);
        let messages = recent[tail..]
            .iter()
            .map(|m| ContextEntry {
                role: if m.from_user {
                    ContextRole::User
                } else {
                    ContextRole::Assistant
                },
                content: if m.is_image() {
                    crate::types::IMAGE_PLACEHOLDER.to_string()
                } else {
                    m.text.clone()
                },
            })
            .collect();
        let body = InteractionLog {
            messages,
            reply: reply.to_string(),
        };

        let url = format!("{}chat/log", self.base_url);
        let result = self
            .client
            .post(&url)
            .headers(self.default_headers())
            .timeout(LOG_TIMEOUT)
            .json(&body)
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => {}
            _ => observability::INTERACTION_LOG_ERRORS.click(),
        }
    }
}
