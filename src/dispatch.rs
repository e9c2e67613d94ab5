//! Message dispatch: the send path of the chat session.
//!
//! `send` never fails outward. Every accepted input terminates with a reply
//! appended to the history: the backend's answer when the call succeeds,
//! and a locally synthesized fallback for any failure (timeout, connection,
//! bad status, malformed payload). At most one dispatch is in flight at a
//! time; a second attempt is rejected, not queued. There are no retries.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::client::Smena;
use crate::error::{Error, Result};
use crate::export;
use crate::fallback::{CONNECTION_REPLY, FallbackGenerator, TIMEOUT_REPLY};
use crate::history::{HistoryStore, welcome_message};
use crate::observability;
use crate::types::{ChatMode, ChatResponse, Message, MessageIdGen, prepare_context};

/// Hard deadline for one remote dispatch.
pub const DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// How many stored exchanges to request when merging after login.
pub const HISTORY_MERGE_LIMIT: usize = 50;

/// Default dimensions for generated images.
const IMAGE_SIZE: (u32, u32) = (768, 768);

/// What `send` did with the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// A user message and exactly one reply were appended.
    Sent,
    /// The input was an export command; history is untouched.
    ExportRequested,
    /// Blank input; no state change.
    RejectedEmpty,
    /// A dispatch is already in flight; no state change, not queued.
    RejectedBusy,
}

/// Clears the busy flag when the send future completes or is dropped.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The chat session's send path and message sequence.
pub struct Dispatcher {
    client: Smena,
    store: HistoryStore,
    messages: Vec<Message>,
    ids: MessageIdGen,
    fallback: FallbackGenerator,
    in_flight: Arc<AtomicBool>,
    timeout: Duration,
}

impl Dispatcher {
    /// Creates a dispatcher, loading any persisted history.
    pub fn new(client: Smena, store: HistoryStore) -> Self {
        Self::with_timeout(client, store, DISPATCH_TIMEOUT)
    }

    /// Creates a dispatcher with a custom dispatch deadline (tests).
    pub fn with_timeout(client: Smena, store: HistoryStore, timeout: Duration) -> Self {
        let messages = store.load();
        let floor = messages.iter().map(|m| m.id).max().unwrap_or(0);
        let fallback = FallbackGenerator::new(floor);
        Self {
            client,
            store,
            messages,
            ids: MessageIdGen::starting_after(floor),
            fallback,
            in_flight: Arc::new(AtomicBool::new(false)),
            timeout,
        }
    }

    /// The full message sequence, insertion order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages in the sequence.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// The most recently appended message.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Shared client access, e.g. for installing a token after login.
    pub fn client_mut(&mut self) -> &mut Smena {
        &mut self.client
    }

    /// Sends one user turn.
    ///
    /// On [`SendOutcome::Sent`] the sequence has grown by exactly two: the
    /// user message and one reply (server or fallback). The busy guard is
    /// released even if the returned future is dropped mid-flight.
    pub async fn send(&mut self, text: &str, mode: ChatMode) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::RejectedEmpty;
        }
        if self.in_flight.load(Ordering::SeqCst) {
            observability::CHAT_REJECTED_BUSY.click();
            return SendOutcome::RejectedBusy;
        }
        if export::is_export_command(text) {
            return SendOutcome::ExportRequested;
        }

        observability::CHAT_DISPATCHES.click();
        self.in_flight.store(true, Ordering::SeqCst);
        let _guard = InFlightGuard(Arc::clone(&self.in_flight));

        // Optimistic append: the user's message lands before the call.
        let user_id = self.ids.next_id();
        self.append(Message::user(user_id, text, mode.clone()));

        let reply = match mode {
            ChatMode::Local => self.local_reply(text, mode.clone()),
            ChatMode::Image => self.dispatch_image(text).await,
            ChatMode::Creative => self.dispatch_worker(text, mode.clone()).await,
            _ => self.dispatch_chat(text, mode.clone()).await,
        };
        let reply_text = reply.text.clone();
        self.append(reply);

        // Best-effort interaction log; completion is nobody's problem.
        let client = self.client.clone();
        let tail = self.messages.len().saturating_sub(3);
        let recent = self.messages[tail..].to_vec();
        tokio::spawn(async move {
            client.log_interaction(&recent, &reply_text).await;
        });

        SendOutcome::Sent
    }

    /// Remote dispatch through `POST /v2/chat`.
    async fn dispatch_chat(&mut self, text: &str, mode: ChatMode) -> Message {
        let call = self.client.chat(text, mode.clone());
        let result = tokio::time::timeout(self.timeout, call).await;
        match result {
            Ok(Ok(response)) => self.reply_from_response(text, mode, response),
            Ok(Err(err)) => self.fallback_for(text, mode, &err),
            Err(_elapsed) => self.timeout_reply(mode),
        }
    }

    /// Remote dispatch through the text-generation worker, with the
    /// trimmed conversation context.
    async fn dispatch_worker(&mut self, text: &str, mode: ChatMode) -> Message {
        let context = prepare_context(&self.messages);
        let call = self.client.generate_text(context);
        let result = tokio::time::timeout(self.timeout, call).await;
        match result {
            Ok(Ok(reply)) => Message::assistant(
                self.ids.next_id(),
                reply,
                mode,
                Some("text-worker".to_string()),
            ),
            Ok(Err(err)) => self.fallback_for(text, mode, &err),
            Err(_elapsed) => self.timeout_reply(mode),
        }
    }

    /// Remote dispatch through the image-generation worker.
    async fn dispatch_image(&mut self, prompt: &str) -> Message {
        let (width, height) = IMAGE_SIZE;
        let call = self.client.generate_image(prompt, width, height);
        let result = tokio::time::timeout(self.timeout, call).await;
        match result {
            Ok(Ok(image)) => Message::image(
                self.ids.next_id(),
                image,
                ChatMode::Image,
                Some("image-worker".to_string()),
            ),
            Ok(Err(err)) => self.fallback_for(prompt, ChatMode::Image, &err),
            Err(_elapsed) => self.timeout_reply(ChatMode::Image),
        }
    }

    fn reply_from_response(
        &mut self,
        text: &str,
        requested: ChatMode,
        response: ChatResponse,
    ) -> Message {
        if !response.success {
            let err = Error::api(
                200,
                None,
                response
                    .error
                    .unwrap_or_else(|| "backend reported failure".to_string()),
            );
            return self.fallback_for(text, requested, &err);
        }
        let Some(body) = response.message else {
            // Malformed payload: treated like any other failure.
            let err = Error::serialization("chat response missing message", None);
            return self.fallback_for(text, requested, &err);
        };
        let mode = response.mode.unwrap_or(requested);
        if response.is_image {
            Message::image(self.ids.next_id(), body, mode, response.api_used)
        } else {
            Message::assistant(self.ids.next_id(), body, mode, response.api_used)
        }
    }

    /// Converts a failure into exactly one fallback message.
    fn fallback_for(&mut self, input: &str, mode: ChatMode, err: &Error) -> Message {
        observability::CHAT_FALLBACKS.click();
        if err.is_timeout() {
            observability::CHAT_TIMEOUTS.click();
            return Message::fallback(self.ids.next_id(), TIMEOUT_REPLY, mode);
        }
        if err.is_connection() {
            return Message::fallback(self.ids.next_id(), CONNECTION_REPLY, mode);
        }
        let text = self.fallback.reply(input);
        Message::fallback(self.ids.next_id(), text, mode)
    }

    fn timeout_reply(&mut self, mode: ChatMode) -> Message {
        observability::CHAT_FALLBACKS.click();
        observability::CHAT_TIMEOUTS.click();
        Message::fallback(self.ids.next_id(), TIMEOUT_REPLY, mode)
    }

    /// Canned reply without touching the network.
    fn local_reply(&mut self, input: &str, mode: ChatMode) -> Message {
        let text = self.fallback.reply(input);
        Message::assistant(self.ids.next_id(), text, mode, Some("local".to_string()))
    }

    fn append(&mut self, message: Message) {
        self.messages.push(message);
        self.store.save(&self.messages);
    }

    /// Merges the authenticated user's stored exchanges into the sequence.
    ///
    /// Called after a successful login. Entries are split into
    /// user/assistant pairs, already-merged exchanges skipped by id, and
    /// the whole sequence re-sorted by id. Returns how many messages were
    /// added.
    pub async fn merge_remote_history(&mut self) -> Result<usize> {
        let response = self.client.dialog_history(HISTORY_MERGE_LIMIT).await?;
        if !response.success {
            return Ok(0);
        }

        let mut entries = response.history;
        entries.sort_by_key(|e| e.id);

        // Adjacent exchange ids leave no gap for the assistant turn, so its
        // id is the first one above the exchange id not taken by a local
        // message or another incoming user turn.
        let mut used: BTreeSet<u64> = self.messages.iter().map(|m| m.id).collect();
        used.extend(entries.iter().map(|e| e.id));

        let mut added = 0;
        for entry in entries {
            if self.messages.iter().any(|m| m.id == entry.id) {
                continue;
            }
            let mode = entry.mode.unwrap_or_default();
            self.messages.push(Message {
                id: entry.id,
                text: entry.user_message,
                from_user: true,
                timestamp: entry.timestamp,
                mode: mode.clone(),
                kind: crate::types::MessageKind::Text,
                api_used: None,
            });
            let mut assistant_id = entry.id + 1;
            while used.contains(&assistant_id) {
                assistant_id += 1;
            }
            used.insert(assistant_id);
            self.messages.push(Message {
                id: assistant_id,
                text: entry.ai_response,
                from_user: false,
                timestamp: entry.timestamp,
                mode,
                kind: crate::types::MessageKind::Text,
                api_used: entry.api_used,
            });
            added += 2;
        }
        if added > 0 {
            self.messages.sort_by_key(|m| m.id);
            let floor = self.messages.iter().map(|m| m.id).max().unwrap_or(0);
            self.ids = MessageIdGen::starting_after(floor);
            self.store.save(&self.messages);
        }
        Ok(added)
    }

    /// Full-session clear: back to the welcome message.
    pub fn clear(&mut self) {
        self.messages = vec![welcome_message()];
        let floor = self.messages.iter().map(|m| m.id).max().unwrap_or(0);
        self.ids = MessageIdGen::starting_after(floor);
        self.store.save(&self.messages);
    }
}
