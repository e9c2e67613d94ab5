//! Durable chat history.
//!
//! A capped window of the message sequence is written to a JSON file on
//! every mutation. Loads never fail: a missing or corrupt file yields a
//! single synthesized welcome message. Saves never interrupt the
//! conversation: write failures are counted and swallowed.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};

use crate::error::{Error, Result};
use crate::observability;
use crate::types::{ChatMode, Message, MessageIdGen};

/// Most recent entries kept on disk.
pub const HISTORY_CAP: usize = 100;

const WELCOME_TEXT: &str =
    "Привет! Я ассистент sMeNa.Tv. Спроси меня о стримах, расписании или просто поболтай.";

#[derive(Serialize, Deserialize)]
struct HistoryFile {
    version: u8,
    messages: Vec<Message>,
}

impl HistoryFile {
    fn new(messages: &[Message]) -> Self {
        let start = messages.len().saturating_sub(HISTORY_CAP);
        Self {
            version: 1,
            messages: messages[start..].to_vec(),
        }
    }
}

/// The synthesized first message for a fresh or unreadable history.
pub fn welcome_message() -> Message {
    let mut ids = MessageIdGen::default();
    Message::assistant(ids.next_id(), WELCOME_TEXT, ChatMode::Local, None)
}

/// File-backed store for the capped message history.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Creates a store over the given file path.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted history.
    ///
    /// A missing file, an unreadable file, or a corrupt record all yield a
    /// fresh history containing only the welcome message.
    pub fn load(&self) -> Vec<Message> {
        match self.try_load() {
            Ok(messages) if !messages.is_empty() => messages,
            _ => {
                observability::HISTORY_LOAD_FALLBACKS.click();
                vec![welcome_message()]
            }
        }
    }

    fn try_load(&self) -> Result<Vec<Message>> {
        let file = File::open(&self.path)
            .map_err(|err| Error::io("failed to open history file", err))?;
        let reader = BufReader::new(file);
        let history: HistoryFile = from_reader(reader)
            .map_err(|err| Error::serialization("failed to parse history", Some(Box::new(err))))?;
        Ok(history.messages)
    }

    /// Persists the most recent [`HISTORY_CAP`] entries.
    ///
    /// Failures (quota, permissions, serialization) are counted and
    /// swallowed; persistence problems must never break the chat.
    pub fn save(&self, messages: &[Message]) {
        observability::HISTORY_SAVES.click();
        if self.try_save(messages).is_err() {
            observability::HISTORY_SAVE_ERRORS.click();
        }
    }

    fn try_save(&self, messages: &[Message]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|err| Error::io("failed to create history directory", err))?;
        }
        let file = File::create(&self.path)
            .map_err(|err| Error::io("failed to create history file", err))?;
        let writer = BufWriter::new(file);
        to_writer_pretty(writer, &HistoryFile::new(messages)).map_err(|err| {
            Error::serialization("failed to serialize history", Some(Box::new(err)))
        })
    }
}
