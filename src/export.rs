//! Transcript export.
//!
//! Pure formatting plus a file write: a header block (who exported, when,
//! how many messages) followed by one timestamped attributed line per
//! message. Also recognizes the chat-box phrases that request an export
//! instead of a dispatch.

use std::fs;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use time::OffsetDateTime;

use crate::error::{Error, Result};
use crate::types::{Message, User};
use crate::utils::time as time_utils;

/// Chat-box phrases that trigger an export instead of a remote dispatch.
///
/// Matched case-insensitively as substrings; exactly these three forms are
/// recognized.
pub const EXPORT_PHRASES: [&str; 3] = ["export chat", "show history", "save history"];

/// Returns true if the input asks for a history export.
pub fn is_export_command(input: &str) -> bool {
    let lowered = input.to_lowercase();
    EXPORT_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}

/// Formats the message sequence as a downloadable transcript.
pub fn format_transcript(
    messages: &[Message],
    user: Option<&User>,
    exported_at: OffsetDateTime,
) -> String {
    let mut out = String::new();
    out.push_str("=== sMeNa.Tv chat history ===\n");
    let exporter = user.map(|u| u.username.as_str()).unwrap_or("anonymous");
    out.push_str(&format!("Exported by: {exporter}\n"));
    out.push_str(&format!(
        "Exported at: {}\n",
        time_utils::display(exported_at)
    ));
    out.push_str(&format!("Messages: {}\n\n", messages.len()));

    for message in messages {
        let who = if message.from_user { "You" } else { "Assistant" };
        let body = if message.is_image() {
            "[image]"
        } else {
            message.text.as_str()
        };
        out.push_str(&format!(
            "[{}] {}: {}\n",
            time_utils::display(message.timestamp),
            who,
            body
        ));
    }
    out
}

/// Writes the formatted transcript to a file.
pub fn export_to_file<P: AsRef<Path>>(
    path: P,
    messages: &[Message],
    user: Option<&User>,
) -> Result<()> {
    let transcript = format_transcript(messages, user, time_utils::now());
    fs::write(path.as_ref(), transcript)
        .map_err(|err| Error::io("failed to write transcript", err))
}

/// Decodes an inline image payload to raw bytes.
///
/// Accepts both a bare base64 string and a `data:image/...;base64,` URL.
pub fn decode_image_payload(payload: &str) -> Result<Vec<u8>> {
    let encoded = match payload.split_once(";base64,") {
        Some((_, rest)) => rest,
        None => payload,
    };
    BASE64
        .decode(encoded.trim())
        .map_err(|err| Error::serialization("invalid image payload", Some(Box::new(err))))
}

/// Writes an image message's payload to a file.
pub fn save_image<P: AsRef<Path>>(path: P, payload: &str) -> Result<()> {
    let bytes = decode_image_payload(payload)?;
    fs::write(path.as_ref(), bytes).map_err(|err| Error::io("failed to write image", err))
}
