use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named conversational profile selecting which backend capability serves
/// a chat request.
///
/// `Local` is not a remote capability; it tags replies synthesized on the
/// client when no backend mode is reachable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Low-latency default profile.
    Fast,
    /// Higher-throughput profile.
    Turbo,
    /// Highest-quality profile.
    Ultra,
    /// Creative-writing profile.
    Creative,
    /// Image generation.
    Image,
    /// Client-local canned replies.
    Local,
}

impl ChatMode {
    /// All remote-capable modes, in display order.
    pub const REMOTE: [ChatMode; 5] = [
        ChatMode::Fast,
        ChatMode::Turbo,
        ChatMode::Ultra,
        ChatMode::Creative,
        ChatMode::Image,
    ];

    /// The wire name of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Fast => "fast",
            ChatMode::Turbo => "turbo",
            ChatMode::Ultra => "ultra",
            ChatMode::Creative => "creative",
            ChatMode::Image => "image",
            ChatMode::Local => "local",
        }
    }
}

impl Default for ChatMode {
    fn default() -> Self {
        ChatMode::Fast
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fast" => Ok(ChatMode::Fast),
            "turbo" => Ok(ChatMode::Turbo),
            "ultra" => Ok(ChatMode::Ultra),
            "creative" => Ok(ChatMode::Creative),
            "image" => Ok(ChatMode::Image),
            "local" => Ok(ChatMode::Local),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}
