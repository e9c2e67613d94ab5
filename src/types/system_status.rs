use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::utils::time as time_utils;

/// Snapshot of backend capability flags.
///
/// Replaced wholesale on every poll; fields are never merged one by one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    /// False when the backend itself is unreachable.
    pub server_available: bool,
    /// Fast-profile workers online.
    #[serde(default)]
    pub fast: bool,
    /// Turbo-profile workers online.
    #[serde(default)]
    pub turbo: bool,
    /// Ultra-profile workers online.
    #[serde(default)]
    pub ultra: bool,
    /// Creative-profile workers online.
    #[serde(default)]
    pub creative: bool,
    /// Image-generation workers online.
    #[serde(default)]
    pub image: bool,
    /// When this snapshot was taken (client clock).
    #[serde(default = "time_utils::now", with = "crate::utils::time")]
    pub checked_at: OffsetDateTime,
}

/// Envelope for `GET /system/status`.
#[derive(Debug, Deserialize)]
pub struct SystemStatusResponse {
    /// The capability snapshot.
    pub status: SystemStatus,
}

/// Human-readable service tier derived from a [`SystemStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTier {
    /// Backend unreachable.
    Offline,
    /// All five capabilities online.
    Full,
    /// Turbo and ultra both online (without the full set).
    TurboUltra,
    /// Fast online.
    Fast,
    /// Turbo online (without fast).
    Turbo,
    /// Ultra online (without fast or turbo).
    Ultra,
    /// Backend reachable but no capability online; replies are local.
    Local,
}

impl StatusTier {
    /// Display label for the tier.
    pub fn label(&self) -> &'static str {
        match self {
            StatusTier::Offline => "offline",
            StatusTier::Full => "all systems",
            StatusTier::TurboUltra => "turbo+ultra",
            StatusTier::Fast => "fast",
            StatusTier::Turbo => "turbo",
            StatusTier::Ultra => "ultra",
            StatusTier::Local => "local only",
        }
    }
}

impl SystemStatus {
    /// The explicit fully-offline snapshot, synthesized when a poll fails.
    pub fn offline() -> Self {
        SystemStatus {
            server_available: false,
            fast: false,
            turbo: false,
            ultra: false,
            creative: false,
            image: false,
            checked_at: time_utils::now(),
        }
    }

    /// Derives the display tier from the capability flags.
    ///
    /// The branch order is part of the contract: a status with both turbo
    /// and fast (but not ultra) reports the fast tier, because the fast
    /// check sits between the turbo+ultra pair check and the lone-turbo
    /// check. Reordering these conditions changes visible labels.
    pub fn tier(&self) -> StatusTier {
        if !self.server_available {
            StatusTier::Offline
        } else if self.fast && self.turbo && self.ultra && self.creative && self.image {
            StatusTier::Full
        } else if self.turbo && self.ultra {
            StatusTier::TurboUltra
        } else if self.fast {
            StatusTier::Fast
        } else if self.turbo {
            StatusTier::Turbo
        } else if self.ultra {
            StatusTier::Ultra
        } else {
            StatusTier::Local
        }
    }

    /// Returns true if the given remote mode is currently served.
    pub fn supports(&self, mode: &crate::types::ChatMode) -> bool {
        use crate::types::ChatMode;
        if !self.server_available {
            return false;
        }
        match mode {
            ChatMode::Fast => self.fast,
            ChatMode::Turbo => self.turbo,
            ChatMode::Ultra => self.ultra,
            ChatMode::Creative => self.creative,
            ChatMode::Image => self.image,
            ChatMode::Local => true,
        }
    }
}
