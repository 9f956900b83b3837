//! Competition configuration and state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CompetitionConfig
// ---------------------------------------------------------------------------

/// Settings shared by every competition of a community.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitionConfig {
    /// The usual length of a game. Location lines only mention the
    /// duration when a game differs from it.
    pub default_duration_minutes: u32,

    /// Command queue depth of each competition actor.
    pub channel_size: usize,
}

impl Default for CompetitionConfig {
    fn default() -> Self {
        Self {
            default_duration_minutes: 90,
            channel_size: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// CompetitionStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of a competition.
///
/// ```text
///                 open_registration()
///   Scheduled ─────────────────────────→ Open ⇄ Full
///       ↑ │                               │      │
///       │ │ cancel()      confirm_and_close()    │
///       │ ↓                               ↓      ↓
///   Cancelled ←──────── cancel() ──────── Confirmed
/// ```
///
/// - **Scheduled**: the game exists but nobody can register yet.
/// - **Open**: registration accepted, free places left.
/// - **Full**: registration accepted, every place taken. Only the
///   waitlist grows. Open and Full flip automatically as the roster changes.
/// - **Confirmed**: registration closed, the game happens.
/// - **Cancelled**: the game does not happen.
///
/// Confirmed and Cancelled end the current registration period; an admin
/// may re-open either of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompetitionStatus {
    Scheduled,
    Open,
    Full,
    Confirmed,
    Cancelled,
}

impl CompetitionStatus {
    /// Returns `true` while people can register or leave.
    pub fn is_open_or_full(&self) -> bool {
        matches!(self, Self::Open | Self::Full)
    }

    /// Returns `true` if `open_registration` is allowed from this state.
    pub fn can_open(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Confirmed | Self::Cancelled)
    }

    /// Short human description, depending on whether the game is still ahead.
    pub fn describe(&self, upcoming: bool) -> &'static str {
        match (self, upcoming) {
            (Self::Scheduled, _) => "scheduled",
            (Self::Open, true) => "registration is open",
            (Self::Open, false) => "past, was open",
            (Self::Full, true) => "registration is full",
            (Self::Full, false) => "past, was full",
            (Self::Confirmed, true) => "confirmed, go play!",
            (Self::Confirmed, false) => "past, was confirmed",
            (Self::Cancelled, _) => "cancelled",
        }
    }
}

impl fmt::Display for CompetitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled => write!(f, "Scheduled"),
            Self::Open => write!(f, "Open"),
            Self::Full => write!(f, "Full"),
            Self::Confirmed => write!(f, "Confirmed"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}
