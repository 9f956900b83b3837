//! Schedule templates, competition ids, and event log rows.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Counter that keeps ids unique when two competitions are created
/// within the same second.
static NEXT_COMPETITION_SEQ: AtomicU64 = AtomicU64::new(0);

// ---------------------------------------------------------------------------
// CompetitionId
// ---------------------------------------------------------------------------

/// The id of one game session, e.g. `C20261016183000.3`.
///
/// Made of the creation timestamp and a process-wide sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompetitionId(pub String);

impl CompetitionId {
    /// Generates a fresh id stamped with `now`.
    pub fn generate(now: NaiveDateTime) -> Self {
        let seq = NEXT_COMPETITION_SEQ.fetch_add(1, Ordering::Relaxed);
        Self(format!("C{}.{}", now.format("%Y%m%d%H%M%S"), seq))
    }
}

impl fmt::Display for CompetitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// GameEvent
// ---------------------------------------------------------------------------

/// A slot in the recurring schedule: when and where a game happens and
/// when its registration opens automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    pub date: NaiveDateTime,
    pub duration_minutes: u32,
    /// Facility name.
    pub location: String,
    /// Whether the registration opens by itself at `registration_start`.
    pub auto_registration: bool,
    pub registration_start: NaiveDateTime,
    /// Facility capacity for this slot.
    pub capacity: u32,
    pub valid: bool,
    /// Set once the automatic opening has been requested.
    pub opened: bool,
}

impl GameEvent {
    /// Stable key of the slot: `G<YYYYmmddHHMM>.<location>`.
    pub fn key(&self) -> String {
        format!("G{}.{}", self.date.format("%Y%m%d%H%M"), self.location)
    }

    /// Returns `true` if the automatic opening should fire at `now`.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.valid && self.auto_registration && !self.opened && self.registration_start <= now
    }
}

// ---------------------------------------------------------------------------
// Event log rows
// ---------------------------------------------------------------------------

/// What happened in a registration event.
///
/// The numeric codes are what the history table stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Register,
    Unregister,
    UpdateAttendees,
    Promote,
    RegisterSpare,
    UnregisterSpare,
    UpdateAttendeesSpare,
    Demote,
}

impl EventKind {
    /// Stable numeric code of the event kind.
    pub fn code(self) -> u8 {
        match self {
            Self::Register => 1,
            Self::Unregister => 2,
            Self::UpdateAttendees => 3,
            Self::Promote => 4,
            Self::RegisterSpare => 5,
            Self::UnregisterSpare => 6,
            Self::UpdateAttendeesSpare => 7,
            Self::Demote => 8,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Register => "register",
            Self::Unregister => "unregister",
            Self::UpdateAttendees => "update_attendees",
            Self::Promote => "promote",
            Self::RegisterSpare => "register_spare",
            Self::UnregisterSpare => "unregister_spare",
            Self::UpdateAttendeesSpare => "update_attendees_spare",
            Self::Demote => "demote",
        };
        f.write_str(s)
    }
}

/// One row of the registration history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationEvent {
    pub time: NaiveDateTime,
    pub user_id: UserId,
    pub game_date: Option<NaiveDateTime>,
    pub location: Option<String>,
    /// Attendees this event added or removed (1 = only the user, 2 = user and a guest, ...).
    pub claimed: u32,
    /// Attendees the user still holds after the event.
    pub remaining: u32,
    pub kind: EventKind,
}
