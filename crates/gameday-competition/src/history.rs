//! The registration event log.
//!
//! Every roster change is appended here in program order, right after the
//! mutation it records. The engine does not care where the rows end up.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDateTime;
use gameday_core::{RegistrationEvent, UserId};
use serde::{Deserialize, Serialize};

/// Append-only sink for registration events.
pub trait EventLog: Send + Sync + 'static {
    fn add_event(&self, event: RegistrationEvent);

    /// Records the attendance of a confirmed game. Returns `true` if it
    /// set a new record. Logs without a notion of records keep none.
    fn record_attendance(&self, _capacity: u32, _date: NaiveDateTime) -> bool {
        false
    }
}

/// Best attendance seen so far, kept for the community's bragging rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PastCompetitionSummary {
    pub max_capacity: u32,
    pub date: NaiveDateTime,
}

/// An [`EventLog`] that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    events: Mutex<Vec<RegistrationEvent>>,
    summary: Mutex<Option<PastCompetitionSummary>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every event recorded so far, oldest first.
    pub fn events(&self) -> Vec<RegistrationEvent> {
        lock(&self.events).clone()
    }

    /// Events concerning one member, oldest first.
    pub fn events_for(&self, user_id: UserId) -> Vec<RegistrationEvent> {
        lock(&self.events)
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.events).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.events).is_empty()
    }

    pub fn summary(&self) -> Option<PastCompetitionSummary> {
        *lock(&self.summary)
    }
}

impl EventLog for MemoryHistory {
    fn add_event(&self, event: RegistrationEvent) {
        tracing::trace!(user_id = %event.user_id, kind = %event.kind, "history event");
        lock(&self.events).push(event);
    }

    /// Keeps the highest attendance seen so far.
    fn record_attendance(&self, capacity: u32, date: NaiveDateTime) -> bool {
        let mut summary = lock(&self.summary);
        match *summary {
            Some(best) if best.max_capacity >= capacity => false,
            _ => {
                *summary = Some(PastCompetitionSummary {
                    max_capacity: capacity,
                    date,
                });
                true
            }
        }
    }
}

/// A panic while holding the lock leaves plain data behind; keep using it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
