//! Error types for the competition layer.
//!
//! Only misuse of the state machine and plumbing failures end up here.
//! Registration rules (no room left, not registered, ...) are reported
//! through [`RegistrationOutcome`](crate::RegistrationOutcome) instead.

use gameday_core::{CompetitionId, CoreError};

use crate::CompetitionStatus;

/// Errors that can occur during competition operations.
#[derive(Debug, thiserror::Error)]
pub enum CompetitionError {
    /// The operation is not allowed in the competition's current state,
    /// e.g. opening a registration that is already open, or opening a
    /// game without a date.
    #[error("competition {id}: cannot {operation} while {from}")]
    InvalidTransition {
        id: CompetitionId,
        from: CompetitionStatus,
        operation: &'static str,
    },

    /// The competition does not exist.
    #[error("competition {0} not found")]
    NotFound(CompetitionId),

    /// No competition is attached to this poll.
    #[error("no competition for poll {0}")]
    PollNotFound(String),

    /// Exactly one open-or-full competition was expected.
    #[error("expected exactly one open competition, found {0}")]
    NotSingleOpen(usize),

    /// The competition still has a schedule and registered players.
    #[error("competition {0} cannot be deleted while players are registered")]
    NotDeletable(CompetitionId),

    /// The competition's command channel is full or closed.
    #[error("competition {0} is unavailable")]
    Unavailable(CompetitionId),

    /// A snapshot could not be written or read back.
    #[error(transparent)]
    Snapshot(#[from] CoreError),
}
