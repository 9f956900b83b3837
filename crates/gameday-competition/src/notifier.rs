//! The `Notifier` trait: how the engine talks back to people.
//!
//! The engine never sends chat messages itself. Whoever drives it (the
//! chat layer in production, a recorder in tests) implements this trait,
//! and the engine awaits every call before the operation that caused it
//! returns. That keeps "roster changed" and "people were told" in one
//! step from the caller's point of view.

use std::future::Future;

use gameday_core::{CompetitionId, Identity};

use crate::CompetitionStatus;

/// Which kind of chat message a broadcast is. With `replace_older` the
/// chat layer removes the previous message of the same kind, so the
/// chat shows only the latest roster or status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageCode {
    /// Registration opened, closed, full, cancelled, capacity changed.
    Status,
    /// The current list of participants.
    Participants,
}

/// Capability set the engine needs from the outside world.
///
/// Implementations must not call back into the competition that invoked
/// them: the competition actor is busy awaiting this very call.
pub trait Notifier: Send + Sync + 'static {
    /// Sends a private message to one member (promotion, demotion, ...).
    fn notify_user(&self, identity: &Identity, text: &str) -> impl Future<Output = ()> + Send;

    /// Posts a message to the community chat.
    fn notify_chat(
        &self,
        text: &str,
        code: MessageCode,
        replace_older: bool,
    ) -> impl Future<Output = ()> + Send;

    /// The competition flipped between Open and Full.
    fn competition_status_changed(
        &self,
        id: &CompetitionId,
        status: CompetitionStatus,
        place: &str,
    ) -> impl Future<Output = ()> + Send;
}
