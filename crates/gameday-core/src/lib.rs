//! Shared data types for Gameday.
//!
//! This crate holds the leaf records every other layer talks about:
//!
//! - **Identity** ([`UserId`], [`Identity`], [`TrustLevel`]): who a chat
//!   member is and how far we trust them.
//! - **Schedule** ([`GameEvent`], [`CompetitionId`]): the template a
//!   game session is created from, and the session's own id.
//! - **Event log rows** ([`RegistrationEvent`], [`EventKind`]): what
//!   the registration engine appends to the history on every change.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how snapshots of the
//!   data model are turned into bytes and back.
//!
//! # Architecture
//!
//! ```text
//! Chat layer → Service (gameday) → Competition engine → Core types (this crate)
//! ```
//!
//! Nothing here does I/O or knows about rosters. It only describes data.

mod codec;
mod error;
mod event;
mod identity;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::CoreError;
pub use event::{CompetitionId, EventKind, GameEvent, RegistrationEvent};
pub use identity::{Identity, TrustLevel, UserId};

/// Current local wall-clock time.
///
/// Game dates are entered by people in their own timezone, so the whole
/// system works with naive local timestamps.
pub fn local_now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}
