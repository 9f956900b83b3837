//! Registration and waitlist engine for Gameday.
//!
//! Each competition (one game session) owns a main roster bounded by
//! the facility capacity and an unbounded waitlist. Members join and
//! leave; whenever places free up, the earliest waitlisted party that
//! fits is promoted.
//!
//! Every competition runs as an isolated Tokio task (actor model), so
//! all changes to one competition are applied one at a time.
//!
//! # Key types
//!
//! - [`Competition`]: rosters, capacity, and the join/leave/promote rules
//! - [`CompetitionStatus`]: lifecycle state machine
//! - [`CompetitionManager`]: creates, finds, snapshots competitions
//! - [`CompetitionHandle`]: send commands to a running competition actor
//! - [`Notifier`] / [`EventLog`]: what the engine needs from the outside

#![allow(async_fn_in_trait)]

mod actor;
mod competition;
mod config;
mod error;
mod history;
mod manager;
mod notifier;
mod participant;
mod reply;
mod truncate;

pub use actor::{CompetitionHandle, CompetitionInfo, ScheduleChange};
pub use competition::{Competition, PollRef, ScheduleEdit};
pub use config::{CompetitionConfig, CompetitionStatus};
pub use error::CompetitionError;
pub use history::{EventLog, MemoryHistory, PastCompetitionSummary};
pub use manager::CompetitionManager;
pub use notifier::{MessageCode, Notifier};
pub use participant::{Participant, Tier};
pub use reply::{RegistrationOutcome, Reply, ReplyKind};
