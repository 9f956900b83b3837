//! # Gameday
//!
//! Registration and waitlist service for recurring pickup games.
//!
//! A chat community plays at fixed facilities on fixed days. Gameday
//! keeps the list of who is coming: members join the main roster or the
//! waitlist, drop out, and get promoted when a place frees up. Admins
//! open, confirm, and cancel games and change how many places there are.
//!
//! The chat platform is outside this crate. The embedding program
//! implements [`Notifier`](gameday_competition::Notifier) to deliver
//! messages and calls [`GamedayService`] for every command or poll vote.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gameday::prelude::*;
//!
//! let service = Arc::new(
//!     GamedayServiceBuilder::new()
//!         .config(GamedayConfig::load("gameday.toml")?)
//!         .build(Arc::new(MyChat::new()), Arc::new(MemoryHistory::new())),
//! );
//! let auto = Arc::new(AutoOpener::new(schedule, service.clone(), config.schedule.auto_open()));
//! tokio::spawn(auto.run(shutdown_rx));
//! ```

mod config;
mod error;
mod logging;
mod service;

pub use config::{FacilityConfig, GamedayConfig, LoggingConfig, ScheduleConfig};
pub use error::GamedayError;
pub use logging::init_tracing;
pub use service::{GamedayService, GamedayServiceBuilder, POLL_OPTION_MAIN, POLL_OPTION_SPARE};

pub mod prelude {
    pub use std::sync::Arc;

    pub use gameday_competition::{
        CompetitionInfo, CompetitionStatus, EventLog, MemoryHistory, MessageCode, Notifier,
        PollRef, RegistrationOutcome, Reply, ReplyKind, ScheduleChange, Tier,
    };
    pub use gameday_core::{
        CompetitionId, GameEvent, Identity, JsonCodec, TrustLevel, UserId, local_now,
    };
    pub use gameday_schedule::{AutoOpenConfig, AutoOpener, Schedule};

    pub use crate::{
        GamedayConfig, GamedayError, GamedayService, GamedayServiceBuilder, init_tracing,
    };
}
