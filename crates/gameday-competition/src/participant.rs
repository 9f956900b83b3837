//! Roster entries.

use std::fmt;
use std::sync::Arc;

use gameday_core::{Identity, UserId};
use serde::{Deserialize, Serialize};

/// Which roster a registration targets or sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Tier {
    /// The confirmed roster, bounded by the facility capacity.
    #[default]
    Main,
    /// The waitlist. Unbounded, promoted from in registration order.
    Spare,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => f.write_str("main roster"),
            Self::Spare => f.write_str("waitlist"),
        }
    }
}

/// One member's registration in one competition.
///
/// `claimed` counts the member plus the guests they bring, so it is
/// always at least 1 while the participant is on a roster. Two
/// participants are equal when they belong to the same member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub identity: Arc<Identity>,
    pub claimed: u32,
}

impl Participant {
    pub fn new(identity: Arc<Identity>, claimed: u32) -> Self {
        Self { identity, claimed }
    }

    pub fn user_id(&self) -> UserId {
        self.identity.user_id
    }
}

impl PartialEq for Participant {
    fn eq(&self, other: &Self) -> bool {
        self.user_id() == other.user_id()
    }
}

impl Eq for Participant {}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity.mention())?;
        if self.claimed > 1 {
            write!(f, " +{}", self.claimed - 1)?;
        }
        Ok(())
    }
}
