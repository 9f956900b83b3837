//! Outcomes of join and leave requests.
//!
//! Breaking a registration rule is not an error: the member asked for
//! something the roster cannot give, and they get told why. The caller
//! decides whom to relay the [`Reply`] to.

use std::fmt;

use crate::Tier;

/// What a join or leave request did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegistrationOutcome {
    /// The main roster changed.
    pub main: bool,
    /// The waitlist changed.
    pub spare: bool,
    /// Message for the member who asked. `None` when there is nothing to say.
    pub reply: Option<Reply>,
}

impl RegistrationOutcome {
    pub(crate) fn new(main: bool, spare: bool, reply: Reply) -> Self {
        Self {
            main,
            spare,
            reply: Some(reply),
        }
    }

    pub(crate) fn rejected(reply: Reply) -> Self {
        Self::new(false, false, reply)
    }

    /// Returns `true` if any roster changed.
    pub fn is_change(&self) -> bool {
        self.main || self.spare
    }
}

/// A message about one competition, addressed to one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// The competition's location line.
    pub place: String,
    pub kind: ReplyKind,
}

impl Reply {
    pub fn new(place: impl Into<String>, kind: ReplyKind) -> Self {
        Self {
            place: place.into(),
            kind,
        }
    }
}

/// Everything the engine can tell a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    NotOpen,
    AlreadyJoined(Tier),
    CannotExtend(Tier),
    Updated { tier: Tier, claimed: u32 },
    Joined,
    NeedReduce(u32),
    JoinedAsSpare,
    CannotDeregister,
    CannotDeregisterMore,
    Deregistered,
    DeregisteredSpare,
    DeregisteredUpdated(u32),
    Promoted,
    Demoted,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let place = &self.place;
        match self.kind {
            ReplyKind::NotOpen => write!(f, "Registration for {place} is not open."),
            ReplyKind::AlreadyJoined(tier) => {
                write!(f, "You are already registered for {place} ({tier}).")
            }
            ReplyKind::CannotExtend(tier) => write!(
                f,
                "You are registered for {place} ({tier}), but there is no room for more attendees."
            ),
            ReplyKind::Updated { tier, claimed } => write!(
                f,
                "Your registration for {place} ({tier}) now counts {claimed} attendee(s)."
            ),
            ReplyKind::Joined => write!(f, "You joined {place}."),
            ReplyKind::NeedReduce(claimed) => write!(
                f,
                "There is not enough room at {place} for {claimed} attendee(s), please reduce the number."
            ),
            ReplyKind::JoinedAsSpare => write!(f, "You joined the waitlist for {place}."),
            ReplyKind::CannotDeregister => write!(f, "You are not registered for {place}."),
            ReplyKind::CannotDeregisterMore => write!(
                f,
                "You cannot deregister more attendees from {place} than you registered."
            ),
            ReplyKind::Deregistered => write!(f, "You left {place}."),
            ReplyKind::DeregisteredSpare => write!(f, "You left the waitlist for {place}."),
            ReplyKind::DeregisteredUpdated(1) => {
                write!(f, "Your registration for {place} now counts only you.")
            }
            ReplyKind::DeregisteredUpdated(remaining) => write!(
                f,
                "Your registration for {place} now counts {remaining} attendee(s)."
            ),
            ReplyKind::Promoted => write!(
                f,
                "A place freed up at {place}: you moved from the waitlist to the main roster!"
            ),
            ReplyKind::Demoted => write!(
                f,
                "The capacity of {place} was reduced: you moved to the front of the waitlist."
            ),
        }
    }
}
