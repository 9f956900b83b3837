//! Identity types: who a chat member is and how far we trust them.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// UserId
// ---------------------------------------------------------------------------

/// The stable id of a chat member, as assigned by the chat platform.
///
/// A newtype so a user id can never be confused with a message id or a
/// poll id, even though all of them are integers underneath.
/// `#[serde(transparent)]` keeps it a bare number in snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TrustLevel
// ---------------------------------------------------------------------------

/// How far the community trusts a member.
///
/// New members start as [`TrustLevel::New`] and are promoted by an admin
/// once they have introduced themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TrustLevel {
    #[default]
    New,
    Trusted,
    Removed,
    Restricted,
    Admin,
    Bot,
}

impl TrustLevel {
    /// Returns `true` for members whose word counts (trusted members and admins).
    pub fn is_trusted(&self) -> bool {
        matches!(self, Self::Trusted | Self::Admin)
    }

    /// Returns `true` if the member may register for games.
    ///
    /// Newcomers, restricted and removed members have to sort out their
    /// membership first. Bots never play.
    pub fn may_register(&self) -> bool {
        self.is_trusted()
    }
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::Trusted => "trusted",
            Self::Removed => "removed",
            Self::Restricted => "restricted",
            Self::Admin => "admin",
            Self::Bot => "bot",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A chat member's identity.
///
/// `user_id` never changes; the display fields are refreshed whenever the
/// platform reports new values for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    /// Platform handle, without the leading `@`.
    pub name: String,
    pub full_name: Option<String>,
    /// Preferred language code as reported by the platform (`"en"`, `"de"`, ...).
    pub language: Option<String>,
    pub trust: TrustLevel,
}

impl Identity {
    pub fn new(user_id: UserId, name: impl Into<String>, trust: TrustLevel) -> Self {
        Self {
            user_id,
            name: name.into(),
            full_name: None,
            language: None,
            trust,
        }
    }

    /// Builder-style setter for the full name.
    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    /// The friendliest name we have: the full name if known, else the handle.
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.name)
    }

    /// `handle (Full Name)`, or just the handle.
    pub fn qualified_name(&self) -> String {
        match &self.full_name {
            Some(full) => format!("{} ({})", self.name, full),
            None => self.name.clone(),
        }
    }

    /// `@handle [Full Name]`, the way rosters list people.
    pub fn mention(&self) -> String {
        match &self.full_name {
            Some(full) => format!("@{} [{}]", self.name, full),
            None => format!("@{}", self.name),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.qualified_name(), self.trust)
    }
}
