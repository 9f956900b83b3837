//! Error types for the identity layer.

use gameday_core::{TrustLevel, UserId};

/// Errors that can occur while resolving chat members.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The chat never reported this member.
    #[error("identity not found for user {0}")]
    NotFound(UserId),

    /// The member exists but their trust level forbids the action.
    /// Newcomers have to introduce themselves before joining games.
    #[error("user {0} with trust level {1} is not allowed to register")]
    NotAllowed(UserId, TrustLevel),
}
