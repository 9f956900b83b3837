//! Unified error type for Gameday.

use gameday_competition::CompetitionError;
use gameday_core::CoreError;
use gameday_identity::IdentityError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `gameday` crate, you deal with this single error type
/// instead of importing errors from each layer. The `#[from]` attribute
/// on each wrapper generates the `From` impl, so `?` converts them.
#[derive(Debug, thiserror::Error)]
pub enum GamedayError {
    /// Snapshot encoding or decoding failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The member is unknown or may not register.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// A competition operation failed (bad transition, not found, ...).
    #[error(transparent)]
    Competition(#[from] CompetitionError),

    /// The facility does not offer the requested capacity.
    #[error("{facility} offers no capacity of {capacity} (options: {options:?})")]
    CapacityNotOffered {
        facility: String,
        capacity: u32,
        options: Vec<u32>,
    },

    /// The configuration file is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use gameday_core::{CompetitionId, TrustLevel, UserId};

    use super::*;

    #[test]
    fn test_from_identity_error() {
        let err = IdentityError::NotAllowed(UserId(3), TrustLevel::New);
        let gameday_err: GamedayError = err.into();
        assert!(matches!(gameday_err, GamedayError::Identity(_)));
        assert!(gameday_err.to_string().contains("U-3"));
    }

    #[test]
    fn test_from_competition_error() {
        let err = CompetitionError::NotFound(CompetitionId("C1.0".into()));
        let gameday_err: GamedayError = err.into();
        assert!(matches!(gameday_err, GamedayError::Competition(_)));
        assert!(gameday_err.to_string().contains("C1.0"));
    }

    #[test]
    fn test_from_core_error() {
        let err = CoreError::InvalidData("broken".into());
        let gameday_err: GamedayError = err.into();
        assert!(matches!(gameday_err, GamedayError::Core(_)));
    }

    #[test]
    fn test_capacity_not_offered_lists_options() {
        let err = GamedayError::CapacityNotOffered {
            facility: "Arena".into(),
            capacity: 13,
            options: vec![12, 18],
        };
        assert_eq!(err.to_string(), "Arena offers no capacity of 13 (options: [12, 18])");
    }
}
