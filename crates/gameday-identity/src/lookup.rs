//! Read-only identity lookup consumed by the registration engine.
//!
//! The engine never creates or edits members. It only needs to turn a
//! [`UserId`] into an [`Identity`], and this trait is that seam: the
//! production store implements it, and tests can hand in a plain map.

use std::collections::HashMap;
use std::sync::Arc;

use gameday_core::{Identity, UserId};

use crate::IdentityError;

/// Resolves a user id into a shared identity record.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// use gameday_core::{Identity, TrustLevel, UserId};
/// use gameday_identity::IdentityLookup;
///
/// let mut members = HashMap::new();
/// members.insert(UserId(1), Arc::new(Identity::new(UserId(1), "ann", TrustLevel::Trusted)));
///
/// assert!(members.lookup(UserId(1)).is_some());
/// assert!(members.require_registrant(UserId(2)).is_err());
/// ```
pub trait IdentityLookup: Send + Sync {
    /// Returns the identity for `user_id`, or `None` if unknown.
    fn lookup(&self, user_id: UserId) -> Option<Arc<Identity>>;

    /// Returns the identity only if it may register for games.
    ///
    /// # Errors
    /// - [`IdentityError::NotFound`]: the member is unknown
    /// - [`IdentityError::NotAllowed`]: the trust level forbids registering
    fn require_registrant(&self, user_id: UserId) -> Result<Arc<Identity>, IdentityError> {
        let identity = self
            .lookup(user_id)
            .ok_or(IdentityError::NotFound(user_id))?;
        if !identity.trust.may_register() {
            return Err(IdentityError::NotAllowed(user_id, identity.trust));
        }
        Ok(identity)
    }
}

impl IdentityLookup for HashMap<UserId, Arc<Identity>> {
    fn lookup(&self, user_id: UserId) -> Option<Arc<Identity>> {
        self.get(&user_id).cloned()
    }
}
