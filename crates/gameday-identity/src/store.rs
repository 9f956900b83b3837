//! The identity store: every member the chat has reported so far.
//!
//! # Concurrency note
//!
//! `IdentityStore` is NOT thread-safe by itself. It is a plain map owned
//! by the service layer and guarded by a mutex there. Identities are
//! handed out as `Arc<Identity>` so rosters can keep a reference to the
//! member without holding the store.

use std::collections::BTreeMap;
use std::sync::Arc;

use gameday_core::{Identity, TrustLevel, UserId};
use serde::{Deserialize, Serialize};

use crate::{IdentityError, IdentityLookup};

/// Registry of chat members, keyed by user id.
///
/// Updating a member replaces its `Arc`: rosters that already hold the
/// old record keep it, new registrations get the fresh one.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct IdentityStore {
    users: BTreeMap<UserId, Arc<Identity>>,
}

impl IdentityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a member by id.
    pub fn find(&self, user_id: UserId) -> Option<&Arc<Identity>> {
        self.users.get(&user_id)
    }

    /// Returns the member, creating it as [`TrustLevel::New`] if unknown.
    ///
    /// For a known member the full name and language are refreshed with
    /// whatever the platform reports now; the trust level is untouched.
    pub fn find_or_add(
        &mut self,
        user_id: UserId,
        name: &str,
        full_name: Option<&str>,
        language: Option<&str>,
    ) -> Arc<Identity> {
        if let Some(existing) = self.users.get_mut(&user_id) {
            let identity = Arc::make_mut(existing);
            identity.full_name = full_name.map(str::to_owned);
            identity.language = language.map(str::to_owned);
            return Arc::clone(existing);
        }

        let identity = Arc::new(Identity {
            user_id,
            name: name.to_owned(),
            full_name: full_name.map(str::to_owned),
            language: language.map(str::to_owned),
            trust: TrustLevel::New,
        });
        self.users.insert(user_id, Arc::clone(&identity));
        tracing::info!(%user_id, name, "new chat member recorded");
        identity
    }

    /// Adds (or replaces) a complete identity record.
    pub fn add(&mut self, identity: Identity) -> Arc<Identity> {
        let identity = Arc::new(identity);
        self.users.insert(identity.user_id, Arc::clone(&identity));
        identity
    }

    /// Refreshes the display fields of a known member.
    ///
    /// # Errors
    /// Returns [`IdentityError::NotFound`] if the member is unknown.
    pub fn update_profile(
        &mut self,
        user_id: UserId,
        name: &str,
        full_name: Option<&str>,
        language: Option<&str>,
    ) -> Result<Arc<Identity>, IdentityError> {
        let entry = self
            .users
            .get_mut(&user_id)
            .ok_or(IdentityError::NotFound(user_id))?;
        let identity = Arc::make_mut(entry);
        identity.name = name.to_owned();
        identity.full_name = full_name.map(str::to_owned);
        identity.language = language.map(str::to_owned);
        Ok(Arc::clone(entry))
    }

    /// Changes a member's trust level.
    ///
    /// # Errors
    /// Returns [`IdentityError::NotFound`] if the member is unknown.
    pub fn set_trust(
        &mut self,
        user_id: UserId,
        trust: TrustLevel,
    ) -> Result<Arc<Identity>, IdentityError> {
        let entry = self
            .users
            .get_mut(&user_id)
            .ok_or(IdentityError::NotFound(user_id))?;
        let previous = entry.trust;
        Arc::make_mut(entry).trust = trust;
        tracing::info!(%user_id, from = %previous, to = %trust, "trust level changed");
        Ok(Arc::clone(entry))
    }

    /// Returns `true` if the member is known and trusted (or an admin).
    pub fn is_trusted(&self, user_id: UserId) -> bool {
        self.users
            .get(&user_id)
            .is_some_and(|identity| identity.trust.is_trusted())
    }

    /// Mentions of every admin, e.g. `@ann,@bob`, or `(not found)`.
    pub fn admins_mention(&self) -> String {
        let admins: Vec<String> = self
            .users
            .values()
            .filter(|identity| identity.trust == TrustLevel::Admin)
            .map(|identity| format!("@{}", identity.name))
            .collect();
        if admins.is_empty() {
            "(not found)".to_owned()
        } else {
            admins.join(",")
        }
    }

    /// Iterates over all members in user id order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Identity>> {
        self.users.values()
    }

    /// Returns the number of known members.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns `true` if no member is known yet.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl IdentityLookup for IdentityStore {
    fn lookup(&self, user_id: UserId) -> Option<Arc<Identity>> {
        self.users.get(&user_id).cloned()
    }
}
