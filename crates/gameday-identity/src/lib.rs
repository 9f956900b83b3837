//! Chat member identities for Gameday.
//!
//! This crate keeps track of who is in the community:
//!
//! 1. **Storage**: every member the chat has ever reported ([`IdentityStore`])
//! 2. **Trust**: who may register for games and who administers them
//! 3. **Lookup**: the read-only view the registration engine consumes
//!    ([`IdentityLookup`] trait)
//!
//! # How it fits in the stack
//!
//! ```text
//! Service layer (above)  ← resolves a chat user before joining a game
//!     ↕
//! Identity layer (this crate)  ← member records and trust levels
//!     ↕
//! Core layer (below)  ← provides UserId, Identity, TrustLevel
//! ```

mod error;
mod lookup;
mod store;

pub use error::IdentityError;
pub use lookup::IdentityLookup;
pub use store::IdentityStore;
