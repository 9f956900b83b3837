//! Codec trait and implementations for snapshotting the data model.
//!
//! The registration engine keeps everything in memory. Whoever owns the
//! process decides when to write a snapshot to disk and when to read it
//! back; the engine only promises that its types are `Serialize` and
//! `DeserializeOwned`. A [`Codec`] is the strategy that turns those types
//! into bytes, so the storage format can change without touching the engine.

use serde::{de::DeserializeOwned, Serialize};

use crate::CoreError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` lets a single codec be shared by every task
/// that needs to write a snapshot.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `CoreError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CoreError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `CoreError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, CoreError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Snapshots stay human-readable, which makes it easy to fix a roster by
/// hand after a bad night. This is behind the `json` feature flag
/// (enabled by default).
///
/// ## Example
///
/// ```rust
/// use gameday_core::{Codec, Identity, JsonCodec, TrustLevel, UserId};
///
/// let codec = JsonCodec;
/// let alice = Identity::new(UserId(7), "alice", TrustLevel::Trusted);
///
/// let bytes = codec.encode(&alice).unwrap();
/// let decoded: Identity = codec.decode(&bytes).unwrap();
/// assert_eq!(alice, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec(value).map_err(CoreError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, CoreError> {
        serde_json::from_slice(data).map_err(CoreError::Decode)
    }
}
