//! Error types for the core layer.
//!
//! Each crate in Gameday defines its own error enum. A `CoreError` always
//! means a snapshot could not be turned into bytes or back, never that a
//! registration rule was broken.

/// Errors that can occur while encoding or decoding snapshots.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: a snapshot written by an older build with a
    /// different shape, or a truncated file.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The data decoded fine but violates a rule of the data model,
    /// e.g. a participant with zero attendees.
    #[error("invalid data: {0}")]
    InvalidData(String),
}
