//! Error types for the protocol layer.
//!
//! Callers at the channel boundary usually only need to know that a
//! message was not acceptable ([`deserialize`](crate::deserialize) returns
//! `None`); the detailed variants exist so the reason can be logged.

/// Reasons a wire payload was not accepted as a [`ProtocolMessage`].
///
/// [`ProtocolMessage`]: crate::ProtocolMessage
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The text is not JSON, has an unknown `type`, lacks a required field,
    /// or a field has the wrong JSON type.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The shape is right but a field holds a value outside its allowed
    /// range (e.g. a cell index of 9 or a move number of 0).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
