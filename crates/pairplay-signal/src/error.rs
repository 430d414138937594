//! Error types for the signaling codec.

/// Reasons a pasted connection code could not be decoded.
///
/// The public decode path collapses these to `None`; they are kept apart
/// so that logs can say what was wrong with a code.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// No `:` between the session id and the payload.
    #[error("code has no session separator")]
    MissingSeparator,

    /// The session id segment is not a well-formed id.
    #[error("invalid session id {0:?}")]
    InvalidSessionId(String),

    /// The payload is not base64.
    #[error("payload is not base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// The payload decoded but is not a JSON object.
    #[error("payload is not a JSON object")]
    NotAnObject,

    /// The JSON object lacks `type` or `body`, or holds the wrong values.
    #[error("invalid description envelope: {0}")]
    InvalidEnvelope(#[source] serde_json::Error),
}
