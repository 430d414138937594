//! Text codec for [`ProtocolMessage`]s at the channel boundary.
//!
//! One message per channel frame, JSON encoded, no envelope. Decoding is
//! strict: the text must match exactly one known variant's shape and pass
//! [`ProtocolMessage::validate`].

use crate::{ProtocolError, ProtocolMessage};

/// Serializes a message to its wire text.
///
/// # Errors
/// Returns [`ProtocolError::Encode`] if JSON serialization fails.
pub fn serialize(message: &ProtocolMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(ProtocolError::Encode)
}

/// Decodes wire text into a message, reporting why it was refused.
///
/// # Errors
/// - [`ProtocolError::Decode`] — malformed JSON, unknown `type`, missing
///   or mistyped field, or a value outside an enumerated set
/// - [`ProtocolError::InvalidMessage`] — a numeric or text field outside
///   its allowed range
pub fn decode(text: &str) -> Result<ProtocolMessage, ProtocolError> {
    let message: ProtocolMessage =
        serde_json::from_str(text).map_err(ProtocolError::Decode)?;
    message.validate()?;
    Ok(message)
}

/// Decodes wire text, returning `None` for anything that is not exactly
/// one well-formed message. Never panics on peer input.
pub fn deserialize(text: &str) -> Option<ProtocolMessage> {
    match decode(text) {
        Ok(message) => Some(message),
        Err(e) => {
            tracing::debug!(error = %e, "dropping undecodable message");
            None
        }
    }
}
