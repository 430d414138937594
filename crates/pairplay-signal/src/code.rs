//! Encoded connection codes: `<sessionId>:<base64(JSON envelope)>`.
//!
//! The envelope is `{"type":"offer"|"answer","body":"<description>"}`.
//! Codes are pasted by hand, so decoding never panics and reports every
//! kind of damage as "not decodable".

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Serialize};

use crate::{SessionId, SignalError};

/// Standard alphabet; padding is written but optional on input because
/// trailing `=` is easily lost when copying.
const CODE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Which half of the negotiation a description is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionKind {
    Offer,
    Answer,
}

impl DescriptionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Offer => "offer",
            Self::Answer => "answer",
        }
    }
}

/// An opaque transport description tagged with its role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: DescriptionKind,
    pub body: String,
}

impl SessionDescription {
    pub fn offer(body: impl Into<String>) -> Self {
        Self {
            kind: DescriptionKind::Offer,
            body: body.into(),
        }
    }

    pub fn answer(body: impl Into<String>) -> Self {
        Self {
            kind: DescriptionKind::Answer,
            body: body.into(),
        }
    }
}

/// A successfully decoded connection code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCode {
    pub session_id: SessionId,
    pub description: SessionDescription,
}

/// Encodes a description into a copy-pasteable code.
pub fn encode_code(description: &SessionDescription, session_id: &SessionId) -> String {
    let envelope = serde_json::json!({
        "type": description.kind.as_str(),
        "body": description.body,
    });
    let payload = CODE_ENGINE.encode(envelope.to_string());
    format!("{session_id}:{payload}")
}

/// Decodes a pasted code, reporting what was wrong with it.
///
/// Surrounding whitespace is ignored.
///
/// # Errors
/// - [`SignalError::MissingSeparator`] — no `:` in the code
/// - [`SignalError::InvalidSessionId`] — id segment not 6 characters
/// - [`SignalError::InvalidBase64`] — payload does not base64-decode
/// - [`SignalError::NotAnObject`] — payload is JSON but not an object
/// - [`SignalError::InvalidEnvelope`] — payload is not JSON, lacks `type`
///   or `body`, has an unknown `type`, or a non-string `body`
pub fn decode_code_detailed(code: &str) -> Result<DecodedCode, SignalError> {
    let (id, payload) = code.trim().split_once(':').ok_or(SignalError::MissingSeparator)?;
    let session_id = SessionId::parse(id)?;

    let bytes = CODE_ENGINE.decode(payload)?;
    let value: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(SignalError::InvalidEnvelope)?;
    if !value.is_object() {
        return Err(SignalError::NotAnObject);
    }
    let description: SessionDescription =
        serde_json::from_value(value).map_err(SignalError::InvalidEnvelope)?;

    Ok(DecodedCode {
        session_id,
        description,
    })
}

/// Decodes a pasted code, or returns `None` if it is not decodable.
pub fn decode_code(code: &str) -> Option<DecodedCode> {
    match decode_code_detailed(code) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            tracing::debug!(error = %e, "rejected connection code");
            None
        }
    }
}
