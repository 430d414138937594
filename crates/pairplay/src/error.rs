//! Unified error type for Pairplay.

use pairplay_protocol::ProtocolError;
use pairplay_session::SessionError;
use pairplay_signal::SignalError;
use pairplay_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum PairplayError {
    /// A transport-level error (negotiation, send, close).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A connection code could not be decoded.
    #[error(transparent)]
    Signal(#[from] SignalError),

    /// A local request was refused by the session.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The driver task has exited; no further requests can be served.
    #[error("session driver is not running")]
    DriverStopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let pairplay_err: PairplayError = err.into();
        assert!(matches!(pairplay_err, PairplayError::Transport(_)));
        assert!(pairplay_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let pairplay_err: PairplayError = err.into();
        assert!(matches!(pairplay_err, PairplayError::Protocol(_)));
    }

    #[test]
    fn test_from_signal_error() {
        let pairplay_err: PairplayError = SignalError::MissingSeparator.into();
        assert!(matches!(pairplay_err, PairplayError::Signal(_)));
    }

    #[test]
    fn test_from_session_error() {
        let pairplay_err: PairplayError = SessionError::NotYourTurn.into();
        assert!(matches!(pairplay_err, PairplayError::Session(_)));
        assert_eq!(pairplay_err.to_string(), "not your turn");
    }
}
