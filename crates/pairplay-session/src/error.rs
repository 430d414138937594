//! Error types for the session layer.

use pairplay_protocol::ProtocolError;
use pairplay_signal::{DescriptionKind, SessionId, SignalError};

use crate::{ConnectionPhase, Intent};

/// Reasons a local request was refused.
///
/// None of these change session state: a refused intent leaves the
/// session exactly as it was. Malformed input arriving from the peer is
/// never reported this way; it is dropped and logged.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The intent is not meaningful in the current phase.
    #[error("{intent} is not available while {phase}")]
    IntentNotAllowed {
        intent: Intent,
        phase: ConnectionPhase,
    },

    /// A phase change that the state machine does not allow.
    #[error("cannot move from {from} to {to}")]
    InvalidTransition {
        from: ConnectionPhase,
        to: ConnectionPhase,
    },

    /// The pasted code could not be decoded.
    #[error("invalid connection code: {0}")]
    InvalidCode(#[from] SignalError),

    /// The code decoded but is the wrong half of the negotiation.
    #[error("expected an {} code", .expected.as_str())]
    WrongCodeKind { expected: DescriptionKind },

    /// The code belongs to a different session.
    #[error("code is for session {got}, this is session {expected}")]
    SessionMismatch { expected: SessionId, got: SessionId },

    /// There is no remote session.
    #[error("no active session")]
    NoSession,

    /// It is not the local player's turn.
    #[error("not your turn")]
    NotYourTurn,

    /// The cell is off the board or already marked.
    #[error("cell {0} is not available")]
    CellUnavailable(usize),

    /// The match has already ended.
    #[error("the match is over")]
    MatchOver,

    /// The match is still being played.
    #[error("the match is still in progress")]
    MatchInProgress,

    /// A rematch answer was given with no request from the peer pending.
    #[error("no rematch request from the opponent is pending")]
    NoRematchPending,

    /// An outbound message could not be built.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
