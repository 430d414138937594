//! Connection phases of a remote session.
//!
//! ```text
//!          ┌→ Creating → Waiting ─────┐  (host)
//! Select ──┤                          ├→ Connecting → Connected ⇄ RematchRequest
//!          └→ Joining → AnswerInput ──┘  (guest)          │
//!                                                         ├→ Disconnected
//!                                                         └→ Error
//! ```
//!
//! Any phase may return to `Select` (the user can always abandon).
//! `Connected` is entered only after the handshake message has been
//! exchanged, not when the transport reports its channel open.
//!
//! Each phase gates which user [`Intent`]s are meaningful and which
//! incoming [`MessageKind`]s are processed; anything else is ignored.

use std::fmt;

use pairplay_protocol::MessageKind;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ConnectionPhase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionPhase {
    /// No session: the user picks host or join.
    Select,
    /// Host: waiting for the transport to produce an offer.
    Creating,
    /// Guest: waiting for the transport to answer the pasted offer.
    Joining,
    /// Host: offer code shown, waiting for the guest's answer code.
    Waiting,
    /// Guest: answer code shown, waiting for the host to apply it.
    AnswerInput,
    /// Channel negotiation finishing and handshake in flight.
    Connecting,
    /// Handshake exchanged; moves flow.
    Connected,
    /// A rematch request is outstanding.
    RematchRequest,
    /// The peer left or the channel dropped after connecting.
    Disconnected,
    /// The session could not be established or was refused.
    Error,
}

impl ConnectionPhase {
    /// Returns `true` if moving to `target` is a legal transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        use ConnectionPhase::*;

        if target == Select {
            return true;
        }
        match self {
            Select => matches!(target, Creating | Joining),
            Creating => matches!(target, Waiting | Error),
            Joining => matches!(target, AnswerInput | Error),
            Waiting | AnswerInput => matches!(target, Connecting | Error),
            Connecting => matches!(target, Connected | Error),
            Connected => matches!(target, RematchRequest | Disconnected | Error),
            RematchRequest => matches!(target, Connected | Disconnected | Error),
            Disconnected | Error => false,
        }
    }

    /// Returns `true` if the user may perform `intent` in this phase.
    pub fn allows(self, intent: Intent) -> bool {
        use ConnectionPhase::*;

        match intent {
            Intent::Leave => true,
            Intent::Create | Intent::Join => self == Select,
            Intent::CopyCode => matches!(self, Waiting | AnswerInput),
            Intent::SubmitAnswer => self == Waiting,
            Intent::PlayMove | Intent::RequestRematch | Intent::ResetGame => self == Connected,
            Intent::AcceptRematch | Intent::DeclineRematch => self == RematchRequest,
            Intent::UpdateName => matches!(self, Connected | RematchRequest),
        }
    }

    /// Returns `true` if an incoming message of `kind` is meaningful in
    /// this phase.
    pub fn accepts(self, kind: MessageKind) -> bool {
        use ConnectionPhase::*;

        match kind {
            MessageKind::Handshake => self.has_open_channel(),
            MessageKind::Move => self == Connected,
            MessageKind::RematchRequest
            | MessageKind::GameReset
            | MessageKind::PlayerUpdate => matches!(self, Connected | RematchRequest),
            MessageKind::RematchResponse => self == RematchRequest,
            MessageKind::Disconnect => self.has_open_channel(),
        }
    }

    /// Returns `true` while a data channel may be open.
    pub fn has_open_channel(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected | Self::RematchRequest)
    }

    /// Returns `true` once the session has ended and only awaits dismissal.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Disconnected | Self::Error)
    }
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Select => "select",
            Self::Creating => "creating",
            Self::Joining => "joining",
            Self::Waiting => "waiting",
            Self::AnswerInput => "answer-input",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::RematchRequest => "rematch-request",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

/// Actions a user can take from the session panel or the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Create,
    Join,
    CopyCode,
    SubmitAnswer,
    Leave,
    PlayMove,
    RequestRematch,
    AcceptRematch,
    DeclineRematch,
    ResetGame,
    UpdateName,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
