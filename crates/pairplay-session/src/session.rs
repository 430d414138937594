//! The remote session: everything both peers must agree on for one
//! pairing, plus the local bookkeeping needed to drive it.
//!
//! A session exists from the moment the user chooses to host or join
//! until they leave. It owns the connection phase; the board lives beside
//! it in a [`MatchState`] so that a rematch can replace the board without
//! touching the session.

use pairplay_protocol::Symbol;
use pairplay_signal::SessionId;
use serde::{Deserialize, Serialize};

use crate::{ConnectionPhase, GameMode, MatchState, SessionError};

/// Name shown for the peer until its handshake arrives.
pub const UNKNOWN_OPPONENT: &str = "Opponent";

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Which side of the pairing a peer is on.
///
/// The host generated the session code. Symbols follow from roles and
/// never change within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Host,
    Guest,
}

impl Role {
    /// The host plays `X` (first to move in the first match).
    pub fn symbol(self) -> Symbol {
        match self {
            Self::Host => Symbol::X,
            Self::Guest => Symbol::O,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Host => Self::Guest,
            Self::Guest => Self::Host,
        }
    }
}

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// One side's mark and display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub symbol: Symbol,
    pub name: String,
}

/// Who asked for the outstanding rematch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RematchOrigin {
    /// We asked; waiting for the peer's answer.
    Local,
    /// The peer asked; waiting for our answer.
    Remote,
}

// ---------------------------------------------------------------------------
// RemoteSession
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RemoteSession {
    session_id: SessionId,
    phase: ConnectionPhase,
    role: Role,
    local: Participant,
    remote: Participant,
    remote_identified: bool,
    error: Option<String>,
    /// Who moved first in the match currently on the board.
    last_starter: Role,
    code: Option<String>,
    rematch: Option<RematchOrigin>,
    handshake_sent: bool,
    handshake_resends: u32,
    handshake_replies: u32,
}

impl RemoteSession {
    /// Creates the initiating side. Starts in [`ConnectionPhase::Creating`].
    pub fn host(session_id: SessionId, local_name: &str) -> Self {
        Self::new(session_id, Role::Host, ConnectionPhase::Creating, local_name)
    }

    /// Creates the joining side. Starts in [`ConnectionPhase::Joining`].
    pub fn guest(session_id: SessionId, local_name: &str) -> Self {
        Self::new(session_id, Role::Guest, ConnectionPhase::Joining, local_name)
    }

    fn new(session_id: SessionId, role: Role, phase: ConnectionPhase, local_name: &str) -> Self {
        tracing::info!(%session_id, ?role, "remote session created");
        Self {
            session_id,
            phase,
            role,
            local: Participant {
                symbol: role.symbol(),
                name: local_name.to_string(),
            },
            remote: Participant {
                symbol: role.other().symbol(),
                name: UNKNOWN_OPPONENT.to_string(),
            },
            remote_identified: false,
            error: None,
            last_starter: Role::Host,
            code: None,
            rematch: None,
            handshake_sent: false,
            handshake_resends: 0,
            handshake_replies: 0,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns `true` for the peer that generated the session code.
    pub fn is_host(&self) -> bool {
        self.role == Role::Host
    }

    pub fn local(&self) -> &Participant {
        &self.local
    }

    pub fn remote(&self) -> &Participant {
        &self.remote
    }

    /// The peer's display name, once its handshake has arrived.
    pub fn remote_name(&self) -> Option<&str> {
        self.remote_identified.then_some(self.remote.name.as_str())
    }

    /// Human-readable reason the session failed or ended, if it did.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The connection code to show the user: the offer on the host, the
    /// answer on the guest.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn rematch(&self) -> Option<RematchOrigin> {
        self.rematch
    }

    pub fn last_starter(&self) -> Role {
        self.last_starter
    }

    pub fn handshake_sent(&self) -> bool {
        self.handshake_sent
    }

    pub fn handshake_resends(&self) -> u32 {
        self.handshake_resends
    }

    /// Moves to `to`.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidTransition`] if the state machine
    /// does not allow it; the phase is unchanged.
    pub fn transition(&mut self, to: ConnectionPhase) -> Result<(), SessionError> {
        if !self.phase.can_transition_to(to) {
            return Err(SessionError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        tracing::info!(
            session_id = %self.session_id,
            from = %self.phase,
            to = %to,
            "session phase changed"
        );
        self.phase = to;
        Ok(())
    }

    /// Ends the session with an error. A session that already ended keeps
    /// its first reason.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if self.phase.is_terminal() {
            return;
        }
        let reason = reason.into();
        tracing::warn!(session_id = %self.session_id, %reason, "session failed");
        self.error = Some(reason);
        self.rematch = None;
        self.phase = ConnectionPhase::Error;
    }

    /// Ends a session whose handshake completed. Before that, a lost
    /// connection is an error instead.
    pub fn disconnect(&mut self, reason: impl Into<String>) {
        if !self.phase.can_transition_to(ConnectionPhase::Disconnected) {
            self.fail(reason);
            return;
        }
        let reason = reason.into();
        tracing::info!(session_id = %self.session_id, %reason, "session disconnected");
        self.error = Some(reason);
        self.rematch = None;
        self.phase = ConnectionPhase::Disconnected;
    }

    pub fn set_code(&mut self, code: String) {
        self.code = Some(code);
    }

    /// Records the peer's handshake name.
    pub fn identify_remote(&mut self, name: String) {
        self.remote.name = name;
        self.remote_identified = true;
    }

    /// Applies a peer's name/mark update to the remote participant.
    ///
    /// Returns `false`, changing nothing, if the update would give the
    /// peer the local player's mark.
    pub fn update_remote(&mut self, name: String, symbol: Symbol) -> bool {
        if symbol == self.local.symbol {
            return false;
        }
        self.remote = Participant { symbol, name };
        self.remote_identified = true;
        true
    }

    pub fn rename_local(&mut self, name: String) {
        self.local.name = name;
    }

    pub fn mark_handshake_sent(&mut self) {
        self.handshake_sent = true;
    }

    /// Counts one handshake resend and returns the total so far.
    pub fn note_handshake_resend(&mut self) -> u32 {
        self.handshake_resends += 1;
        self.handshake_resends
    }

    /// Counts one answer to a repeated peer handshake and returns the
    /// total so far.
    pub fn note_handshake_reply(&mut self) -> u32 {
        self.handshake_replies += 1;
        self.handshake_replies
    }

    pub fn handshake_replies(&self) -> u32 {
        self.handshake_replies
    }

    pub fn set_rematch(&mut self, origin: Option<RematchOrigin>) {
        self.rematch = origin;
    }

    /// Starts a new match in this session and returns the symbol that
    /// moves first.
    ///
    /// The starting role alternates from the previous match. Both peers
    /// hold the same `last_starter`, so both compute the same answer
    /// without exchanging a message.
    pub fn begin_next_match(&mut self) -> Symbol {
        self.last_starter = self.last_starter.other();
        self.rematch = None;
        self.last_starter.symbol()
    }
}

/// Returns `true` only when the local player may move now: remote mode, a
/// session exists and is connected, the match is still being played, and
/// the turn belongs to the local symbol.
pub fn is_local_player_turn(
    mode: GameMode,
    session: Option<&RemoteSession>,
    game: &MatchState,
) -> bool {
    let Some(session) = session else {
        return false;
    };
    mode == GameMode::Remote
        && session.phase() == ConnectionPhase::Connected
        && game.status().is_playing()
        && game.current_turn() == session.local().symbol
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> SessionId {
        SessionId::parse("AB3CDE").unwrap()
    }

    fn connected(session: &mut RemoteSession) {
        let path: &[ConnectionPhase] = if session.is_host() {
            &[ConnectionPhase::Waiting, ConnectionPhase::Connecting, ConnectionPhase::Connected]
        } else {
            &[ConnectionPhase::AnswerInput, ConnectionPhase::Connecting, ConnectionPhase::Connected]
        };
        for phase in path {
            session.transition(*phase).unwrap();
        }
    }

    #[test]
    fn test_host_and_guest_hold_distinct_symbols() {
        let host = RemoteSession::host(id(), "Ada");
        let guest = RemoteSession::guest(id(), "Bo");
        assert_eq!(host.local().symbol, Symbol::X);
        assert_eq!(host.remote().symbol, Symbol::O);
        assert_eq!(guest.local().symbol, Symbol::O);
        assert_eq!(guest.remote().symbol, Symbol::X);
        assert_eq!(host.phase(), ConnectionPhase::Creating);
        assert_eq!(guest.phase(), ConnectionPhase::Joining);
    }

    #[test]
    fn test_transition_rejects_skipping_phases() {
        let mut host = RemoteSession::host(id(), "Ada");
        let err = host.transition(ConnectionPhase::Connected).unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
        assert_eq!(host.phase(), ConnectionPhase::Creating);
    }

    #[test]
    fn test_remote_name_unknown_until_identified() {
        let mut host = RemoteSession::host(id(), "Ada");
        assert_eq!(host.remote_name(), None);
        host.identify_remote("Bo".into());
        assert_eq!(host.remote_name(), Some("Bo"));
    }

    #[test]
    fn test_update_remote_never_takes_local_symbol() {
        let mut host = RemoteSession::host(id(), "Ada");
        assert!(!host.update_remote("Bo".into(), Symbol::X));
        assert_eq!(host.remote().symbol, Symbol::O);
        assert!(host.update_remote("Bea".into(), Symbol::O));
        assert_eq!(host.remote().name, "Bea");
        assert_eq!(host.local().name, "Ada");
    }

    #[test]
    fn test_begin_next_match_alternates_identically_on_both_peers() {
        let mut host = RemoteSession::host(id(), "Ada");
        let mut guest = RemoteSession::guest(id(), "Bo");
        for expected in [Symbol::O, Symbol::X, Symbol::O] {
            assert_eq!(host.begin_next_match(), expected);
            assert_eq!(guest.begin_next_match(), expected);
        }
    }

    #[test]
    fn test_disconnect_before_channel_is_an_error() {
        let mut host = RemoteSession::host(id(), "Ada");
        host.transition(ConnectionPhase::Waiting).unwrap();
        host.disconnect("transport failed");
        assert_eq!(host.phase(), ConnectionPhase::Error);
        assert_eq!(host.error(), Some("transport failed"));
    }

    #[test]
    fn test_disconnect_while_connecting_is_an_error() {
        let mut guest = RemoteSession::guest(id(), "Bo");
        guest.transition(ConnectionPhase::AnswerInput).unwrap();
        guest.transition(ConnectionPhase::Connecting).unwrap();
        guest.disconnect("connection lost");
        assert_eq!(guest.phase(), ConnectionPhase::Error);
        assert_eq!(guest.error(), Some("connection lost"));
    }

    #[test]
    fn test_fail_keeps_first_reason() {
        let mut guest = RemoteSession::guest(id(), "Bo");
        connected(&mut guest);
        guest.disconnect("opponent left");
        guest.fail("later problem");
        assert_eq!(guest.phase(), ConnectionPhase::Disconnected);
        assert_eq!(guest.error(), Some("opponent left"));
    }

    #[test]
    fn test_is_local_player_turn_requires_every_condition() {
        let mut host = RemoteSession::host(id(), "Ada");
        let x_to_move = MatchState::new(Symbol::X);
        let o_to_move = MatchState::new(Symbol::O);

        assert!(!is_local_player_turn(GameMode::Remote, None, &x_to_move));
        assert!(!is_local_player_turn(GameMode::Remote, Some(&host), &x_to_move));

        connected(&mut host);
        assert!(is_local_player_turn(GameMode::Remote, Some(&host), &x_to_move));
        assert!(!is_local_player_turn(GameMode::Local, Some(&host), &x_to_move));
        assert!(!is_local_player_turn(GameMode::Computer, Some(&host), &x_to_move));
        assert!(!is_local_player_turn(GameMode::Remote, Some(&host), &o_to_move));

        let mut finished = MatchState::new(Symbol::X);
        for (cell, symbol) in [(0, Symbol::X), (3, Symbol::O), (1, Symbol::X), (4, Symbol::O), (2, Symbol::X)] {
            finished.apply_move(cell, symbol).unwrap();
        }
        assert!(!is_local_player_turn(GameMode::Remote, Some(&host), &finished));

        host.transition(ConnectionPhase::RematchRequest).unwrap();
        assert!(!is_local_player_turn(GameMode::Remote, Some(&host), &x_to_move));
    }
}
