//! The remote game coordinator.
//!
//! Owns one optional [`RemoteSession`] and the [`MatchState`] beside it,
//! and is the only place either changes. It performs no I/O: every entry
//! point returns the [`Action`]s the caller must carry out, in order.
//!
//! ```text
//! local intent ─┐                      ┌→ Action::Send(message)
//!               ├→ phase gate → rules ─┼→ Action::InitiateConnection ...
//! peer text ────┘   (drop if illegal)  └→ Action::CloseTransport
//! ```
//!
//! Local intents return `Err` when refused and leave state untouched.
//! Anything coming from the peer or the transport is never an error:
//! malformed or out-of-place input is logged and dropped.

use pairplay_protocol::{
    DisconnectReason, MoveMessage, PROTOCOL_VERSION, ProtocolMessage, create_disconnect_message,
    create_game_reset_message, create_handshake_message, create_move_message,
    create_player_update_message, create_rematch_request_message,
    create_rematch_response_message, deserialize, normalize_player_name,
};
use pairplay_session::{
    ConnectionPhase, GameMode, Intent, MatchState, RematchOrigin, RemoteSession, SessionError,
    check_move, is_local_player_turn,
};
use pairplay_signal::{
    DecodedCode, DescriptionKind, SessionDescription, SessionId, decode_code_detailed,
    encode_code,
};
use pairplay_transport::ChannelState;

use crate::{CoordinatorConfig, SessionView};

/// Work the coordinator needs done outside itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Start a fresh transport as the initiating peer; report the offer
    /// through [`Coordinator::on_offer_ready`].
    InitiateConnection,
    /// Start a fresh transport answering `offer`; report the answer
    /// through [`Coordinator::on_answer_ready`].
    AcceptConnection { offer: String },
    /// Apply the guest's answer to the current transport.
    CompleteConnection { answer: String },
    /// Serialize and send a message on the open channel.
    Send(ProtocolMessage),
    /// Abandon any negotiation in flight and close the transport.
    CloseTransport,
}

pub struct Coordinator {
    config: CoordinatorConfig,
    mode: GameMode,
    session: Option<RemoteSession>,
    game: MatchState,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            config,
            mode: GameMode::default(),
            session: None,
            game: MatchState::default(),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn session(&self) -> Option<&RemoteSession> {
        self.session.as_ref()
    }

    pub fn game(&self) -> &MatchState {
        &self.game
    }

    /// The current phase; [`ConnectionPhase::Select`] when there is no
    /// session.
    pub fn phase(&self) -> ConnectionPhase {
        self.session
            .as_ref()
            .map_or(ConnectionPhase::Select, RemoteSession::phase)
    }

    pub fn is_local_player_turn(&self) -> bool {
        is_local_player_turn(self.mode, self.session.as_ref(), &self.game)
    }

    /// Returns `true` while the session waits for the peer's handshake.
    pub fn awaiting_handshake(&self) -> bool {
        self.phase() == ConnectionPhase::Connecting
    }

    pub fn view(&self) -> SessionView {
        let session = self.session.as_ref();
        SessionView {
            mode: self.mode,
            phase: self.phase(),
            session_id: session.map(|s| s.session_id().to_string()),
            session_code: session.and_then(|s| s.code()).map(str::to_owned),
            role: session.map(RemoteSession::role),
            local_name: session
                .map_or(self.config.name(), |s| s.local().name.as_str())
                .to_string(),
            local_symbol: session.map(|s| s.local().symbol),
            remote_name: session.and_then(|s| s.remote_name()).map(str::to_owned),
            error: session.and_then(|s| s.error()).map(str::to_owned),
            rematch_pending: session.and_then(RemoteSession::rematch)
                == Some(RematchOrigin::Remote),
            rematch_requested: session.and_then(RemoteSession::rematch)
                == Some(RematchOrigin::Local),
            is_local_turn: self.is_local_player_turn(),
            board: self.game.board().clone(),
            status: self.game.status(),
        }
    }

    // -----------------------------------------------------------------------
    // Local intents
    // -----------------------------------------------------------------------

    /// Hosts a new session under a freshly generated id.
    pub fn create(&mut self) -> Result<Vec<Action>, SessionError> {
        self.create_with_id(SessionId::generate())
    }

    /// Hosts a new session under `session_id`.
    pub fn create_with_id(&mut self, session_id: SessionId) -> Result<Vec<Action>, SessionError> {
        self.gate(Intent::Create)?;
        self.session = Some(RemoteSession::host(session_id, self.config.name()));
        self.mode = GameMode::Remote;
        self.game = MatchState::default();
        Ok(vec![Action::InitiateConnection])
    }

    /// Joins the session whose offer code the user pasted.
    pub fn join(&mut self, code: &str) -> Result<Vec<Action>, SessionError> {
        self.gate(Intent::Join)?;
        let decoded = decode_expecting(code, DescriptionKind::Offer)?;
        self.session = Some(RemoteSession::guest(decoded.session_id, self.config.name()));
        self.mode = GameMode::Remote;
        self.game = MatchState::default();
        Ok(vec![Action::AcceptConnection {
            offer: decoded.description.body,
        }])
    }

    /// Returns the code the user should send to the peer.
    pub fn copy_code(&self) -> Result<String, SessionError> {
        self.gate(Intent::CopyCode)?;
        self.session
            .as_ref()
            .and_then(RemoteSession::code)
            .map(str::to_owned)
            .ok_or(SessionError::NoSession)
    }

    /// Applies the guest's answer code on the host.
    pub fn submit_answer(&mut self, code: &str) -> Result<Vec<Action>, SessionError> {
        self.gate(Intent::SubmitAnswer)?;
        let decoded = decode_expecting(code, DescriptionKind::Answer)?;
        let session = self.session.as_mut().ok_or(SessionError::NoSession)?;
        if decoded.session_id != *session.session_id() {
            return Err(SessionError::SessionMismatch {
                expected: session.session_id().clone(),
                got: decoded.session_id,
            });
        }
        session.transition(ConnectionPhase::Connecting)?;
        Ok(vec![Action::CompleteConnection {
            answer: decoded.description.body,
        }])
    }

    /// Abandons the session from any phase.
    pub fn leave(&mut self) -> Result<Vec<Action>, SessionError> {
        let Some(session) = self.session.as_ref() else {
            return Ok(Vec::new());
        };
        let mut actions = Vec::new();
        if session.phase().has_open_channel() {
            actions.push(Action::Send(create_disconnect_message(DisconnectReason::Left)));
        }
        actions.push(Action::CloseTransport);
        tracing::info!(session_id = %session.session_id(), phase = %session.phase(), "leaving session");
        self.teardown();
        Ok(actions)
    }

    /// Places the local symbol on `cell` and tells the peer.
    pub fn play_move(&mut self, cell: usize) -> Result<Vec<Action>, SessionError> {
        self.gate(Intent::PlayMove)?;
        if !self.game.status().is_playing() {
            return Err(SessionError::MatchOver);
        }
        if !self.is_local_player_turn() {
            return Err(SessionError::NotYourTurn);
        }
        let symbol = self.game.current_turn();
        let message = create_move_message(cell, symbol, self.game.next_move_number())
            .map_err(|_| SessionError::CellUnavailable(cell))?;
        self.game.apply_move(cell, symbol)?;
        Ok(vec![Action::Send(message)])
    }

    /// Asks the peer for another match once this one has ended.
    pub fn request_rematch(&mut self) -> Result<Vec<Action>, SessionError> {
        self.gate(Intent::RequestRematch)?;
        if self.game.status().is_playing() {
            return Err(SessionError::MatchInProgress);
        }
        let session = self.session.as_mut().ok_or(SessionError::NoSession)?;
        session.transition(ConnectionPhase::RematchRequest)?;
        session.set_rematch(Some(RematchOrigin::Local));
        Ok(vec![Action::Send(create_rematch_request_message())])
    }

    /// Accepts the peer's rematch request and starts the next match.
    pub fn accept_rematch(&mut self) -> Result<Vec<Action>, SessionError> {
        self.gate(Intent::AcceptRematch)?;
        self.require_remote_rematch()?;
        self.start_next_match();
        Ok(vec![Action::Send(create_rematch_response_message(true))])
    }

    /// Declines the peer's rematch request and ends the session.
    pub fn decline_rematch(&mut self) -> Result<Vec<Action>, SessionError> {
        self.gate(Intent::DeclineRematch)?;
        self.require_remote_rematch()?;
        self.teardown();
        Ok(vec![
            Action::Send(create_rematch_response_message(false)),
            Action::Send(create_disconnect_message(DisconnectReason::Left)),
            Action::CloseTransport,
        ])
    }

    /// Clears the board for a new match and tells the peer to do the same.
    pub fn reset_game(&mut self) -> Result<Vec<Action>, SessionError> {
        self.gate(Intent::ResetGame)?;
        self.start_next_match();
        Ok(vec![Action::Send(create_game_reset_message())])
    }

    /// Changes the local display name and tells the peer.
    pub fn update_name(&mut self, name: &str) -> Result<Vec<Action>, SessionError> {
        self.gate(Intent::UpdateName)?;
        let name = normalize_player_name(name);
        let session = self.session.as_mut().ok_or(SessionError::NoSession)?;
        session.rename_local(name.clone());
        let symbol = session.local().symbol;
        self.config.set_name(name.clone());
        Ok(vec![Action::Send(create_player_update_message(&name, symbol))])
    }

    // -----------------------------------------------------------------------
    // Transport events
    // -----------------------------------------------------------------------

    /// The host's transport produced its offer.
    pub fn on_offer_ready(&mut self, offer: &str) -> Vec<Action> {
        self.on_description_ready(SessionDescription::offer(offer), ConnectionPhase::Creating)
    }

    /// The guest's transport produced its answer.
    pub fn on_answer_ready(&mut self, answer: &str) -> Vec<Action> {
        self.on_description_ready(SessionDescription::answer(answer), ConnectionPhase::Joining)
    }

    fn on_description_ready(
        &mut self,
        description: SessionDescription,
        expected: ConnectionPhase,
    ) -> Vec<Action> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.phase() != expected {
            tracing::debug!(phase = %session.phase(), "ignoring late connection description");
            return Vec::new();
        }
        let next = if session.is_host() {
            ConnectionPhase::Waiting
        } else {
            ConnectionPhase::AnswerInput
        };
        session.set_code(encode_code(&description, session.session_id()));
        match session.transition(next) {
            Ok(()) => Vec::new(),
            Err(e) => {
                session.fail(e.to_string());
                vec![Action::CloseTransport]
            }
        }
    }

    /// A negotiation step failed before the channel opened.
    pub fn on_transport_failed(&mut self, reason: &str) -> Vec<Action> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.phase().is_terminal() {
            return Vec::new();
        }
        tracing::warn!(session_id = %session.session_id(), %reason, "transport failed");
        session.disconnect(format!("connection failed: {reason}"));
        vec![Action::CloseTransport]
    }

    /// The transport's channel changed state.
    pub fn on_channel_state(&mut self, state: ChannelState) -> Vec<Action> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        match state {
            ChannelState::Connecting => Vec::new(),
            ChannelState::Open => {
                if session.phase() == ConnectionPhase::AnswerInput {
                    if let Err(e) = session.transition(ConnectionPhase::Connecting) {
                        tracing::debug!(error = %e, "channel opened out of order");
                        return Vec::new();
                    }
                }
                if session.phase() != ConnectionPhase::Connecting || session.handshake_sent() {
                    return Vec::new();
                }
                session.mark_handshake_sent();
                tracing::debug!(session_id = %session.session_id(), "channel open, sending handshake");
                vec![Action::Send(create_handshake_message(&session.local().name))]
            }
            ChannelState::Closed | ChannelState::Failed => {
                if session.phase().is_terminal() {
                    return Vec::new();
                }
                let reason = if state == ChannelState::Closed {
                    "connection closed"
                } else {
                    "connection lost"
                };
                session.disconnect(reason);
                vec![Action::CloseTransport]
            }
        }
    }

    /// The handshake timer fired while still connecting.
    pub fn on_handshake_timeout(&mut self) -> Vec<Action> {
        let retries = self.config.handshake_retries;
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.phase() != ConnectionPhase::Connecting {
            return Vec::new();
        }
        if session.handshake_resends() >= retries {
            session.fail("opponent did not complete the handshake");
            return vec![Action::CloseTransport];
        }
        let attempt = session.note_handshake_resend();
        if !session.handshake_sent() {
            tracing::debug!(attempt, "still waiting for the channel to open");
            return Vec::new();
        }
        tracing::debug!(attempt, "resending handshake");
        vec![Action::Send(create_handshake_message(&session.local().name))]
    }

    // -----------------------------------------------------------------------
    // Peer messages
    // -----------------------------------------------------------------------

    /// Handles one text frame from the peer.
    pub fn on_message(&mut self, text: &str) -> Vec<Action> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        tracing::trace!(%text, "received");
        let Some(message) = deserialize(text) else {
            return Vec::new();
        };
        let phase = session.phase();
        if !phase.accepts(message.kind()) {
            tracing::debug!(kind = %message.kind(), %phase, "dropping message not expected now");
            return Vec::new();
        }

        match message {
            ProtocolMessage::Handshake {
                player_name,
                protocol_version,
            } => self.handle_handshake(player_name, protocol_version),
            ProtocolMessage::Move(mv) => {
                self.handle_move(mv);
                Vec::new()
            }
            ProtocolMessage::RematchRequest => {
                self.handle_rematch_request();
                Vec::new()
            }
            ProtocolMessage::RematchResponse { accepted } => self.handle_rematch_response(accepted),
            ProtocolMessage::Disconnect { reason } => self.handle_disconnect(reason),
            ProtocolMessage::GameReset => {
                tracing::info!("opponent reset the board");
                self.start_next_match();
                Vec::new()
            }
            ProtocolMessage::PlayerUpdate { name, symbol } => {
                let updated = self
                    .session
                    .as_mut()
                    .is_some_and(|session| session.update_remote(name, symbol));
                if !updated {
                    tracing::debug!(%symbol, "dropping player update claiming the local symbol");
                }
                Vec::new()
            }
        }
    }

    fn handle_handshake(&mut self, player_name: String, version: u32) -> Vec<Action> {
        let require_same_version = self.config.require_same_version;
        let reply_budget = self.config.handshake_retries;
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        // A handshake after we connected means ours was lost and the peer
        // is still retrying. Answer it without touching the match, at most
        // as often as a peer may retry so two connected sides cannot echo
        // each other forever.
        if session.phase() != ConnectionPhase::Connecting {
            if session.handshake_replies() >= reply_budget {
                tracing::debug!("dropping repeated handshake, reply budget spent");
                return Vec::new();
            }
            let reply = session.note_handshake_reply();
            tracing::debug!(reply, "answering repeated handshake");
            return vec![Action::Send(create_handshake_message(&session.local().name))];
        }
        if version != PROTOCOL_VERSION && require_same_version {
            tracing::warn!(
                session_id = %session.session_id(),
                expected = PROTOCOL_VERSION,
                got = version,
                "refusing peer with incompatible protocol version"
            );
            session.fail(format!(
                "opponent uses protocol version {version}, this build speaks {PROTOCOL_VERSION}"
            ));
            return vec![
                Action::Send(create_disconnect_message(DisconnectReason::Error)),
                Action::CloseTransport,
            ];
        }

        let mut actions = Vec::new();
        if !session.handshake_sent() {
            session.mark_handshake_sent();
            actions.push(Action::Send(create_handshake_message(&session.local().name)));
        }
        session.identify_remote(player_name);
        match session.transition(ConnectionPhase::Connected) {
            Ok(()) => {
                tracing::info!(
                    session_id = %session.session_id(),
                    opponent = %session.remote().name,
                    "session connected"
                );
            }
            Err(e) => tracing::debug!(error = %e, "handshake did not connect"),
        }
        actions
    }

    fn handle_move(&mut self, mv: MoveMessage) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let opponent = session.remote().symbol;
        if !self.game.status().is_playing() || self.game.current_turn() != opponent {
            tracing::debug!(cell = mv.cell_index, "dropping move outside the opponent's turn");
            return;
        }
        if let Err(rejection) =
            check_move(&mv, self.game.board(), opponent, self.game.next_move_number())
        {
            tracing::debug!(%rejection, "dropping invalid move");
            return;
        }
        match self.game.apply_move(usize::from(mv.cell_index), mv.player) {
            Ok(status) => tracing::debug!(cell = mv.cell_index, ?status, "applied opponent move"),
            Err(e) => tracing::debug!(error = %e, "opponent move not applied"),
        }
    }

    fn handle_rematch_request(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match (session.phase(), session.rematch()) {
            (ConnectionPhase::Connected, _) => {
                if self.game.status().is_playing() {
                    tracing::debug!("dropping rematch request during a match");
                    return;
                }
                if session.transition(ConnectionPhase::RematchRequest).is_ok() {
                    session.set_rematch(Some(RematchOrigin::Remote));
                }
            }
            // Both asked at once: each side treats the other's request as
            // the acceptance of its own.
            (ConnectionPhase::RematchRequest, Some(RematchOrigin::Local)) => {
                tracing::info!("rematch requested by both players");
                self.start_next_match();
            }
            _ => tracing::debug!("dropping duplicate rematch request"),
        }
    }

    fn handle_rematch_response(&mut self, accepted: bool) -> Vec<Action> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.rematch() != Some(RematchOrigin::Local) {
            tracing::debug!("dropping rematch response without a request");
            return Vec::new();
        }
        if accepted {
            tracing::info!("opponent accepted the rematch");
            self.start_next_match();
            return Vec::new();
        }
        session.disconnect("opponent declined the rematch");
        vec![Action::CloseTransport]
    }

    fn handle_disconnect(&mut self, reason: DisconnectReason) -> Vec<Action> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let text = match reason {
            DisconnectReason::Left => "opponent left the session",
            DisconnectReason::Error => "opponent ended the session after an error",
        };
        session.disconnect(text);
        vec![Action::CloseTransport]
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn gate(&self, intent: Intent) -> Result<(), SessionError> {
        let phase = self.phase();
        if phase.allows(intent) {
            Ok(())
        } else {
            Err(SessionError::IntentNotAllowed { intent, phase })
        }
    }

    fn require_remote_rematch(&self) -> Result<(), SessionError> {
        match self.session.as_ref().and_then(RemoteSession::rematch) {
            Some(RematchOrigin::Remote) => Ok(()),
            _ => Err(SessionError::NoRematchPending),
        }
    }

    /// Replaces the board with an empty one, alternating the starting
    /// player. Identity, symbols and names are kept.
    fn start_next_match(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let starter = session.begin_next_match();
        if session.phase() == ConnectionPhase::RematchRequest {
            if let Err(e) = session.transition(ConnectionPhase::Connected) {
                tracing::debug!(error = %e, "could not leave rematch negotiation");
            }
        }
        self.game = MatchState::new(starter);
        tracing::info!(session_id = %session.session_id(), %starter, "new match started");
    }

    fn teardown(&mut self) {
        self.session = None;
        self.mode = GameMode::Local;
        self.game = MatchState::default();
    }
}

/// Decodes a pasted code and checks that it is the expected half of the
/// negotiation.
fn decode_expecting(code: &str, expected: DescriptionKind) -> Result<DecodedCode, SessionError> {
    let decoded = decode_code_detailed(code)?;
    if decoded.description.kind != expected {
        return Err(SessionError::WrongCodeKind { expected });
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use pairplay_protocol::{Symbol, serialize};
    use pairplay_session::GameStatus;

    use super::*;

    fn id() -> SessionId {
        SessionId::parse("AB3CDE").unwrap()
    }

    fn wire(message: &ProtocolMessage) -> String {
        serialize(message).unwrap()
    }

    /// A host that has exchanged handshakes with a guest named "Bo".
    fn connected_host() -> Coordinator {
        let mut host = Coordinator::new(CoordinatorConfig::new().player_name("Ada"));
        host.create_with_id(id()).unwrap();
        host.on_offer_ready("offer-body");
        let answer = encode_code(&SessionDescription::answer("answer-body"), &id());
        host.submit_answer(&answer).unwrap();
        host.on_channel_state(ChannelState::Open);
        host.on_message(&wire(&create_handshake_message("Bo")));
        assert_eq!(host.phase(), ConnectionPhase::Connected);
        host
    }

    fn finish_match(host: &mut Coordinator) {
        // X takes the top row while O answers in the middle row.
        let moves = [(0, Symbol::X), (3, Symbol::O), (1, Symbol::X), (4, Symbol::O), (2, Symbol::X)];
        for (number, (cell, symbol)) in moves.into_iter().enumerate() {
            if symbol == Symbol::X {
                host.play_move(cell).unwrap();
            } else {
                let mv = create_move_message(cell, symbol, number as u32 + 1).unwrap();
                host.on_message(&wire(&mv));
            }
        }
        assert!(!host.game().status().is_playing());
    }

    #[test]
    fn test_create_requests_an_offer() {
        let mut host = Coordinator::new(CoordinatorConfig::default());
        assert_eq!(host.create().unwrap(), vec![Action::InitiateConnection]);
        assert_eq!(host.phase(), ConnectionPhase::Creating);
        assert_eq!(host.mode(), GameMode::Remote);
    }

    #[test]
    fn test_create_twice_is_refused() {
        let mut host = Coordinator::new(CoordinatorConfig::default());
        host.create().unwrap();
        let err = host.create().unwrap_err();
        assert!(matches!(err, SessionError::IntentNotAllowed { .. }));
        assert_eq!(host.phase(), ConnectionPhase::Creating);
    }

    #[test]
    fn test_offer_ready_produces_copyable_code() {
        let mut host = Coordinator::new(CoordinatorConfig::default());
        host.create_with_id(id()).unwrap();
        assert!(host.copy_code().is_err());
        host.on_offer_ready("offer-body");
        assert_eq!(host.phase(), ConnectionPhase::Waiting);
        let code = host.copy_code().unwrap();
        assert!(code.starts_with("AB3CDE:"));
    }

    #[test]
    fn test_join_rejects_answer_code() {
        let mut guest = Coordinator::new(CoordinatorConfig::default());
        let answer = encode_code(&SessionDescription::answer("x"), &id());
        let err = guest.join(&answer).unwrap_err();
        assert!(matches!(
            err,
            SessionError::WrongCodeKind {
                expected: DescriptionKind::Offer
            }
        ));
        assert_eq!(guest.phase(), ConnectionPhase::Select);
    }

    #[test]
    fn test_join_rejects_garbage_without_state_change() {
        let mut guest = Coordinator::new(CoordinatorConfig::default());
        assert!(matches!(
            guest.join("not a code"),
            Err(SessionError::InvalidCode(_))
        ));
        assert!(guest.session().is_none());
    }

    #[test]
    fn test_submit_answer_from_another_session_is_refused() {
        let mut host = Coordinator::new(CoordinatorConfig::default());
        host.create_with_id(id()).unwrap();
        host.on_offer_ready("offer-body");
        let other = SessionId::parse("ZZ9ZZZ").unwrap();
        let answer = encode_code(&SessionDescription::answer("a"), &other);
        let err = host.submit_answer(&answer).unwrap_err();
        assert!(matches!(err, SessionError::SessionMismatch { .. }));
        assert_eq!(host.phase(), ConnectionPhase::Waiting);
    }

    #[test]
    fn test_open_channel_is_not_connected_until_handshake() {
        let mut host = Coordinator::new(CoordinatorConfig::new().player_name("Ada"));
        host.create_with_id(id()).unwrap();
        host.on_offer_ready("offer-body");
        let answer = encode_code(&SessionDescription::answer("answer-body"), &id());
        host.submit_answer(&answer).unwrap();

        let actions = host.on_channel_state(ChannelState::Open);
        assert_eq!(actions, vec![Action::Send(create_handshake_message("Ada"))]);
        assert_eq!(host.phase(), ConnectionPhase::Connecting);
        assert!(!host.is_local_player_turn());

        host.on_message(&wire(&create_handshake_message("Bo")));
        assert_eq!(host.phase(), ConnectionPhase::Connected);
        assert_eq!(host.view().remote_name.as_deref(), Some("Bo"));
        assert!(host.is_local_player_turn());
    }

    #[test]
    fn test_incompatible_version_is_refused_before_connected() {
        let mut host = Coordinator::new(CoordinatorConfig::default());
        host.create_with_id(id()).unwrap();
        host.on_offer_ready("offer-body");
        let answer = encode_code(&SessionDescription::answer("answer-body"), &id());
        host.submit_answer(&answer).unwrap();
        host.on_channel_state(ChannelState::Open);

        let future = ProtocolMessage::Handshake {
            player_name: "Bo".into(),
            protocol_version: PROTOCOL_VERSION + 1,
        };
        let actions = host.on_message(&wire(&future));
        assert_eq!(
            actions,
            vec![
                Action::Send(create_disconnect_message(DisconnectReason::Error)),
                Action::CloseTransport
            ]
        );
        assert_eq!(host.phase(), ConnectionPhase::Error);
        assert!(host.view().error.unwrap().contains("protocol version"));
    }

    #[test]
    fn test_move_before_connected_is_ignored() {
        let mut host = Coordinator::new(CoordinatorConfig::default());
        host.create_with_id(id()).unwrap();
        let mv = create_move_message(0, Symbol::O, 1).unwrap();
        assert!(host.on_message(&wire(&mv)).is_empty());
        assert!(host.game().board().is_open(0));
    }

    #[test]
    fn test_play_move_sends_numbered_move() {
        let mut host = connected_host();
        let actions = host.play_move(4).unwrap();
        assert_eq!(
            actions,
            vec![Action::Send(create_move_message(4, Symbol::X, 1).unwrap())]
        );
        assert!(matches!(host.play_move(5), Err(SessionError::NotYourTurn)));
    }

    #[test]
    fn test_forged_move_with_local_symbol_is_dropped() {
        let mut host = connected_host();
        host.play_move(4).unwrap();
        // The peer claims to move as X on its own turn.
        let forged = create_move_message(0, Symbol::X, 2).unwrap();
        host.on_message(&wire(&forged));
        assert!(host.game().board().is_open(0));
        assert_eq!(host.game().current_turn(), Symbol::O);
    }

    #[test]
    fn test_duplicate_move_is_applied_once() {
        let mut host = connected_host();
        host.play_move(4).unwrap();
        let reply = wire(&create_move_message(0, Symbol::O, 2).unwrap());
        host.on_message(&reply);
        host.on_message(&reply);
        assert_eq!(host.game().next_move_number(), 3);
        assert_eq!(host.game().current_turn(), Symbol::X);
    }

    #[test]
    fn test_request_rematch_requires_finished_match() {
        let mut host = connected_host();
        assert!(matches!(
            host.request_rematch(),
            Err(SessionError::MatchInProgress)
        ));
        finish_match(&mut host);
        let actions = host.request_rematch().unwrap();
        assert_eq!(actions, vec![Action::Send(create_rematch_request_message())]);
        assert_eq!(host.phase(), ConnectionPhase::RematchRequest);
        assert!(host.view().rematch_requested);
    }

    #[test]
    fn test_incoming_rematch_request_is_surfaced() {
        let mut host = connected_host();
        finish_match(&mut host);
        host.on_message(&wire(&create_rematch_request_message()));
        let view = host.view();
        assert_eq!(view.phase, ConnectionPhase::RematchRequest);
        assert!(view.rematch_pending);
        assert!(!view.rematch_requested);
    }

    #[test]
    fn test_accept_rematch_alternates_starter() {
        let mut host = connected_host();
        finish_match(&mut host);
        host.on_message(&wire(&create_rematch_request_message()));
        let actions = host.accept_rematch().unwrap();
        assert_eq!(actions, vec![Action::Send(create_rematch_response_message(true))]);
        assert_eq!(host.phase(), ConnectionPhase::Connected);
        assert_eq!(host.game().current_turn(), Symbol::O);
        assert_eq!(host.game().status(), GameStatus::Playing);
        assert_eq!(host.view().local_symbol, Some(Symbol::X));
    }

    #[test]
    fn test_accept_without_request_is_refused() {
        let mut host = connected_host();
        finish_match(&mut host);
        host.request_rematch().unwrap();
        assert!(matches!(
            host.accept_rematch(),
            Err(SessionError::NoRematchPending)
        ));
    }

    #[test]
    fn test_simultaneous_rematch_requests_merge() {
        let mut host = connected_host();
        finish_match(&mut host);
        host.request_rematch().unwrap();
        let actions = host.on_message(&wire(&create_rematch_request_message()));
        assert!(actions.is_empty());
        assert_eq!(host.phase(), ConnectionPhase::Connected);
        assert_eq!(host.game().current_turn(), Symbol::O);
    }

    #[test]
    fn test_decline_rematch_tears_down() {
        let mut host = connected_host();
        finish_match(&mut host);
        host.on_message(&wire(&create_rematch_request_message()));
        let actions = host.decline_rematch().unwrap();
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[2], Action::CloseTransport);
        assert_eq!(host.phase(), ConnectionPhase::Select);
        assert_eq!(host.mode(), GameMode::Local);
    }

    #[test]
    fn test_declined_rematch_ends_session_for_requester() {
        let mut host = connected_host();
        finish_match(&mut host);
        host.request_rematch().unwrap();
        host.on_message(&wire(&create_rematch_response_message(false)));
        assert_eq!(host.phase(), ConnectionPhase::Disconnected);
        assert_eq!(host.view().error.as_deref(), Some("opponent declined the rematch"));
    }

    #[test]
    fn test_disconnect_freezes_moves() {
        let mut host = connected_host();
        host.on_message(&wire(&create_disconnect_message(DisconnectReason::Left)));
        assert_eq!(host.phase(), ConnectionPhase::Disconnected);
        assert!(matches!(
            host.play_move(0),
            Err(SessionError::IntentNotAllowed { .. })
        ));
        let mv = create_move_message(0, Symbol::O, 1).unwrap();
        host.on_message(&wire(&mv));
        assert!(host.game().board().is_open(0));
    }

    #[test]
    fn test_game_reset_is_mirrored() {
        let mut host = connected_host();
        host.play_move(4).unwrap();
        host.on_message(&wire(&create_game_reset_message()));
        assert!(host.game().board().is_open(4));
        assert_eq!(host.game().current_turn(), Symbol::O);
    }

    #[test]
    fn test_player_update_changes_only_remote_name() {
        let mut host = connected_host();
        host.on_message(&wire(&create_player_update_message("Bea", Symbol::O)));
        assert_eq!(host.view().remote_name.as_deref(), Some("Bea"));
        host.on_message(&wire(&create_player_update_message("Mallory", Symbol::X)));
        let view = host.view();
        assert_eq!(view.remote_name.as_deref(), Some("Bea"));
        assert_eq!(view.local_name, "Ada");
    }

    #[test]
    fn test_leave_from_every_phase_returns_to_select() {
        let mut host = Coordinator::new(CoordinatorConfig::default());
        host.create_with_id(id()).unwrap();
        assert_eq!(host.leave().unwrap(), vec![Action::CloseTransport]);
        assert_eq!(host.phase(), ConnectionPhase::Select);

        let mut host = connected_host();
        assert_eq!(
            host.leave().unwrap(),
            vec![
                Action::Send(create_disconnect_message(DisconnectReason::Left)),
                Action::CloseTransport
            ]
        );
        assert!(host.session().is_none());
        assert!(host.leave().unwrap().is_empty());
    }

    #[test]
    fn test_handshake_timeout_resends_then_fails() {
        let mut host = Coordinator::new(CoordinatorConfig::new().handshake_retries(2));
        host.create_with_id(id()).unwrap();
        host.on_offer_ready("offer-body");
        let answer = encode_code(&SessionDescription::answer("answer-body"), &id());
        host.submit_answer(&answer).unwrap();
        host.on_channel_state(ChannelState::Open);

        for _ in 0..2 {
            let actions = host.on_handshake_timeout();
            assert!(matches!(
                actions.as_slice(),
                [Action::Send(ProtocolMessage::Handshake { .. })]
            ));
        }
        assert_eq!(host.on_handshake_timeout(), vec![Action::CloseTransport]);
        assert_eq!(host.phase(), ConnectionPhase::Error);
    }

    #[test]
    fn test_channel_failure_while_waiting_is_an_error() {
        let mut host = Coordinator::new(CoordinatorConfig::default());
        host.create_with_id(id()).unwrap();
        host.on_offer_ready("offer-body");
        host.on_channel_state(ChannelState::Failed);
        assert_eq!(host.phase(), ConnectionPhase::Error);
        assert_eq!(host.view().error.as_deref(), Some("connection lost"));
    }

    #[test]
    fn test_repeated_handshake_is_answered_without_touching_the_match() {
        let mut host = connected_host();
        host.play_move(4).unwrap();
        let actions = host.on_message(&wire(&create_handshake_message("Bo")));
        assert_eq!(actions, vec![Action::Send(create_handshake_message("Ada"))]);
        assert_eq!(host.phase(), ConnectionPhase::Connected);
        assert!(!host.game().board().is_open(4));
        assert_eq!(host.game().current_turn(), Symbol::O);
    }

    #[test]
    fn test_repeated_handshake_replies_are_bounded() {
        let mut host = connected_host();
        let retries = host.config().handshake_retries;
        for _ in 0..retries {
            assert_eq!(host.on_message(&wire(&create_handshake_message("Bo"))).len(), 1);
        }
        assert!(host.on_message(&wire(&create_handshake_message("Bo"))).is_empty());
        assert_eq!(host.phase(), ConnectionPhase::Connected);
    }

    #[test]
    fn test_repeated_handshake_answered_during_rematch_request() {
        let mut host = connected_host();
        finish_match(&mut host);
        host.on_message(&wire(&create_rematch_request_message()));
        assert_eq!(host.phase(), ConnectionPhase::RematchRequest);
        let actions = host.on_message(&wire(&create_handshake_message("Bo")));
        assert_eq!(actions, vec![Action::Send(create_handshake_message("Ada"))]);
        assert_eq!(host.phase(), ConnectionPhase::RematchRequest);
    }

    #[test]
    fn test_transport_failure_while_connecting_is_an_error() {
        let mut host = Coordinator::new(CoordinatorConfig::default());
        host.create_with_id(id()).unwrap();
        host.on_offer_ready("offer-body");
        let answer = encode_code(&SessionDescription::answer("answer-body"), &id());
        host.submit_answer(&answer).unwrap();
        assert_eq!(host.phase(), ConnectionPhase::Connecting);
        assert_eq!(host.on_transport_failed("ice failed"), vec![Action::CloseTransport]);
        assert_eq!(host.phase(), ConnectionPhase::Error);
        assert_eq!(host.view().error.as_deref(), Some("connection failed: ice failed"));
    }

    #[test]
    fn test_channel_failure_before_handshake_is_an_error() {
        let mut host = Coordinator::new(CoordinatorConfig::default());
        host.create_with_id(id()).unwrap();
        host.on_offer_ready("offer-body");
        let answer = encode_code(&SessionDescription::answer("answer-body"), &id());
        host.submit_answer(&answer).unwrap();
        host.on_channel_state(ChannelState::Open);
        host.on_channel_state(ChannelState::Failed);
        assert_eq!(host.phase(), ConnectionPhase::Error);
        assert_eq!(host.view().error.as_deref(), Some("connection lost"));
    }

    #[test]
    fn test_channel_loss_after_connect_is_disconnected() {
        let mut host = connected_host();
        host.on_channel_state(ChannelState::Failed);
        assert_eq!(host.phase(), ConnectionPhase::Disconnected);
    }

    #[test]
    fn test_update_name_sends_player_update() {
        let mut host = connected_host();
        let actions = host.update_name("  Ada L. ").unwrap();
        assert_eq!(
            actions,
            vec![Action::Send(create_player_update_message("Ada L.", Symbol::X))]
        );
        assert_eq!(host.view().local_name, "Ada L.");
    }
}
