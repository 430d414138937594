//! Read-only snapshot of a coordinator for a presentation layer.

use pairplay_protocol::Symbol;
use pairplay_session::{Board, ConnectionPhase, GameMode, GameStatus, Role};
use serde::Serialize;

/// Everything a UI needs to render the session panel and the board.
///
/// Produced by [`Coordinator::view`](crate::Coordinator::view) and
/// published by the driver after every step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub mode: GameMode,
    pub phase: ConnectionPhase,
    pub session_id: Option<String>,
    /// The code to show and copy: the offer on the host, the answer on
    /// the guest.
    pub session_code: Option<String>,
    pub role: Option<Role>,
    pub local_name: String,
    pub local_symbol: Option<Symbol>,
    pub remote_name: Option<String>,
    pub error: Option<String>,
    /// The peer asked for a rematch; the UI offers accept/decline.
    pub rematch_pending: bool,
    /// We asked for a rematch and are waiting for the answer.
    pub rematch_requested: bool,
    pub is_local_turn: bool,
    pub board: Board,
    pub status: GameStatus,
}

impl Default for SessionView {
    fn default() -> Self {
        Self {
            mode: GameMode::default(),
            phase: ConnectionPhase::Select,
            session_id: None,
            session_code: None,
            role: None,
            local_name: String::new(),
            local_symbol: None,
            remote_name: None,
            error: None,
            rematch_pending: false,
            rematch_requested: false,
            is_local_turn: false,
            board: Board::new(),
            status: GameStatus::Playing,
        }
    }
}
