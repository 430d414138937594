//! Session state for Pairplay.
//!
//! Everything a peer needs to decide, on its own, whether something is
//! allowed right now. There is no server: each side runs the same rules
//! over the same messages and must reach the same state.
//!
//! # Key types
//!
//! - [`ConnectionPhase`] — the connection state machine, with [`Intent`]
//!   and message gating
//! - [`RemoteSession`] — one pairing: id, roles, names, phase, rematch
//!   bookkeeping
//! - [`MatchState`] — the board, whose turn it is, the next move number
//! - [`check_move`] / [`validate_move_message`] — incoming move checks

mod board;
mod error;
mod phase;
mod session;
mod validator;

pub use board::{Board, GameMode, GameStatus, MatchState};
pub use error::SessionError;
pub use phase::{ConnectionPhase, Intent};
pub use session::{
    Participant, RematchOrigin, RemoteSession, Role, UNKNOWN_OPPONENT, is_local_player_turn,
};
pub use validator::{MoveRejection, check_move, validate_move_message};
