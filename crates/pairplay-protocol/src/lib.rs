//! Wire protocol for Pairplay.
//!
//! This crate defines what two peers say to each other once their channel
//! is open:
//!
//! - **Types** ([`ProtocolMessage`], [`MoveMessage`], [`Symbol`], ...) —
//!   the closed set of messages.
//! - **Constructors** (`create_*`) — the only way outbound messages are
//!   built.
//! - **Codec** ([`serialize`], [`deserialize`], [`decode`]) — text in,
//!   text out, strict on the way in.
//!
//! The protocol layer is pure: no I/O, no session state. Whether a
//! well-formed message is acceptable *now* (right phase, right turn) is
//! decided by the session layer.

mod codec;
mod constructors;
mod error;
mod types;

pub use codec::{decode, deserialize, serialize};
pub use constructors::{
    DEFAULT_PLAYER_NAME, create_disconnect_message, create_game_reset_message,
    create_handshake_message, create_move_message, create_player_update_message,
    create_rematch_request_message, create_rematch_response_message, normalize_player_name,
};
pub use error::ProtocolError;
pub use types::{DisconnectReason, MessageKind, MoveMessage, ProtocolMessage, Symbol};

/// Version carried in every handshake. Peers with a different version are
/// refused before the session reaches `connected`.
pub const PROTOCOL_VERSION: u32 = 1;

/// Number of cells on the board.
pub const BOARD_CELLS: usize = 9;

/// Longest display name, in characters, a peer may announce.
pub const MAX_PLAYER_NAME_CHARS: usize = 24;
