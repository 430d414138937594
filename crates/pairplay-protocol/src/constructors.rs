//! Constructors for outbound messages.
//!
//! These are the only sanctioned way to build a message for sending: each
//! one normalizes its inputs so the result passes
//! [`ProtocolMessage::validate`] on the receiving side.

use crate::{
    BOARD_CELLS, DisconnectReason, MAX_PLAYER_NAME_CHARS, MoveMessage, PROTOCOL_VERSION,
    ProtocolError, ProtocolMessage, Symbol,
};

/// Name used when a player leaves theirs blank.
pub const DEFAULT_PLAYER_NAME: &str = "Player";

/// Trims a display name and caps it at [`MAX_PLAYER_NAME_CHARS`].
///
/// A blank name becomes [`DEFAULT_PLAYER_NAME`].
pub fn normalize_player_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return DEFAULT_PLAYER_NAME.to_string();
    }
    trimmed
        .chars()
        .take(MAX_PLAYER_NAME_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Builds the handshake carrying this build's [`PROTOCOL_VERSION`].
pub fn create_handshake_message(player_name: &str) -> ProtocolMessage {
    ProtocolMessage::Handshake {
        player_name: normalize_player_name(player_name),
        protocol_version: PROTOCOL_VERSION,
    }
}

/// Builds a move message.
///
/// # Errors
/// Returns [`ProtocolError::InvalidMessage`] if `cell_index` is off the
/// board or `move_number` is 0.
pub fn create_move_message(
    cell_index: usize,
    player: Symbol,
    move_number: u32,
) -> Result<ProtocolMessage, ProtocolError> {
    if cell_index >= BOARD_CELLS {
        return Err(ProtocolError::InvalidMessage(format!(
            "cell index {cell_index} outside the board"
        )));
    }
    if move_number == 0 {
        return Err(ProtocolError::InvalidMessage(
            "move numbers start at 1".into(),
        ));
    }
    Ok(ProtocolMessage::Move(MoveMessage {
        cell_index: cell_index as u8,
        player,
        move_number,
    }))
}

pub fn create_rematch_request_message() -> ProtocolMessage {
    ProtocolMessage::RematchRequest
}

pub fn create_rematch_response_message(accepted: bool) -> ProtocolMessage {
    ProtocolMessage::RematchResponse { accepted }
}

pub fn create_disconnect_message(reason: DisconnectReason) -> ProtocolMessage {
    ProtocolMessage::Disconnect { reason }
}

pub fn create_game_reset_message() -> ProtocolMessage {
    ProtocolMessage::GameReset
}

/// Builds a display-name/mark update.
pub fn create_player_update_message(name: &str, symbol: Symbol) -> ProtocolMessage {
    ProtocolMessage::PlayerUpdate {
        name: normalize_player_name(name),
        symbol,
    }
}
