//! Message types that travel over the peer channel once it is open.
//!
//! Every message is one JSON object with a `type` discriminator:
//!
//! ```text
//! {"type":"handshake","playerName":"Ada","protocolVersion":1}
//! {"type":"move","cellIndex":4,"player":"O","moveNumber":2}
//! {"type":"rematch-request"}
//! {"type":"rematch-response","accepted":true}
//! {"type":"disconnect","reason":"left"}
//! {"type":"game-reset"}
//! {"type":"player-update","name":"Ada","symbol":"X"}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{BOARD_CELLS, MAX_PLAYER_NAME_CHARS, ProtocolError};

// ---------------------------------------------------------------------------
// Symbol
// ---------------------------------------------------------------------------

/// One of the two playable marks.
///
/// `X` always takes the first turn of a session's first match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    /// Returns the other mark.
    pub fn opponent(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => write!(f, "X"),
            Self::O => write!(f, "O"),
        }
    }
}

// ---------------------------------------------------------------------------
// DisconnectReason
// ---------------------------------------------------------------------------

/// Why a peer is leaving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisconnectReason {
    /// The user chose to leave.
    Left,
    /// The peer hit an unrecoverable problem (e.g. incompatible version).
    Error,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Error => write!(f, "error"),
        }
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// A claimed placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveMessage {
    /// Target cell, row-major, `0..9`.
    pub cell_index: u8,
    /// The mark being placed. Must be the mover's own symbol.
    pub player: Symbol,
    /// Position of this move in the match, starting at 1.
    pub move_number: u32,
}

/// The closed set of messages exchanged between peers.
///
/// Build outbound messages with the `create_*` functions so that every
/// message sent is one that [`ProtocolMessage::validate`] accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ProtocolMessage {
    /// First message after the channel opens; identifies the sender.
    Handshake {
        player_name: String,
        protocol_version: u32,
    },

    /// A claimed placement.
    Move(MoveMessage),

    /// Asks the peer to start another match in this session.
    RematchRequest,

    /// Answers a [`ProtocolMessage::RematchRequest`].
    RematchResponse { accepted: bool },

    /// The sender is leaving the session.
    Disconnect { reason: DisconnectReason },

    /// The sender cleared its board for a new match.
    GameReset,

    /// The sender changed its display name or mark.
    PlayerUpdate { name: String, symbol: Symbol },
}

/// The discriminator of a [`ProtocolMessage`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Handshake,
    Move,
    RematchRequest,
    RematchResponse,
    Disconnect,
    GameReset,
    PlayerUpdate,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Handshake => "handshake",
            Self::Move => "move",
            Self::RematchRequest => "rematch-request",
            Self::RematchResponse => "rematch-response",
            Self::Disconnect => "disconnect",
            Self::GameReset => "game-reset",
            Self::PlayerUpdate => "player-update",
        };
        f.write_str(name)
    }
}

impl ProtocolMessage {
    /// Returns the message's discriminator.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Handshake { .. } => MessageKind::Handshake,
            Self::Move(_) => MessageKind::Move,
            Self::RematchRequest => MessageKind::RematchRequest,
            Self::RematchResponse { .. } => MessageKind::RematchResponse,
            Self::Disconnect { .. } => MessageKind::Disconnect,
            Self::GameReset => MessageKind::GameReset,
            Self::PlayerUpdate { .. } => MessageKind::PlayerUpdate,
        }
    }

    /// Checks value ranges that the JSON shape alone cannot express.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] for a cell index outside
    /// the board, a move number of 0, or an empty or oversized name.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            Self::Handshake { player_name, .. } => validate_name(player_name),
            Self::Move(mv) => {
                if usize::from(mv.cell_index) >= BOARD_CELLS {
                    return Err(ProtocolError::InvalidMessage(format!(
                        "cell index {} outside the board",
                        mv.cell_index
                    )));
                }
                if mv.move_number == 0 {
                    return Err(ProtocolError::InvalidMessage(
                        "move numbers start at 1".into(),
                    ));
                }
                Ok(())
            }
            Self::PlayerUpdate { name, .. } => validate_name(name),
            Self::RematchRequest
            | Self::RematchResponse { .. }
            | Self::Disconnect { .. }
            | Self::GameReset => Ok(()),
        }
    }
}

fn validate_name(name: &str) -> Result<(), ProtocolError> {
    if name.trim().is_empty() {
        return Err(ProtocolError::InvalidMessage("empty player name".into()));
    }
    if name.chars().count() > MAX_PLAYER_NAME_CHARS {
        return Err(ProtocolError::InvalidMessage(format!(
            "player name longer than {MAX_PLAYER_NAME_CHARS} characters"
        )));
    }
    Ok(())
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire shapes are shared with browser peers, so these tests pin
    //! the exact JSON field names.

    use super::*;

    #[test]
    fn test_symbol_opponent() {
        assert_eq!(Symbol::X.opponent(), Symbol::O);
        assert_eq!(Symbol::O.opponent(), Symbol::X);
    }

    #[test]
    fn test_symbol_serializes_as_letter() {
        assert_eq!(serde_json::to_string(&Symbol::O).unwrap(), "\"O\"");
    }

    #[test]
    fn test_move_json_format() {
        let msg = ProtocolMessage::Move(MoveMessage {
            cell_index: 4,
            player: Symbol::O,
            move_number: 2,
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "move",
                "cellIndex": 4,
                "player": "O",
                "moveNumber": 2
            })
        );
    }

    #[test]
    fn test_handshake_json_format() {
        let msg = ProtocolMessage::Handshake {
            player_name: "Ada".into(),
            protocol_version: 1,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "handshake");
        assert_eq!(json["playerName"], "Ada");
        assert_eq!(json["protocolVersion"], 1);
    }

    #[test]
    fn test_unit_variants_json_format() {
        let json = serde_json::to_value(&ProtocolMessage::RematchRequest).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "rematch-request" }));
        let json = serde_json::to_value(&ProtocolMessage::GameReset).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "game-reset" }));
    }

    #[test]
    fn test_disconnect_reason_is_lowercase() {
        let msg = ProtocolMessage::Disconnect {
            reason: DisconnectReason::Left,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["reason"], "left");
    }

    #[test]
    fn test_player_update_json_format() {
        let msg = ProtocolMessage::PlayerUpdate {
            name: "Bo".into(),
            symbol: Symbol::X,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "player-update");
        assert_eq!(json["name"], "Bo");
        assert_eq!(json["symbol"], "X");
    }

    #[test]
    fn test_kind_matches_wire_name() {
        let msg = ProtocolMessage::RematchResponse { accepted: false };
        assert_eq!(msg.kind(), MessageKind::RematchResponse);
        assert_eq!(msg.kind().to_string(), "rematch-response");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], msg.kind().to_string());
    }

    #[test]
    fn test_validate_rejects_out_of_range_cell() {
        let msg = ProtocolMessage::Move(MoveMessage {
            cell_index: 9,
            player: Symbol::X,
            move_number: 1,
        });
        assert!(matches!(
            msg.validate(),
            Err(ProtocolError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_validate_rejects_move_number_zero() {
        let msg = ProtocolMessage::Move(MoveMessage {
            cell_index: 0,
            player: Symbol::X,
            move_number: 0,
        });
        assert!(msg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_and_long_names() {
        let blank = ProtocolMessage::PlayerUpdate {
            name: "   ".into(),
            symbol: Symbol::O,
        };
        assert!(blank.validate().is_err());

        let long = ProtocolMessage::Handshake {
            player_name: "x".repeat(MAX_PLAYER_NAME_CHARS + 1),
            protocol_version: 1,
        };
        assert!(long.validate().is_err());
    }
}
