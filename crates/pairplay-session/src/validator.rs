//! Checks an incoming move against local state before it is applied.
//!
//! The move counter is the only ordering signal: a replayed or reordered
//! move carries the wrong number and is refused without keeping any
//! history. Callers drop refused moves and log them; a lost move stalls
//! the match visibly instead of letting the two boards diverge.

use pairplay_protocol::{BOARD_CELLS, MoveMessage, Symbol};

use crate::Board;

/// Why a move was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejection {
    #[error("move by {got}, expected {expected}")]
    WrongPlayer { expected: Symbol, got: Symbol },

    #[error("cell {0} is off the board")]
    CellOutOfRange(u8),

    #[error("cell {0} is already marked")]
    CellOccupied(u8),

    #[error("move number {got}, expected {expected}")]
    WrongMoveNumber { expected: u32, got: u32 },
}

/// Checks a move, returning the first reason it is unacceptable.
///
/// # Errors
/// Returns the [`MoveRejection`] describing the first failed check.
pub fn check_move(
    message: &MoveMessage,
    board: &Board,
    expected_player: Symbol,
    expected_move_number: u32,
) -> Result<(), MoveRejection> {
    if message.player != expected_player {
        return Err(MoveRejection::WrongPlayer {
            expected: expected_player,
            got: message.player,
        });
    }
    let cell = usize::from(message.cell_index);
    if cell >= BOARD_CELLS {
        return Err(MoveRejection::CellOutOfRange(message.cell_index));
    }
    if !board.is_open(cell) {
        return Err(MoveRejection::CellOccupied(message.cell_index));
    }
    if message.move_number != expected_move_number {
        return Err(MoveRejection::WrongMoveNumber {
            expected: expected_move_number,
            got: message.move_number,
        });
    }
    Ok(())
}

/// Returns `true` only if the move is by the expected player, targets an
/// empty on-board cell, and carries the expected move number.
pub fn validate_move_message(
    message: &MoveMessage,
    board: &Board,
    expected_player: Symbol,
    expected_move_number: u32,
) -> bool {
    check_move(message, board, expected_player, expected_move_number).is_ok()
}
