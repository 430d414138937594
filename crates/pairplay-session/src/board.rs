//! The board and the minimal match rules the session needs: whose turn it
//! is, which move number comes next, and whether the match is over.

use pairplay_protocol::{BOARD_CELLS, Symbol};
use serde::{Deserialize, Serialize};

use crate::SessionError;

/// Every line of three that wins.
const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8], // rows
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8], // columns
    [0, 4, 8],
    [2, 4, 6], // diagonals
];

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Nine cells in row-major order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [Option<Symbol>; BOARD_CELLS],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a board from explicit cells.
    pub fn from_cells(cells: [Option<Symbol>; BOARD_CELLS]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Option<Symbol>; BOARD_CELLS] {
        &self.cells
    }

    /// Returns the mark in `index`, or `None` for an empty or off-board
    /// cell.
    pub fn get(&self, index: usize) -> Option<Symbol> {
        self.cells.get(index).copied().flatten()
    }

    /// Returns `true` if `index` is on the board and unmarked.
    pub fn is_open(&self, index: usize) -> bool {
        matches!(self.cells.get(index), Some(None))
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Marks a cell.
    ///
    /// # Errors
    /// Returns [`SessionError::CellUnavailable`] if the cell is off the
    /// board or already marked.
    pub fn place(&mut self, index: usize, symbol: Symbol) -> Result<(), SessionError> {
        if !self.is_open(index) {
            return Err(SessionError::CellUnavailable(index));
        }
        self.cells[index] = Some(symbol);
        Ok(())
    }

    /// Computes the status implied by the marks on the board.
    pub fn status(&self) -> GameStatus {
        for line in WIN_LINES {
            if let Some(winner) = self.cells[line[0]] {
                if line.iter().all(|&i| self.cells[i] == Some(winner)) {
                    return GameStatus::Won { winner, line };
                }
            }
        }
        if self.is_full() {
            GameStatus::Draw
        } else {
            GameStatus::Playing
        }
    }
}

// ---------------------------------------------------------------------------
// GameStatus
// ---------------------------------------------------------------------------

/// Whether the match is still being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Playing,
    Won { winner: Symbol, line: [usize; 3] },
    Draw,
}

impl GameStatus {
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }
}

// ---------------------------------------------------------------------------
// GameMode
// ---------------------------------------------------------------------------

/// Who the local user is playing against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    /// Two players sharing one device.
    #[default]
    Local,
    /// Against the computer.
    Computer,
    /// Against a peer over a remote session.
    Remote,
}

// ---------------------------------------------------------------------------
// MatchState
// ---------------------------------------------------------------------------

/// One match: the board, whose turn it is, and the move counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    board: Board,
    current_turn: Symbol,
    status: GameStatus,
    next_move_number: u32,
    starting_symbol: Symbol,
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new(Symbol::X)
    }
}

impl MatchState {
    /// Starts an empty match in which `starting_symbol` moves first.
    pub fn new(starting_symbol: Symbol) -> Self {
        Self {
            board: Board::new(),
            current_turn: starting_symbol,
            status: GameStatus::Playing,
            next_move_number: 1,
            starting_symbol,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_turn(&self) -> Symbol {
        self.current_turn
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn starting_symbol(&self) -> Symbol {
        self.starting_symbol
    }

    /// The move number the next accepted move must carry. Starts at 1.
    pub fn next_move_number(&self) -> u32 {
        self.next_move_number
    }

    /// Applies a move by `symbol` and advances the turn and counter.
    ///
    /// # Errors
    /// - [`SessionError::MatchOver`] — the match has already ended
    /// - [`SessionError::NotYourTurn`] — `symbol` is not the current turn
    /// - [`SessionError::CellUnavailable`] — the cell is off the board or
    ///   taken
    pub fn apply_move(&mut self, index: usize, symbol: Symbol) -> Result<GameStatus, SessionError> {
        if !self.status.is_playing() {
            return Err(SessionError::MatchOver);
        }
        if symbol != self.current_turn {
            return Err(SessionError::NotYourTurn);
        }
        self.board.place(index, symbol)?;
        self.next_move_number += 1;
        self.status = self.board.status();
        if self.status.is_playing() {
            self.current_turn = symbol.opponent();
        }
        Ok(self.status)
    }
}
