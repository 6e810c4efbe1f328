use std::cell::Cell;
use std::rc::Rc;

use log::info;

use crate::{
    board::UndoState,
    status::{self, GameStatus},
    Board, ChessError, Move, Square,
};

/// Identifies the game state a computation was started from.
///
/// Tokens go stale once the game they came from changes: a move is applied or
/// taken back, the game is reset, or it is explicitly invalidated.
#[derive(Debug, Clone)]
pub struct ContextToken {
    epoch: Rc<Cell<u64>>,
    issued: u64,
}

impl ContextToken {
    pub fn is_current(&self) -> bool {
        self.epoch.get() == self.issued
    }
}

/// A position together with its classified status. Every move that reaches a
/// game goes through [`Game::apply_move`], whatever its origin.
#[derive(Debug)]
pub struct Game {
    board: Board,
    status: GameStatus,
    undo_stack: Vec<UndoState>,
    epoch: Rc<Cell<u64>>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    pub fn new() -> Self {
        Self::from_board(Board::new())
    }

    pub fn from_board(board: Board) -> Self {
        let status = status::classify(&board);
        Self {
            board,
            status,
            undo_stack: Vec::new(),
            epoch: Rc::new(Cell::new(0)),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        Board::from_fen(fen).map(Self::from_board)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        if self.status.is_over() {
            return Vec::new();
        }
        self.board.legal_moves()
    }

    /// Legal moves from an algebraic square such as `"e2"`.
    pub fn legal_moves_from(&self, square: &str) -> Result<Vec<Move>, ChessError> {
        let sq = Square::from_algebraic(square)?;
        if self.status.is_over() {
            return Ok(Vec::new());
        }
        Ok(self.board.legal_moves_from(sq))
    }

    pub fn context_token(&self) -> ContextToken {
        ContextToken {
            epoch: Rc::clone(&self.epoch),
            issued: self.epoch.get(),
        }
    }

    /// Marks every outstanding [`ContextToken`] stale.
    pub fn invalidate(&mut self) {
        self.epoch.set(self.epoch.get() + 1);
    }

    /// Validates and plays `mv`, returning the refreshed status. Nothing
    /// changes if the move is rejected.
    pub fn apply_move(&mut self, mv: Move) -> Result<GameStatus, ChessError> {
        if self.status.is_over() {
            return Err(ChessError::GameOver(self.status));
        }
        let applied = self.board.apply_move(mv)?;
        self.undo_stack.push(applied.undo);
        self.status = applied.status;
        self.invalidate();
        info!("{} played {} -> {}", applied.undo.moved.color, applied.mv, self.status);
        Ok(self.status)
    }

    /// Parses a coordinate move such as `"e7e8q"` and applies it.
    pub fn apply_uci(&mut self, uci: &str) -> Result<GameStatus, ChessError> {
        self.apply_move(uci.parse()?)
    }

    /// Takes back the last ply.
    pub fn undo(&mut self) -> Result<Move, ChessError> {
        let undo = self.undo_stack.pop().ok_or(ChessError::NothingToUndo)?;
        self.board.unmake_move(undo);
        self.status = status::classify(&self.board);
        self.invalidate();
        Ok(undo.mv)
    }

    /// Starts over from the standard position.
    pub fn reset(&mut self) {
        self.board = Board::new();
        self.status = GameStatus::Active;
        self.undo_stack.clear();
        self.invalidate();
    }
}
