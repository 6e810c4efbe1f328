use std::fmt;

use crate::{
    movegen,
    piece::{Color, PieceType},
    Board, Square,
};

pub const FIFTY_MOVE_HALFMOVES: u32 = 100;
pub const REPETITION_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawReason {
    FiftyMove,
    InsufficientMaterial,
    Repetition,
}

/// Outcome of a position. Always derived from a board via [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    Active,
    Checkmate { winner: Color },
    Stalemate,
    Draw(DrawReason),
}

impl GameStatus {
    pub fn is_over(&self) -> bool {
        !matches!(self, GameStatus::Active)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::Active => write!(f, "active"),
            GameStatus::Checkmate { winner } => write!(f, "checkmate, {} wins", winner),
            GameStatus::Stalemate => write!(f, "stalemate"),
            GameStatus::Draw(DrawReason::FiftyMove) => write!(f, "draw by fifty-move rule"),
            GameStatus::Draw(DrawReason::InsufficientMaterial) => write!(f, "draw by insufficient material"),
            GameStatus::Draw(DrawReason::Repetition) => write!(f, "draw by threefold repetition"),
        }
    }
}

pub fn classify(board: &Board) -> GameStatus {
    let mut scratch = board.clone();
    if movegen::legal_moves(&mut scratch).is_empty() {
        let to_move = board.side_to_move();
        return if movegen::in_check(board, to_move) {
            GameStatus::Checkmate { winner: to_move.opposite() }
        } else {
            GameStatus::Stalemate
        };
    }
    if board.halfmove_clock() >= FIFTY_MOVE_HALFMOVES {
        return GameStatus::Draw(DrawReason::FiftyMove);
    }
    if has_insufficient_material(board) {
        return GameStatus::Draw(DrawReason::InsufficientMaterial);
    }
    if board.repetition_count() >= REPETITION_LIMIT {
        return GameStatus::Draw(DrawReason::Repetition);
    }
    GameStatus::Active
}

/// King vs king, king and one minor piece vs king, or king and bishop vs
/// king and bishop with both bishops on the same square colour.
pub fn has_insufficient_material(board: &Board) -> bool {
    let mut white: Vec<(Square, PieceType)> = Vec::new();
    let mut black: Vec<(Square, PieceType)> = Vec::new();

    for (sq, piece) in board.pieces().filter(|(_, p)| p.piece_type != PieceType::King) {
        match piece.color {
            Color::White => white.push((sq, piece.piece_type)),
            Color::Black => black.push((sq, piece.piece_type)),
        }
    }

    match (white.as_slice(), black.as_slice()) {
        ([], []) => true,
        ([(_, p)], []) | ([], [(_, p)]) => p.is_minor(),
        ([(w, PieceType::Bishop)], [(b, PieceType::Bishop)]) => w.is_light() == b.is_light(),
        _ => false,
    }
}
