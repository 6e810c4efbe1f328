use thiserror::Error;

use crate::status::GameStatus;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChessError {
    #[error("invalid square: {0:?}")]
    InvalidSquare(String),
    #[error("invalid move notation: {0:?}")]
    InvalidMoveNotation(String),
    #[error("invalid FEN: {0}")]
    InvalidFen(String),
    #[error("illegal move: {0}")]
    IllegalMove(String),
    #[error("game is already over: {0}")]
    GameOver(GameStatus),
    #[error("no move to take back")]
    NothingToUndo,
}
