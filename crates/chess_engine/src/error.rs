use std::time::Duration;

use chess_core::{ChessError, Color, GameStatus};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("engine {engine} proposed illegal move {mv}")]
    IllegalEngineMove { engine: String, mv: String },
    #[error("engine {engine} produced no move")]
    NoMove { engine: String },
    #[error("engine {engine} gave no answer within {after:?}")]
    Timeout { engine: String, after: Duration },
    #[error("engine {engine} failed: {reason}")]
    Failed { engine: String, reason: String },
    #[error("result arrived for a game state that no longer exists")]
    StaleResult,
    #[error("move request was cancelled")]
    Cancelled,
    #[error("no engine registered as {0:?}")]
    UnknownEngine(String),
    #[error("asked to move for {requested} but {to_move} is to move")]
    WrongSide { requested: Color, to_move: Color },
    #[error("game is already over: {0}")]
    GameOver(GameStatus),
    #[error(transparent)]
    Core(#[from] ChessError),
}
