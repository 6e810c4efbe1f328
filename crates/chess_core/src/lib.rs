// Core chess game logic modules
pub mod board;
pub mod error;
pub mod fen;
pub mod game;
pub mod movegen;
pub mod moves;
pub mod piece;
pub mod square;
pub mod status;
pub mod zobrist;

// Re-export main types for convenience
pub use board::{AppliedMove, Board, CastlingRights, MoveRecord, UndoState};
pub use error::ChessError;
pub use game::{ContextToken, Game};
pub use moves::{Move, MoveType};
pub use piece::{Color, Piece, PieceType};
pub use square::Square;
pub use status::{classify, DrawReason, GameStatus};
