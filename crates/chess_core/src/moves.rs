use std::fmt;
use std::str::FromStr;

use crate::{piece::PieceType, ChessError, Square};

/// A move from one square to another.
///
/// `move_type` carries the flags the generator attaches. A move parsed from
/// coordinate notation starts out as `Normal` and only gets its real flags
/// once it is matched against the legal moves of a concrete position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub move_type: MoveType,
    pub promotion: Option<PieceType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveType {
    Normal,
    Capture,
    EnPassant,
    CastleKingside,
    CastleQueenside,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
            move_type: MoveType::Normal,
        }
    }

    pub fn with_type(from: Square, to: Square, move_type: MoveType) -> Self {
        Self {
            from,
            to,
            promotion: None,
            move_type,
        }
    }

    pub fn with_promotion(from: Square, to: Square, move_type: MoveType, promotion: PieceType) -> Self {
        Self {
            from,
            to,
            promotion: Some(promotion),
            move_type,
        }
    }

    pub fn is_capture(&self) -> bool {
        matches!(self.move_type, MoveType::Capture | MoveType::EnPassant)
    }

    pub fn is_castle(&self) -> bool {
        matches!(self.move_type, MoveType::CastleKingside | MoveType::CastleQueenside)
    }

    /// Same origin, destination and promotion, ignoring flags.
    pub fn same_squares(&self, other: &Move) -> bool {
        self.from == other.from && self.to == other.to && self.promotion == other.promotion
    }

    pub fn to_uci(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.to_char())?;
        }
        Ok(())
    }
}

impl FromStr for Move {
    type Err = ChessError;

    /// Parses `<from><to>[promotion]`, e.g. `e2e4` or `e7e8q`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.is_ascii() || !(s.len() == 4 || s.len() == 5) {
            return Err(ChessError::InvalidMoveNotation(s.to_string()));
        }
        let from = Square::from_algebraic(&s[0..2])?;
        let to = Square::from_algebraic(&s[2..4])?;
        let promotion = match s[4..].chars().next() {
            None => None,
            Some(c) => match PieceType::from_char(c) {
                Some(p) if PieceType::PROMOTIONS.contains(&p) && c.is_ascii_lowercase() => Some(p),
                _ => return Err(ChessError::InvalidMoveNotation(s.to_string())),
            },
        };
        Ok(Move {
            from,
            to,
            move_type: MoveType::Normal,
            promotion,
        })
    }
}
