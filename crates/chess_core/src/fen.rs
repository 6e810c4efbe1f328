//! Forsyth-Edwards Notation import and export.

use crate::{board::CastlingRights, piece::Color, piece::PieceType, Board, ChessError, Piece, Square};

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Board {
    /// Parses a FEN string. The halfmove and fullmove fields may be omitted
    /// and default to `0` and `1`.
    pub fn from_fen(fen: &str) -> Result<Board, ChessError> {
        let sections: Vec<&str> = fen.split_whitespace().collect();
        if !(4..=6).contains(&sections.len()) {
            return Err(ChessError::InvalidFen(format!(
                "expected 4 to 6 whitespace delimited sections, found {}",
                sections.len()
            )));
        }

        let squares = parse_placement(sections[0])?;

        let side_to_move = match sections[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(ChessError::InvalidFen(format!("bad side to move {:?}", other))),
        };

        let castling_rights = parse_castling(sections[2], &squares)?;

        let en_passant = match sections[3] {
            "-" => None,
            s => {
                let sq = Square::from_algebraic(s).map_err(|_| ChessError::InvalidFen(format!("bad en passant square {:?}", s)))?;
                let expected_rank = match side_to_move {
                    Color::White => 5,
                    Color::Black => 2,
                };
                if sq.rank != expected_rank {
                    return Err(ChessError::InvalidFen(format!("en passant square {} on wrong rank", sq)));
                }
                Some(sq)
            }
        };

        let halfmove_clock = parse_counter(sections.get(4).copied(), 0)?;
        let fullmove_number = parse_counter(sections.get(5).copied(), 1)?.max(1);

        Ok(Board::from_parts(
            squares,
            side_to_move,
            castling_rights,
            en_passant,
            halfmove_clock,
            fullmove_number,
        ))
    }

    pub fn to_fen(&self) -> String {
        let mut placement = String::with_capacity(72);
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match self.piece_at(Square { file, rank }) {
                    Some(piece) => {
                        if empty > 0 {
                            placement.push(char::from(b'0' + empty));
                            empty = 0;
                        }
                        placement.push(piece.to_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                placement.push(char::from(b'0' + empty));
            }
            if rank > 0 {
                placement.push('/');
            }
        }

        let side = match self.side_to_move() {
            Color::White => "w",
            Color::Black => "b",
        };

        let rights = self.castling_rights();
        let mut castling: String = [
            (rights.white_kingside, 'K'),
            (rights.white_queenside, 'Q'),
            (rights.black_kingside, 'k'),
            (rights.black_queenside, 'q'),
        ]
        .iter()
        .filter(|(set, _)| *set)
        .map(|(_, c)| *c)
        .collect();
        if castling.is_empty() {
            castling.push('-');
        }

        let en_passant = self.en_passant().map_or_else(|| "-".to_string(), |sq| sq.to_string());

        format!(
            "{} {} {} {} {} {}",
            placement,
            side,
            castling,
            en_passant,
            self.halfmove_clock(),
            self.fullmove_number()
        )
    }
}

fn parse_placement(section: &str) -> Result<[Option<Piece>; 64], ChessError> {
    let mut squares = [None; 64];
    let ranks: Vec<&str> = section.split('/').collect();
    if ranks.len() != 8 {
        return Err(ChessError::InvalidFen(format!("expected 8 ranks, found {}", ranks.len())));
    }

    for (i, row) in ranks.iter().enumerate() {
        let rank = 7 - i as u8;
        let mut file = 0u8;
        for c in row.chars() {
            if let Some(skip) = c.to_digit(10) {
                if !(1..=8).contains(&skip) {
                    return Err(ChessError::InvalidFen(format!("bad empty-square count {:?}", c)));
                }
                file += skip as u8;
            } else {
                let piece = Piece::from_char(c).ok_or_else(|| ChessError::InvalidFen(format!("unknown piece {:?}", c)))?;
                let sq = Square::new(file, rank).ok_or_else(|| ChessError::InvalidFen(format!("rank {} overflows", rank + 1)))?;
                if piece.piece_type == PieceType::Pawn && (rank == 0 || rank == 7) {
                    return Err(ChessError::InvalidFen(format!("pawn on back rank at {}", sq)));
                }
                squares[sq.index()] = Some(piece);
                file += 1;
            }
            if file > 8 {
                return Err(ChessError::InvalidFen(format!("rank {} overflows", rank + 1)));
            }
        }
        if file != 8 {
            return Err(ChessError::InvalidFen(format!("rank {} has {} squares", rank + 1, file)));
        }
    }

    for color in [Color::White, Color::Black] {
        let kings = squares
            .iter()
            .filter(|p| **p == Some(Piece::new(PieceType::King, color)))
            .count();
        if kings != 1 {
            return Err(ChessError::InvalidFen(format!("{} has {} kings", color, kings)));
        }
    }

    Ok(squares)
}

fn parse_castling(section: &str, squares: &[Option<Piece>; 64]) -> Result<CastlingRights, ChessError> {
    let mut rights = CastlingRights::none();
    if section == "-" {
        return Ok(rights);
    }
    for c in section.chars() {
        let (color, rook_file) = match c {
            'K' => (Color::White, 7),
            'Q' => (Color::White, 0),
            'k' => (Color::Black, 7),
            'q' => (Color::Black, 0),
            _ => return Err(ChessError::InvalidFen(format!("bad castling flag {:?}", c))),
        };
        let rank = color.back_rank();
        let king_home = squares[Square { file: 4, rank }.index()] == Some(Piece::new(PieceType::King, color));
        let rook_home = squares[Square { file: rook_file, rank }.index()] == Some(Piece::new(PieceType::Rook, color));
        if !king_home || !rook_home {
            return Err(ChessError::InvalidFen(format!("castling flag {:?} without king and rook at home", c)));
        }
        match c {
            'K' => rights.white_kingside = true,
            'Q' => rights.white_queenside = true,
            'k' => rights.black_kingside = true,
            _ => rights.black_queenside = true,
        }
    }
    Ok(rights)
}

fn parse_counter(section: Option<&str>, default: u32) -> Result<u32, ChessError> {
    match section {
        None => Ok(default),
        Some(s) => s
            .parse()
            .map_err(|_| ChessError::InvalidFen(format!("bad move counter {:?}", s))),
    }
}
