use log::trace;

use crate::{
    movegen,
    moves::MoveType,
    piece::{Color, PieceType},
    status::{self, GameStatus},
    zobrist::ZOBRIST,
    ChessError, Move, Piece, Square,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl Default for CastlingRights {
    fn default() -> Self {
        Self {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }
}

impl CastlingRights {
    pub fn none() -> Self {
        Self {
            white_kingside: false,
            white_queenside: false,
            black_kingside: false,
            black_queenside: false,
        }
    }

    pub fn kingside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside,
            Color::Black => self.black_kingside,
        }
    }

    pub fn queenside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queenside,
            Color::Black => self.black_queenside,
        }
    }

    fn revoke_color(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_kingside = false;
                self.white_queenside = false;
            }
            Color::Black => {
                self.black_kingside = false;
                self.black_queenside = false;
            }
        }
    }

    /// Drops the right tied to a rook home square, if `sq` is one. Called for
    /// both the origin and destination of every move so that a rook leaving
    /// home and a rook captured at home both lose the right.
    fn revoke_rook_square(&mut self, sq: Square) {
        match (sq.file, sq.rank) {
            (0, 0) => self.white_queenside = false,
            (7, 0) => self.white_kingside = false,
            (0, 7) => self.black_queenside = false,
            (7, 7) => self.black_kingside = false,
            _ => {}
        }
    }
}

/// Metadata kept for every played ply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRecord {
    pub mv: Move,
    pub piece: Piece,
    pub captured: Option<Piece>,
}

/// Everything `unmake_move` needs to restore the position a move was made from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoState {
    pub mv: Move,
    pub moved: Piece,
    pub captured: Option<(Piece, Square)>,
    pub prev_castling_rights: CastlingRights,
    pub prev_en_passant: Option<Square>,
    pub prev_halfmove_clock: u32,
    pub prev_fullmove_number: u32,
    pub prev_key: u64,
}

/// Result of a validated `Board::apply_move`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedMove {
    /// The legal move that was played, with its flags filled in.
    pub mv: Move,
    pub undo: UndoState,
    pub status: GameStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: [Option<Piece>; 64],
    side_to_move: Color,
    castling_rights: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
    history: Vec<MoveRecord>,
    key: u64,
    key_history: Vec<u64>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// The standard initial position.
    pub fn new() -> Self {
        let mut board = Self::empty();
        board.setup_initial_position();
        board
    }

    /// An empty board, White to move, no castling rights.
    pub fn empty() -> Self {
        let mut board = Self {
            squares: [None; 64],
            side_to_move: Color::White,
            castling_rights: CastlingRights::none(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            history: Vec::new(),
            key: 0,
            key_history: Vec::new(),
        };
        board.key = board.compute_key();
        board
    }

    fn setup_initial_position(&mut self) {
        let piece_order = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];

        for (file, &piece_type) in (0u8..8).zip(piece_order.iter()) {
            self.squares[Square { file, rank: 0 }.index()] = Some(Piece::new(piece_type, Color::White));
            self.squares[Square { file, rank: 1 }.index()] = Some(Piece::new(PieceType::Pawn, Color::White));
            self.squares[Square { file, rank: 6 }.index()] = Some(Piece::new(PieceType::Pawn, Color::Black));
            self.squares[Square { file, rank: 7 }.index()] = Some(Piece::new(piece_type, Color::Black));
        }
        self.castling_rights = CastlingRights::default();
        self.key = self.compute_key();
    }

    /// Assembles a position from its parts. Used by the FEN reader; the
    /// caller is responsible for the placement being sensible.
    pub(crate) fn from_parts(
        squares: [Option<Piece>; 64],
        side_to_move: Color,
        castling_rights: CastlingRights,
        en_passant: Option<Square>,
        halfmove_clock: u32,
        fullmove_number: u32,
    ) -> Self {
        let mut board = Self {
            squares,
            side_to_move,
            castling_rights,
            en_passant,
            halfmove_clock,
            fullmove_number,
            history: Vec::new(),
            key: 0,
            key_history: Vec::new(),
        };
        board.key = board.compute_key();
        board
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn last_move(&self) -> Option<Move> {
        self.history.last().map(|record| record.mv)
    }

    /// Zobrist key of the current position.
    pub fn key(&self) -> u64 {
        self.key
    }

    /// All occupied squares in a1..h8 order.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, p)| p.piece_type == PieceType::King && p.color == color)
            .map(|(sq, _)| sq)
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        movegen::in_check(self, color)
    }

    /// Legal moves for the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        movegen::legal_moves(&mut self.clone())
    }

    /// Legal moves of the piece on `sq`; empty unless it belongs to the side to move.
    pub fn legal_moves_from(&self, sq: Square) -> Vec<Move> {
        movegen::legal_moves_from(&mut self.clone(), sq)
    }

    pub fn status(&self) -> GameStatus {
        status::classify(self)
    }

    /// How many times the current position has occurred, counting positions
    /// reached since the last pawn move or capture.
    pub fn repetition_count(&self) -> usize {
        let window = (self.halfmove_clock as usize).min(self.key_history.len());
        let earlier = self.key_history[self.key_history.len() - window..]
            .iter()
            .filter(|&&key| key == self.key)
            .count();
        earlier + 1
    }

    /// Validates `mv` against the legal moves of this position, plays it and
    /// classifies the result. On error the position is untouched.
    pub fn apply_move(&mut self, mv: Move) -> Result<AppliedMove, ChessError> {
        let legal = movegen::find_legal(self, &mv).ok_or_else(|| ChessError::IllegalMove(mv.to_string()))?;
        let undo = self.make_move(legal);
        let status = status::classify(self);
        Ok(AppliedMove { mv: legal, undo, status })
    }

    /// Plays `mv` without validation. The move must come from the move
    /// generator for this position.
    ///
    /// # Panics
    ///
    /// Panics if there is no piece on `mv.from`.
    pub fn make_move(&mut self, mv: Move) -> UndoState {
        let prev_key = self.key;
        self.key ^= self.en_passant_key();
        let piece = self
            .take(mv.from)
            .expect("make_move called with an empty origin square");

        let mut undo = UndoState {
            mv,
            moved: piece,
            captured: None,
            prev_castling_rights: self.castling_rights,
            prev_en_passant: self.en_passant,
            prev_halfmove_clock: self.halfmove_clock,
            prev_fullmove_number: self.fullmove_number,
            prev_key,
        };

        // En passant takes the pawn beside the origin, not the one on the destination.
        let capture_square = if mv.move_type == MoveType::EnPassant {
            Square { file: mv.to.file, rank: mv.from.rank }
        } else {
            mv.to
        };
        if let Some(captured) = self.take(capture_square) {
            undo.captured = Some((captured, capture_square));
        }

        let placed = match mv.promotion {
            Some(promotion) => Piece::new(promotion, piece.color),
            None => piece,
        };
        self.put(mv.to, placed);

        if let Some((rook_from, rook_to)) = castle_rook_squares(mv) {
            if let Some(rook) = self.take(rook_from) {
                self.put(rook_to, rook);
            }
        }

        self.key ^= ZOBRIST.castling(self.castling_rights);
        if piece.piece_type == PieceType::King {
            self.castling_rights.revoke_color(piece.color);
        }
        self.castling_rights.revoke_rook_square(mv.from);
        self.castling_rights.revoke_rook_square(mv.to);
        self.key ^= ZOBRIST.castling(self.castling_rights);

        self.en_passant = if piece.piece_type == PieceType::Pawn && mv.from.rank.abs_diff(mv.to.rank) == 2 {
            Some(Square { file: mv.from.file, rank: (mv.from.rank + mv.to.rank) / 2 })
        } else {
            None
        };

        if piece.piece_type == PieceType::Pawn || undo.captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if self.side_to_move == Color::Black {
            self.fullmove_number += 1;
        }

        self.history.push(MoveRecord {
            mv,
            piece,
            captured: undo.captured.map(|(p, _)| p),
        });
        self.key_history.push(undo.prev_key);

        self.key ^= ZOBRIST.side(self.side_to_move);
        self.side_to_move = self.side_to_move.opposite();
        self.key ^= ZOBRIST.side(self.side_to_move);
        self.key ^= self.en_passant_key();

        trace!("make {} -> key {:016x}", mv, self.key);
        undo
    }

    /// Reverts the move `undo` was produced by. Must be called in LIFO order.
    pub fn unmake_move(&mut self, undo: UndoState) {
        let mv = undo.mv;
        self.side_to_move = self.side_to_move.opposite();
        self.history.pop();
        self.key_history.pop();

        if let Some((rook_from, rook_to)) = castle_rook_squares(mv) {
            if let Some(rook) = self.take(rook_to) {
                self.put(rook_from, rook);
            }
        }
        self.take(mv.to);
        self.put(mv.from, undo.moved);
        if let Some((captured, sq)) = undo.captured {
            self.put(sq, captured);
        }

        self.castling_rights = undo.prev_castling_rights;
        self.en_passant = undo.prev_en_passant;
        self.halfmove_clock = undo.prev_halfmove_clock;
        self.fullmove_number = undo.prev_fullmove_number;
        self.key = undo.prev_key;
    }

    fn take(&mut self, sq: Square) -> Option<Piece> {
        let piece = self.squares[sq.index()].take();
        if let Some(p) = piece {
            self.key ^= ZOBRIST.piece(p, sq);
        }
        piece
    }

    fn put(&mut self, sq: Square, piece: Piece) {
        if let Some(old) = self.squares[sq.index()].replace(piece) {
            self.key ^= ZOBRIST.piece(old, sq);
        }
        self.key ^= ZOBRIST.piece(piece, sq);
    }

    fn compute_key(&self) -> u64 {
        let mut key = self.pieces().fold(0, |acc, (sq, p)| acc ^ ZOBRIST.piece(p, sq));
        key ^= ZOBRIST.castling(self.castling_rights);
        key ^= self.en_passant_key();
        key ^= ZOBRIST.side(self.side_to_move);
        key
    }

    /// The en-passant file only counts towards the key while a pawn of the
    /// side to move stands ready to capture.
    fn en_passant_key(&self) -> u64 {
        let Some(target) = self.en_passant else {
            return 0;
        };
        let mover = self.side_to_move;
        let capturer = Piece::new(PieceType::Pawn, mover);
        let can_capture = [-1, 1].into_iter().any(|df| {
            target
                .offset(df, -mover.forward())
                .map_or(false, |sq| self.piece_at(sq) == Some(capturer))
        });
        if can_capture {
            ZOBRIST.en_passant(Some(target))
        } else {
            0
        }
    }
}

/// Rook origin and destination for a castling move.
fn castle_rook_squares(mv: Move) -> Option<(Square, Square)> {
    let rank = mv.from.rank;
    match mv.move_type {
        MoveType::CastleKingside => Some((Square { file: 7, rank }, Square { file: 5, rank })),
        MoveType::CastleQueenside => Some((Square { file: 0, rank }, Square { file: 3, rank })),
        _ => None,
    }
}
