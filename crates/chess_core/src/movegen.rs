//! Pseudo-legal and legal move generation plus attack detection.
//!
//! Moves are produced by scanning squares a1..h8 and, per piece, walking its
//! pattern in a fixed order, so the output order for a position never changes.

use crate::{
    moves::MoveType,
    piece::{Color, PieceType},
    Board, Move, Piece, Square,
};

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

/// Legal moves for the side to move. The board is used as scratch space for
/// make/unmake and is returned in its original state.
pub fn legal_moves(board: &mut Board) -> Vec<Move> {
    let color = board.side_to_move();
    let mut moves = Vec::with_capacity(48);
    for (sq, piece) in board.pieces().filter(|(_, p)| p.color == color) {
        piece_moves(board, sq, piece, &mut moves);
    }
    retain_legal(board, moves)
}

/// Whether the side to move has any legal move. Stops at the first one found.
pub fn has_legal_move(board: &mut Board) -> bool {
    let color = board.side_to_move();
    let own: Vec<(Square, Piece)> = board.pieces().filter(|(_, p)| p.color == color).collect();
    own.into_iter().any(|(sq, piece)| {
        let mut moves = Vec::new();
        piece_moves(board, sq, piece, &mut moves);
        !retain_legal(board, moves).is_empty()
    })
}

/// Legal moves of the piece on `sq`. Empty if the square is empty or holds a
/// piece of the side not to move.
pub fn legal_moves_from(board: &mut Board, sq: Square) -> Vec<Move> {
    let mut moves = Vec::new();
    if let Some(piece) = board.piece_at(sq) {
        if piece.color == board.side_to_move() {
            piece_moves(board, sq, piece, &mut moves);
        }
    }
    retain_legal(board, moves)
}

/// Matches a possibly flag-less move (e.g. parsed from `e7e8`) against the
/// legal moves of `board` and returns the generated move with its flags.
/// A missing promotion piece on a promoting move defaults to a queen.
pub fn find_legal(board: &Board, mv: &Move) -> Option<Move> {
    let candidates = board.legal_moves_from(mv.from);
    let wanted = Move {
        promotion: mv.promotion.or_else(|| {
            candidates
                .iter()
                .any(|c| c.to == mv.to && c.promotion.is_some())
                .then_some(PieceType::Queen)
        }),
        ..*mv
    };
    candidates.into_iter().find(|c| c.same_squares(&wanted))
}

pub fn is_legal(board: &Board, mv: &Move) -> bool {
    find_legal(board, mv).is_some()
}

fn retain_legal(board: &mut Board, mut moves: Vec<Move>) -> Vec<Move> {
    let mover = board.side_to_move();
    moves.retain(|&mv| {
        let undo = board.make_move(mv);
        let safe = !in_check(board, mover);
        board.unmake_move(undo);
        safe
    });
    moves
}

/// True if `color`'s king is attacked. A board without that king is never in check.
pub fn in_check(board: &Board, color: Color) -> bool {
    board
        .king_square(color)
        .map_or(false, |king| is_square_attacked(board, king, color.opposite()))
}

/// True if any piece of `by` attacks `sq`. Kings attack their eight
/// neighbours only; castling never counts as an attack.
pub fn is_square_attacked(board: &Board, sq: Square, by: Color) -> bool {
    let holds = |target: Option<Square>, types: &[PieceType]| {
        target
            .and_then(|t| board.piece_at(t))
            .map_or(false, |p| p.color == by && types.contains(&p.piece_type))
    };

    // A pawn of `by` attacks diagonally forward, so look one rank behind `sq` from its side.
    let back = -by.forward();
    if holds(sq.offset(-1, back), &[PieceType::Pawn]) || holds(sq.offset(1, back), &[PieceType::Pawn]) {
        return true;
    }
    if KNIGHT_OFFSETS
        .iter()
        .any(|&(df, dr)| holds(sq.offset(df, dr), &[PieceType::Knight]))
    {
        return true;
    }
    if KING_OFFSETS
        .iter()
        .any(|&(df, dr)| holds(sq.offset(df, dr), &[PieceType::King]))
    {
        return true;
    }
    ray_hits(board, sq, &ROOK_DIRECTIONS, by, &[PieceType::Rook, PieceType::Queen])
        || ray_hits(board, sq, &BISHOP_DIRECTIONS, by, &[PieceType::Bishop, PieceType::Queen])
}

fn ray_hits(board: &Board, sq: Square, directions: &[(i8, i8)], by: Color, types: &[PieceType]) -> bool {
    directions.iter().any(|&(df, dr)| {
        let mut current = sq;
        while let Some(next) = current.offset(df, dr) {
            if let Some(piece) = board.piece_at(next) {
                return piece.color == by && types.contains(&piece.piece_type);
            }
            current = next;
        }
        false
    })
}

/// Pseudo-legal moves of `piece` standing on `sq`.
fn piece_moves(board: &Board, sq: Square, piece: Piece, out: &mut Vec<Move>) {
    match piece.piece_type {
        PieceType::Pawn => pawn_moves(board, sq, piece.color, out),
        PieceType::Knight => step_moves(board, sq, piece.color, &KNIGHT_OFFSETS, out),
        PieceType::Bishop => slide_moves(board, sq, piece.color, &BISHOP_DIRECTIONS, out),
        PieceType::Rook => slide_moves(board, sq, piece.color, &ROOK_DIRECTIONS, out),
        PieceType::Queen => {
            slide_moves(board, sq, piece.color, &ROOK_DIRECTIONS, out);
            slide_moves(board, sq, piece.color, &BISHOP_DIRECTIONS, out);
        }
        PieceType::King => {
            step_moves(board, sq, piece.color, &KING_OFFSETS, out);
            castle_moves(board, sq, piece.color, out);
        }
    }
}

fn push_pawn_move(from: Square, to: Square, move_type: MoveType, color: Color, out: &mut Vec<Move>) {
    if to.rank == color.opposite().back_rank() {
        for promotion in PieceType::PROMOTIONS {
            out.push(Move::with_promotion(from, to, move_type, promotion));
        }
    } else {
        out.push(Move::with_type(from, to, move_type));
    }
}

fn pawn_moves(board: &Board, sq: Square, color: Color, out: &mut Vec<Move>) {
    let forward = color.forward();
    let start_rank = match color {
        Color::White => 1,
        Color::Black => 6,
    };

    if let Some(one) = sq.offset(0, forward).filter(|&t| board.piece_at(t).is_none()) {
        push_pawn_move(sq, one, MoveType::Normal, color, out);
        if sq.rank == start_rank {
            if let Some(two) = one.offset(0, forward).filter(|&t| board.piece_at(t).is_none()) {
                out.push(Move::new(sq, two));
            }
        }
    }

    for df in [-1, 1] {
        let Some(target) = sq.offset(df, forward) else {
            continue;
        };
        match board.piece_at(target) {
            Some(victim) if victim.color != color => push_pawn_move(sq, target, MoveType::Capture, color, out),
            None if board.en_passant() == Some(target) => {
                out.push(Move::with_type(sq, target, MoveType::EnPassant));
            }
            _ => {}
        }
    }
}

fn step_moves(board: &Board, sq: Square, color: Color, offsets: &[(i8, i8)], out: &mut Vec<Move>) {
    for &(df, dr) in offsets {
        let Some(target) = sq.offset(df, dr) else {
            continue;
        };
        match board.piece_at(target) {
            None => out.push(Move::new(sq, target)),
            Some(p) if p.color != color => out.push(Move::with_type(sq, target, MoveType::Capture)),
            Some(_) => {}
        }
    }
}

fn slide_moves(board: &Board, sq: Square, color: Color, directions: &[(i8, i8)], out: &mut Vec<Move>) {
    for &(df, dr) in directions {
        let mut current = sq;
        while let Some(target) = current.offset(df, dr) {
            match board.piece_at(target) {
                None => out.push(Move::new(sq, target)),
                Some(p) => {
                    if p.color != color {
                        out.push(Move::with_type(sq, target, MoveType::Capture));
                    }
                    break;
                }
            }
            current = target;
        }
    }
}

/// Castling requires the right (king and rook never moved), the rook still at
/// home, empty squares in between, and the king's origin and transit squares
/// unattacked. Safety of the destination is left to the legality filter.
fn castle_moves(board: &Board, sq: Square, color: Color, out: &mut Vec<Move>) {
    let rank = color.back_rank();
    if sq != (Square { file: 4, rank }) {
        return;
    }
    let rights = board.castling_rights();
    if !rights.kingside(color) && !rights.queenside(color) {
        return;
    }
    let enemy = color.opposite();
    if is_square_attacked(board, sq, enemy) {
        return;
    }
    let rook = Some(Piece::new(PieceType::Rook, color));
    let empty = |files: &[u8]| files.iter().all(|&file| board.piece_at(Square { file, rank }).is_none());
    let safe = |file: u8| !is_square_attacked(board, Square { file, rank }, enemy);

    if rights.kingside(color) && board.piece_at(Square { file: 7, rank }) == rook && empty(&[5, 6]) && safe(5) {
        out.push(Move::with_type(sq, Square { file: 6, rank }, MoveType::CastleKingside));
    }
    if rights.queenside(color) && board.piece_at(Square { file: 0, rank }) == rook && empty(&[1, 2, 3]) && safe(3) {
        out.push(Move::with_type(sq, Square { file: 2, rank }, MoveType::CastleQueenside));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(fen: &str) -> Board {
        Board::from_fen(fen).unwrap()
    }

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn has_legal_move_agrees_with_generation() {
        for fen in [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "8/8/8/8/8/kq6/8/K7 w - - 0 1",
            "3R2k1/5ppp/8/8/8/8/8/6K1 b - - 0 1",
            "7k/8/6QK/8/8/8/8/8 b - - 0 1",
        ] {
            let mut b = board(fen);
            let expected = !legal_moves(&mut b).is_empty();
            assert_eq!(has_legal_move(&mut b), expected, "{}", fen);
            assert_eq!(b, board(fen));
        }
    }

    #[test]
    fn twenty_opening_moves() {
        let moves = Board::new().legal_moves();
        assert_eq!(moves.len(), 20);
        let pawn_moves = moves.iter().filter(|m| m.from.rank == 1).count();
        assert_eq!(pawn_moves, 16);
    }

    #[test]
    fn generation_order_is_stable() {
        let board = Board::new();
        assert_eq!(board.legal_moves(), board.legal_moves());
        assert_eq!(board.legal_moves()[0].to_string(), "b1c3");
    }

    #[test]
    fn lone_king_moves() {
        let b = board("8/5k2/8/8/2K5/8/8/8 w - - 0 1");
        assert_eq!(b.legal_moves().len(), 8);
    }

    #[test]
    fn pinned_piece_cannot_move() {
        // The e2 knight is pinned against the king by the e8 rook.
        let b = board("4r2k/8/8/8/8/8/4N3/4K3 w - - 0 1");
        assert!(b.legal_moves_from(sq("e2")).is_empty());
    }

    #[test]
    fn promotion_generates_four_pieces_queen_first() {
        let b = board("7k/P7/8/8/8/8/8/K7 w - - 0 1");
        let moves = b.legal_moves_from(sq("a7"));
        let promotions: Vec<_> = moves.iter().map(|m| m.promotion).collect();
        assert_eq!(
            promotions,
            vec![
                Some(PieceType::Queen),
                Some(PieceType::Rook),
                Some(PieceType::Bishop),
                Some(PieceType::Knight)
            ]
        );
    }

    #[test]
    fn missing_promotion_defaults_to_queen() {
        let b = board("7k/P7/8/8/8/8/8/K7 w - - 0 1");
        let found = find_legal(&b, &"a7a8".parse().unwrap()).unwrap();
        assert_eq!(found.promotion, Some(PieceType::Queen));
    }

    #[test]
    fn castling_blocked_through_attacked_square() {
        // Black bishop on a6 covers f1.
        let b = board("r3k2r/8/b7/8/8/8/8/R3K2R w KQkq - 0 1");
        let king_moves = b.legal_moves_from(sq("e1"));
        assert!(!king_moves.iter().any(|m| m.move_type == MoveType::CastleKingside));
        assert!(king_moves.iter().any(|m| m.move_type == MoveType::CastleQueenside));
    }

    #[test]
    fn no_castling_out_of_check() {
        let b = board("r3k2r/8/8/8/8/8/4r3/R3K2R w KQkq - 0 1");
        assert!(!b.legal_moves().iter().any(|m| m.is_castle()));
    }

    #[test]
    fn queenside_castle_allowed_with_b_file_attacked() {
        // Only the king's path matters; b1 may be attacked.
        let b = board("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1");
        assert!(b.legal_moves().iter().any(|m| m.move_type == MoveType::CastleQueenside));
    }

    #[test]
    fn en_passant_only_on_target() {
        let mut b = Board::new();
        for uci in ["e2e4", "a7a6", "e4e5", "d7d5"] {
            b.apply_move(uci.parse().unwrap()).unwrap();
        }
        let ep = b.legal_moves_from(sq("e5"));
        assert!(ep.iter().any(|m| m.move_type == MoveType::EnPassant && m.to == sq("d6")));
        b.apply_move("g1f3".parse().unwrap()).unwrap();
        b.apply_move("a6a5".parse().unwrap()).unwrap();
        assert!(!b.legal_moves().iter().any(|m| m.move_type == MoveType::EnPassant));
    }

    #[test]
    fn attack_detection() {
        let b = Board::new();
        assert!(is_square_attacked(&b, sq("f3"), Color::White));
        assert!(!is_square_attacked(&b, sq("e4"), Color::White));
        assert!(is_square_attacked(&b, sq("f6"), Color::Black));
        assert!(!in_check(&b, Color::White));
    }
}
