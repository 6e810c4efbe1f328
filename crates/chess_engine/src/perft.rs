//! Move generation node counts, for checking the generator against known
//! results.

use chess_core::{movegen, Board, Move};
use rayon::prelude::*;

/// Number of leaf nodes `depth` plies below `board`.
pub fn perft(board: &mut Board, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = movegen::legal_moves(board);
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut nodes = 0;
    for mv in moves {
        let undo = board.make_move(mv);
        nodes += perft(board, depth - 1);
        board.unmake_move(undo);
    }
    nodes
}

/// Leaf counts per root move, each root subtree counted on its own thread
/// with its own copy of the board. Results keep generation order.
pub fn perft_divide(board: &Board, depth: u8) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }
    let moves = board.legal_moves();
    moves
        .into_par_iter()
        .map(|mv| {
            let mut child = board.clone();
            child.make_move(mv);
            (mv, perft(&mut child, depth - 1))
        })
        .collect()
}

/// Parallel total over [`perft_divide`].
pub fn perft_parallel(board: &Board, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }
    perft_divide(board, depth).iter().map(|(_, nodes)| nodes).sum()
}
