use chess_core::{Board, Color, Move};
use chess_engine::search::{select_move, select_move_unpruned, MATE_SCORE};

const POSITIONS: [&str; 4] = [
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
    "r1bq1rk1/ppp2ppp/2np1n2/2b1p3/2B1P3/2NP1N2/PPP2PPP/R1BQ1RK1 b - - 0 7",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
];

fn uci(mv: Option<Move>) -> Option<String> {
    mv.map(|m| m.to_uci())
}

#[test]
fn test_search_is_deterministic() {
    for fen in POSITIONS {
        let board = Board::from_fen(fen).unwrap();
        let color = board.side_to_move();
        let first = select_move(&board, color, 3);
        let second = select_move(&board, color, 3);
        assert_eq!(first, second, "{}", fen);
    }
}

#[test]
fn test_search_leaves_input_untouched() {
    let board = Board::from_fen(POSITIONS[1]).unwrap();
    let before = board.clone();
    select_move(&board, Color::White, 3);
    assert_eq!(board, before);
}

#[test]
fn test_alpha_beta_matches_plain_minimax() {
    for fen in POSITIONS {
        let board = Board::from_fen(fen).unwrap();
        let color = board.side_to_move();
        for depth in 1..=3 {
            let pruned = select_move(&board, color, depth);
            let plain = select_move_unpruned(&board, color, depth);
            assert_eq!(pruned.best_move, plain.best_move, "{} depth {}", fen, depth);
            assert_eq!(pruned.score, plain.score, "{} depth {}", fen, depth);
            assert!(pruned.nodes <= plain.nodes);
        }
    }
}

#[test]
fn test_finds_back_rank_mate() {
    let board = Board::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
    for depth in 1..=3 {
        let result = select_move(&board, Color::White, depth);
        assert_eq!(uci(result.best_move).as_deref(), Some("a1a8"));
        assert_eq!(result.score, MATE_SCORE);
    }
}

#[test]
fn test_black_mates_with_negative_score() {
    let board = Board::from_fen("r5k1/8/8/8/8/8/5PPP/6K1 b - - 0 1").unwrap();
    let result = select_move(&board, Color::Black, 2);
    assert_eq!(uci(result.best_move).as_deref(), Some("a8a1"));
    assert_eq!(result.score, -MATE_SCORE);
}

#[test]
fn test_takes_hanging_queen() {
    let board = Board::from_fen("4k3/8/8/3q4/8/8/3R4/4K3 w - - 0 1").unwrap();
    let result = select_move(&board, Color::White, 2);
    assert_eq!(uci(result.best_move).as_deref(), Some("d2d5"));
    assert!(result.score > 0);
}
