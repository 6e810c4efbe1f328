use chess_core::{
    classify, movegen, Board, Color, DrawReason, Game, GameStatus, Move, MoveType, PieceType, Square,
};

fn sq(s: &str) -> Square {
    Square::from_algebraic(s).unwrap()
}

fn play_all(game: &mut Game, moves: &str) -> GameStatus {
    let mut status = game.status();
    for uci in moves.split_whitespace() {
        status = game.apply_uci(uci).unwrap();
    }
    status
}

#[test]
fn fools_mate_is_checkmate() {
    let mut game = Game::new();
    let status = play_all(&mut game, "f2f3 e7e5 g2g4 d8h4");
    assert_eq!(status, GameStatus::Checkmate { winner: Color::Black });
}

#[test]
fn cornered_king_is_stalemate() {
    let game = Game::from_fen("8/8/8/8/8/kq6/8/K7 w - - 0 1").unwrap();
    assert_eq!(game.status(), GameStatus::Stalemate);
}

#[test]
fn en_passant_removes_the_passed_pawn() {
    let mut game = Game::new();
    play_all(&mut game, "e2e4 a7a6 e4e5 d7d5");
    let board = game.board();
    let ep = board
        .legal_moves_from(sq("e5"))
        .into_iter()
        .find(|m| m.to == sq("d6"))
        .unwrap();
    assert_eq!(ep.move_type, MoveType::EnPassant);

    game.apply_uci("e5d6").unwrap();
    let board = game.board();
    assert!(board.piece_at(sq("d5")).is_none());
    assert_eq!(board.piece_at(sq("d6")).map(|p| p.piece_type), Some(PieceType::Pawn));
    assert_eq!(board.history().last().and_then(|r| r.captured).map(|p| p.color), Some(Color::Black));
}

#[test]
fn returning_rook_does_not_restore_castling() {
    let mut game = Game::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
    play_all(&mut game, "h1g1 a7a6 g1h1 a6a5");
    let rights = game.board().castling_rights();
    assert!(!rights.white_kingside);
    assert!(rights.white_queenside);
    assert!(!game.board().legal_moves().iter().any(|m| m.move_type == MoveType::CastleKingside));
    assert!(game.board().legal_moves().iter().any(|m| m.move_type == MoveType::CastleQueenside));
}

#[test]
fn king_move_revokes_both_sides() {
    let mut game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    play_all(&mut game, "e1f1 e8d8 f1e1 d8e8");
    let rights = game.board().castling_rights();
    assert!(!rights.white_kingside && !rights.white_queenside);
    assert!(!rights.black_kingside && !rights.black_queenside);
}

#[test]
fn capturing_a_home_rook_revokes_its_right() {
    let mut game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    game.apply_uci("a1a8").unwrap();
    let rights = game.board().castling_rights();
    assert!(!rights.black_queenside);
    assert!(!rights.white_queenside);
    assert!(rights.black_kingside && rights.white_kingside);
}

#[test]
fn castling_moves_the_rook_too() {
    let mut game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    game.apply_uci("e1g1").unwrap();
    game.apply_uci("e8c8").unwrap();
    let board = game.board();
    assert_eq!(board.piece_at(sq("f1")).map(|p| p.piece_type), Some(PieceType::Rook));
    assert!(board.piece_at(sq("h1")).is_none());
    assert_eq!(board.piece_at(sq("d8")).map(|p| p.piece_type), Some(PieceType::Rook));
    assert!(board.piece_at(sq("a8")).is_none());
    assert_eq!(board.king_square(Color::Black), Some(sq("c8")));
}

#[test]
fn underpromotion_is_applied() {
    let mut game = Game::from_fen("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
    game.apply_uci("a7a8n").unwrap();
    assert_eq!(game.board().piece_at(sq("a8")).map(|p| p.piece_type), Some(PieceType::Knight));
}

#[test]
fn fifty_move_draw_on_hundredth_quiet_halfmove() {
    let mut game = Game::from_fen("8/8/3k4/8/8/3K4/8/R7 w - - 98 60").unwrap();
    assert_eq!(game.apply_uci("a1a2").unwrap(), GameStatus::Active);
    assert_eq!(game.board().halfmove_clock(), 99);
    assert_eq!(game.apply_uci("d6e6").unwrap(), GameStatus::Draw(DrawReason::FiftyMove));
    assert_eq!(game.board().halfmove_clock(), 100);
}

#[test]
fn threefold_repetition() {
    let mut game = Game::new();
    let status = play_all(&mut game, "g1f3 g8f6 f3g1 f6g8 g1f3 g8f6 f3g1");
    assert_eq!(status, GameStatus::Active);
    assert_eq!(game.apply_uci("f6g8").unwrap(), GameStatus::Draw(DrawReason::Repetition));
}

#[test]
fn repetition_counts_the_position_after_a_double_push() {
    let mut game = Game::new();
    let status = play_all(&mut game, "e2e4 b8c6 g1f3 c6b8 f3g1 b8c6 g1f3 c6b8");
    assert_eq!(status, GameStatus::Active);
    assert_eq!(game.apply_uci("f3g1").unwrap(), GameStatus::Draw(DrawReason::Repetition));
}

#[test]
fn undo_round_trips_through_the_game() {
    let mut game = Game::new();
    play_all(&mut game, "e2e4 d7d5 e4d5 g8f6");
    let snapshot = game.board().clone();
    game.apply_uci("f1b5").unwrap();
    game.undo().unwrap();
    assert_eq!(game.board(), &snapshot);
    assert_eq!(game.board().repetition_count(), 1);
}

#[test]
fn legal_move_never_leaves_own_king_attacked() {
    let positions = [
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    ];
    for fen in positions {
        let board = Board::from_fen(fen).unwrap();
        let mover = board.side_to_move();
        for mv in board.legal_moves() {
            let mut next = board.clone();
            next.make_move(mv);
            assert!(!movegen::in_check(&next, mover), "{} leaves the king en prise in {}", mv, fen);
            let status = classify(&next);
            assert!(!(status == GameStatus::Active && movegen::in_check(&next, mover)));
        }
    }
}

#[test]
fn make_unmake_restores_tricky_positions() {
    let fen = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
    let mut board = Board::from_fen(fen).unwrap();
    let snapshot = board.clone();
    for mv in board.legal_moves() {
        let undo = board.make_move(mv);
        let replies = movegen::legal_moves(&mut board);
        for reply in replies {
            let inner = board.make_move(reply);
            board.unmake_move(inner);
        }
        board.unmake_move(undo);
        assert_eq!(board, snapshot, "{} did not round trip", mv);
    }
}

#[test]
fn foreign_and_malformed_moves_are_rejected() {
    let mut game = Game::new();
    let before = game.board().clone();
    let bogus = Move::new(sq("e7"), sq("e5"));
    assert!(game.apply_move(bogus).is_err());
    assert!(game.apply_uci("e2e4e").is_err());
    assert!(game.apply_uci("e9e4").is_err());
    assert_eq!(game.board(), &before);
}
