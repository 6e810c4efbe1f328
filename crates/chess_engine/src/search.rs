// Depth-limited minimax with alpha-beta pruning over one owned board.
use chess_core::{movegen, Board, Color, Move};
use log::{debug, trace, warn};

use crate::evaluation::evaluate_position;

// Mate sentinel; dominates any material score.
pub const MATE_SCORE: i32 = 100_000;
pub const STALEMATE_SCORE: i32 = 0;

/// Search outcome. `score` is from White's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub score: i32,
    pub nodes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Done,
}

/// One root search, resumable between root moves.
///
/// The task owns the only board it mutates; every node is reached by
/// make/unmake on it and undone before the next sibling is tried.
pub struct SearchTask {
    board: Board,
    color: Color,
    depth: u8,
    prune: bool,
    root_moves: Vec<Move>,
    next: usize,
    alpha: i32,
    beta: i32,
    best: Option<(Move, i32)>,
    nodes: u64,
    finished: Option<SearchResult>,
}

impl SearchTask {
    pub fn new(board: Board, color: Color, depth: u8) -> Self {
        Self::with_pruning(board, color, depth, true)
    }

    /// `prune: false` gives plain minimax, used to cross-check alpha-beta.
    pub fn with_pruning(mut board: Board, color: Color, depth: u8, prune: bool) -> Self {
        let mut finished = None;
        let mut root_moves = Vec::new();

        if color != board.side_to_move() {
            warn!("asked to search for {} but {} is to move", color, board.side_to_move());
            finished = Some(SearchResult {
                best_move: None,
                score: evaluate_position(&board),
                nodes: 1,
            });
        } else if depth == 0 {
            finished = Some(SearchResult {
                best_move: None,
                score: leaf_score(&mut board),
                nodes: 1,
            });
        } else {
            root_moves = movegen::legal_moves(&mut board);
            if root_moves.is_empty() {
                finished = Some(SearchResult {
                    best_move: None,
                    score: terminal_score(&board),
                    nodes: 1,
                });
            }
        }

        Self {
            board,
            color,
            depth,
            prune,
            root_moves,
            next: 0,
            alpha: i32::MIN,
            beta: i32::MAX,
            best: None,
            nodes: 1,
            finished,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    pub fn root_move_count(&self) -> usize {
        self.root_moves.len()
    }

    /// Searches up to `root_moves` further root moves (at least one).
    pub fn step(&mut self, root_moves: usize) -> Step {
        if self.finished.is_some() {
            return Step::Done;
        }
        let maximizing = self.color == Color::White;
        let end = (self.next + root_moves.max(1)).min(self.root_moves.len());

        while self.next < end {
            let mv = self.root_moves[self.next];
            self.next += 1;

            let undo = self.board.make_move(mv);
            let score = minimax(
                &mut self.board,
                self.depth - 1,
                self.alpha,
                self.beta,
                self.prune,
                &mut self.nodes,
            );
            self.board.unmake_move(undo);
            trace!("root {} scored {}", mv, score);

            let improves = match self.best {
                None => true,
                Some((_, best)) if maximizing => score > best,
                Some((_, best)) => score < best,
            };
            if improves {
                self.best = Some((mv, score));
                if maximizing {
                    self.alpha = self.alpha.max(score);
                } else {
                    self.beta = self.beta.min(score);
                }
            }
        }

        if self.next < self.root_moves.len() {
            return Step::Continue;
        }

        let result = match self.best {
            Some((mv, score)) => SearchResult {
                best_move: Some(mv),
                score,
                nodes: self.nodes,
            },
            None => SearchResult {
                best_move: None,
                score: terminal_score(&self.board),
                nodes: self.nodes,
            },
        };
        debug!(
            "depth {} search for {}: {:?} score {} over {} nodes",
            self.depth, self.color, result.best_move, result.score, result.nodes
        );
        self.finished = Some(result);
        Step::Done
    }

    pub fn result(&self) -> Option<SearchResult> {
        self.finished
    }
}

/// Picks a move for `color` searching `depth` plies. Identical inputs always
/// give the identical move; ties go to the earliest move in generation order.
pub fn select_move(board: &Board, color: Color, depth: u8) -> SearchResult {
    run_to_completion(SearchTask::new(board.clone(), color, depth))
}

/// Same as [`select_move`] without pruning.
pub fn select_move_unpruned(board: &Board, color: Color, depth: u8) -> SearchResult {
    run_to_completion(SearchTask::with_pruning(board.clone(), color, depth, false))
}

fn run_to_completion(mut task: SearchTask) -> SearchResult {
    let all = task.root_move_count();
    while task.step(all) == Step::Continue {}
    task.finished.unwrap_or(SearchResult {
        best_move: None,
        score: evaluate_position(&task.board),
        nodes: task.nodes,
    })
}

/// Static score at the depth limit. A side with no moves left is mated or
/// stalemated there too, so the sentinels still apply.
fn leaf_score(board: &mut Board) -> i32 {
    if movegen::has_legal_move(board) {
        evaluate_position(board)
    } else {
        terminal_score(board)
    }
}

/// Score with no legal moves: mate counts against the side to move.
fn terminal_score(board: &Board) -> i32 {
    let to_move = board.side_to_move();
    if movegen::in_check(board, to_move) {
        match to_move {
            Color::White => -MATE_SCORE,
            Color::Black => MATE_SCORE,
        }
    } else {
        STALEMATE_SCORE
    }
}

fn minimax(board: &mut Board, depth: u8, mut alpha: i32, mut beta: i32, prune: bool, nodes: &mut u64) -> i32 {
    *nodes += 1;
    if depth == 0 {
        return leaf_score(board);
    }

    let moves = movegen::legal_moves(board);
    if moves.is_empty() {
        return terminal_score(board);
    }

    let maximizing = board.side_to_move() == Color::White;
    let mut best = if maximizing { i32::MIN } else { i32::MAX };

    for mv in moves {
        let undo = board.make_move(mv);
        let score = minimax(board, depth - 1, alpha, beta, prune, nodes);
        board.unmake_move(undo);

        if maximizing {
            best = best.max(score);
            alpha = alpha.max(best);
        } else {
            best = best.min(score);
            beta = beta.min(best);
        }
        if prune && beta <= alpha {
            break;
        }
    }

    best
}
