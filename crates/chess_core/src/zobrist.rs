//! Zobrist keys identifying positions for repetition detection.
//!
//! Keys come from a fixed-seed generator so the same position hashes to the
//! same value on every run.

use once_cell::sync::Lazy;
use rand::{rngs::StdRng, RngCore, SeedableRng};

use crate::{board::CastlingRights, Color, Piece, Square};

const ZOBRIST_SEED: u64 = 0x5EED_C0DE_2B1A_9F37;

pub struct ZobristKeys {
    pieces: [[[u64; 64]; 6]; 2],
    castling: [u64; 4],
    en_passant_file: [u64; 8],
    black_to_move: u64,
}

pub static ZOBRIST: Lazy<ZobristKeys> = Lazy::new(ZobristKeys::new);

impl ZobristKeys {
    fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);
        let mut keys = ZobristKeys {
            pieces: [[[0; 64]; 6]; 2],
            castling: [0; 4],
            en_passant_file: [0; 8],
            black_to_move: rng.next_u64(),
        };
        for color in keys.pieces.iter_mut() {
            for piece in color.iter_mut() {
                for square in piece.iter_mut() {
                    *square = rng.next_u64();
                }
            }
        }
        for key in keys.castling.iter_mut().chain(keys.en_passant_file.iter_mut()) {
            *key = rng.next_u64();
        }
        keys
    }

    pub fn piece(&self, piece: Piece, square: Square) -> u64 {
        self.pieces[piece.color.index()][piece.piece_type.index()][square.index()]
    }

    pub fn castling(&self, rights: CastlingRights) -> u64 {
        let flags = [
            rights.white_kingside,
            rights.white_queenside,
            rights.black_kingside,
            rights.black_queenside,
        ];
        flags
            .iter()
            .zip(self.castling.iter())
            .filter(|(set, _)| **set)
            .fold(0, |acc, (_, key)| acc ^ key)
    }

    pub fn en_passant(&self, target: Option<Square>) -> u64 {
        target.map_or(0, |sq| self.en_passant_file[sq.file as usize])
    }

    pub fn side(&self, color: Color) -> u64 {
        match color {
            Color::White => 0,
            Color::Black => self.black_to_move,
        }
    }
}
