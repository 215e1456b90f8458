//! Zobrist hashing for chess positions.

use rand::prelude::*;
use std::sync::LazyLock;

pub(crate) struct ZobristKeys {
    /// `piece_keys[color][piece][square]`
    pub(crate) piece_keys: [[[u64; 64]; 6]; 2],
    pub(crate) black_to_move_key: u64,
    /// `castling_keys[bit]`, indexed by the four `CASTLE_*` bit positions.
    pub(crate) castling_keys: [u64; 4],
    pub(crate) en_passant_keys: [u64; 8],
}

impl ZobristKeys {
    fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(0x50_5260_4b45_524e);
        let mut piece_keys = [[[0u64; 64]; 6]; 2];
        for color in &mut piece_keys {
            for piece in color.iter_mut() {
                for key in piece.iter_mut() {
                    *key = rng.gen();
                }
            }
        }
        let mut castling_keys = [0u64; 4];
        for key in &mut castling_keys {
            *key = rng.gen();
        }
        let mut en_passant_keys = [0u64; 8];
        for key in &mut en_passant_keys {
            *key = rng.gen();
        }
        ZobristKeys {
            piece_keys,
            black_to_move_key: rng.gen(),
            castling_keys,
            en_passant_keys,
        }
    }
}

pub(crate) static ZOBRIST: LazyLock<ZobristKeys> = LazyLock::new(ZobristKeys::new);
