//! Move and undo-info types.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::castling::CastlingRights;
use super::piece::Piece;
use super::square::Square;

/// A pseudo-legal or legal chess move.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
    pub is_castling: bool,
    pub is_en_passant: bool,
}

impl Move {
    #[must_use]
    pub const fn quiet(from: Square, to: Square) -> Self {
        Move { from, to, promotion: None, is_castling: false, is_en_passant: false }
    }

    #[must_use]
    pub const fn promotion(from: Square, to: Square, piece: Piece) -> Self {
        Move { from, to, promotion: Some(piece), is_castling: false, is_en_passant: false }
    }

    #[must_use]
    pub const fn castling(from: Square, to: Square) -> Self {
        Move { from, to, promotion: None, is_castling: true, is_en_passant: false }
    }

    #[must_use]
    pub const fn en_passant(from: Square, to: Square) -> Self {
        Move { from, to, promotion: None, is_castling: false, is_en_passant: true }
    }

    /// UCI long algebraic form, e.g. `e2e4`, `e7e8q`.
    #[must_use]
    pub fn to_uci(self) -> String {
        let mut s = format!("{}{}", self.from, self.to);
        if let Some(p) = self.promotion {
            s.push(p.to_char());
        }
        s
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

/// Information needed to unmake a move: the piece captured (if any), the
/// castling/en-passant/half-move state that held immediately before the
/// move was made.
#[derive(Clone, Copy, Debug)]
pub struct UndoInfo {
    pub captured: Option<Piece>,
    pub castling_rights: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub hash: u64,
}

pub type MoveList = Vec<Move>;
