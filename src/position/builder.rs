//! Fluent builder for constructing positions in tests and kernel/CSP
//! lifting without going through FEN text.

use super::state::Position;
use super::types::{CastlingRights, Color, Piece, Square};

#[derive(Clone, Debug, Default)]
pub struct PositionBuilder {
    pos: Position,
}

impl PositionBuilder {
    #[must_use]
    pub fn new() -> Self {
        PositionBuilder { pos: Position::empty() }
    }

    #[must_use]
    pub fn piece(mut self, sq: Square, color: Color, piece: Piece) -> Self {
        self.pos.set_piece(sq, color, piece);
        self
    }

    #[must_use]
    pub fn side_to_move(mut self, color: Color) -> Self {
        self.pos.side_to_move = color;
        self
    }

    #[must_use]
    pub fn castling_rights(mut self, rights: CastlingRights) -> Self {
        self.pos.castling_rights = rights;
        self
    }

    #[must_use]
    pub fn en_passant(mut self, sq: Option<Square>) -> Self {
        self.pos.en_passant = sq;
        self
    }

    #[must_use]
    pub fn build(mut self) -> Position {
        self.pos.hash = self.pos.recompute_hash();
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_minimal_kings_only_position() {
        let pos = PositionBuilder::new()
            .piece(Square::new(0, 4), Color::White, Piece::King)
            .piece(Square::new(7, 4), Color::Black, Piece::King)
            .side_to_move(Color::White)
            .build();
        assert_eq!(pos.piece_at(Square::new(0, 4)), Some((Color::White, Piece::King)));
        assert!(pos.piece_at(Square::new(3, 3)).is_none());
    }
}
