//! Pseudo-legal move generation, dispatched by piece type.
//!
//! [`Position::generate_moves`] filters these down to legal moves by
//! make/unmake plus a check test; this module only produces the
//! pseudo-legal superset.

mod pawns;
mod pieces;

use super::state::Position;
use super::types::MoveList;

impl Position {
    pub(crate) fn generate_pseudo_moves(&self) -> MoveList {
        let color = self.side_to_move();
        let mut moves = MoveList::new();
        pawns::generate(self, color, &mut moves);
        pieces::generate_knights(self, color, &mut moves);
        pieces::generate_sliders(self, color, &mut moves);
        pieces::generate_king(self, color, &mut moves);
        moves
    }
}
