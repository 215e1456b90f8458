//! Pseudo-legal pawn move generation: single/double pushes, captures,
//! en passant, and promotions.

use crate::position::state::Position;
use crate::position::types::{Color, Move, MoveList, Piece, Square, PROMOTION_PIECES};

pub(super) fn generate(pos: &Position, color: Color, out: &mut MoveList) {
    let pawns = pos.pieces_of(color, Piece::Pawn);
    let enemy = pos.occupied_by(color.opponent());
    let forward = color.forward();
    let promo_rank = if color == Color::White { 7 } else { 0 };
    let start_rank = if color == Color::White { 1 } else { 6 };

    for from in pawns.iter() {
        let one_rank = from.rank() as i32 + forward;
        if !(0..8).contains(&one_rank) {
            continue;
        }
        let one_step = Square::new(one_rank as usize, from.file());
        if pos.is_empty(one_step) {
            push_pawn_move(from, one_step, promo_rank, out);

            if from.rank() == start_rank {
                let two_rank = one_rank + forward;
                let two_step = Square::new(two_rank as usize, from.file());
                if pos.is_empty(two_step) {
                    out.push(Move::quiet(from, two_step));
                }
            }
        }

        for df in [-1i32, 1] {
            let cap_file = from.file() as i32 + df;
            if !(0..8).contains(&cap_file) {
                continue;
            }
            let cap_sq = Square::new(one_rank as usize, cap_file as usize);
            if enemy.contains(cap_sq) {
                push_pawn_move(from, cap_sq, promo_rank, out);
            } else if pos.en_passant() == Some(cap_sq) {
                out.push(Move::en_passant(from, cap_sq));
            }
        }
    }
}

fn push_pawn_move(from: Square, to: Square, promo_rank: usize, out: &mut MoveList) {
    if to.rank() == promo_rank {
        for piece in PROMOTION_PIECES {
            out.push(Move::promotion(from, to, piece));
        }
    } else {
        out.push(Move::quiet(from, to));
    }
}
