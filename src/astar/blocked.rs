//! Blocked-set computation (spec.md §4.9): squares a move must not touch
//! because doing so would make the goal unreachable.

use crate::pathing::{self, PathQuery};
use crate::position::attack_tables::{bishop_attacks, king_attacks, knight_attacks, queen_attacks, rook_attacks};
use crate::position::types::{Bitboard, Color, Piece, Square};
use crate::position::Position;

/// Computes the blocked set for `pos` given the (possibly retraction-
/// reduced) goal `goal`. Returns `Err(reason)` when a deadlocked piece is
/// found sitting on a goal square with a *different* piece — spec.md
/// §4.9's "the position is infeasible" case.
pub fn blocked_set(pos: &Position, goal: &Position) -> Result<Bitboard, String> {
    let mut blocked = Bitboard::EMPTY;

    blocked = blocked.or(unmoved_goal_pawns(pos, goal));
    blocked = blocked.or(castling_anchors(pos, goal));
    blocked = blocked.or(conic_pawn_cones(pos, goal));
    blocked = blocked.or(deadlocked_matches(pos, goal)?);

    Ok(blocked)
}

/// A goal pawn still on its home rank must be the original pawn that
/// never moved; if the current position still has a pawn of the same
/// color on that square, it is blocked.
fn unmoved_goal_pawns(pos: &Position, goal: &Position) -> Bitboard {
    let mut mask = Bitboard::EMPTY;
    for color in [Color::White, Color::Black] {
        let home_rank = if color == Color::White { 1 } else { 6 };
        for file in 0..8 {
            let sq = Square::new(home_rank, file);
            if matches!(goal.piece_at(sq), Some((c, Piece::Pawn)) if c == color)
                && matches!(pos.piece_at(sq), Some((c, Piece::Pawn)) if c == color)
            {
                mask = mask.with(sq);
            }
        }
    }
    mask
}

/// If `goal` still carries castling rights for a side, the king and the
/// relevant rook must not yet have moved from their home squares, so
/// both are blocked in `pos` if they currently hold the matching piece.
fn castling_anchors(pos: &Position, goal: &Position) -> Bitboard {
    let mut mask = Bitboard::EMPTY;
    for color in [Color::White, Color::Black] {
        let rank = if color == Color::White { 0 } else { 7 };
        let king_home = Square::new(rank, 4);
        let king_present = matches!(pos.piece_at(king_home), Some((c, Piece::King)) if c == color);
        for (kingside, rook_file) in [(true, 7usize), (false, 0usize)] {
            if !goal.castling_rights().has(color, kingside) {
                continue;
            }
            if king_present {
                mask = mask.with(king_home);
            }
            let rook_home = Square::new(rank, rook_file);
            if matches!(pos.piece_at(rook_home), Some((c, Piece::Rook)) if c == color) {
                mask = mask.with(rook_home);
            }
        }
    }
    mask
}

/// Simplified "conic pawn reachability": for each goal pawn not already
/// covered by [`unmoved_goal_pawns`], if exactly one current pawn of the
/// matching color can still reach it (per [`pathing::compute`]'s reverse
/// BFS with a generous capture budget), that pawn is blocked — a cone of
/// size one forces the assignment. This does not implement the full
/// multi-pawn cone-counting of spec.md §4.9 (comparing cone population
/// against cone demand for cones with more than one candidate); the
/// general case is left to the assignment-based heuristic downstream,
/// which still finds a route for every pawn even if this pass blocks
/// fewer of them than the complete algorithm would.
fn conic_pawn_cones(pos: &Position, goal: &Position) -> Bitboard {
    let mut mask = Bitboard::EMPTY;
    for color in [Color::White, Color::Black] {
        let home_rank = if color == Color::White { 1 } else { 6 };
        for file in 0..8 {
            for rank in 0..8 {
                if rank == home_rank {
                    continue;
                }
                let g = Square::new(rank, file);
                if !matches!(goal.piece_at(g), Some((c, Piece::Pawn)) if c == color) {
                    continue;
                }
                let query = PathQuery { piece: Piece::Pawn, color, to: g, max_captures: 8, blocked: Bitboard::EMPTY };
                let table = pathing::compute(&query);
                let candidates: Vec<Square> =
                    pos.pieces_of(color, Piece::Pawn).iter().filter(|&s| table.distance(s).is_some()).collect();
                if candidates.len() == 1 {
                    mask = mask.with(candidates[0]);
                }
            }
        }
    }
    mask
}

/// Pieces that currently have no legal move at all (every destination
/// square is occupied by a friendly piece) are stuck in place. If such a
/// piece sits on a goal square holding the same piece, it is blocked
/// (it's already correctly placed and cannot move); if the goal square
/// holds a different piece, the position can never reach the goal.
fn deadlocked_matches(pos: &Position, goal: &Position) -> Result<Bitboard, String> {
    let mut mask = Bitboard::EMPTY;
    for color in [Color::White, Color::Black] {
        for piece in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen, Piece::King] {
            for sq in pos.pieces_of(color, piece).iter() {
                if has_any_destination(pos, color, piece, sq) {
                    continue;
                }
                match goal.piece_at(sq) {
                    Some((c, p)) if c == color && p == piece => mask = mask.with(sq),
                    Some((c, p)) => {
                        return Err(format!(
                            "deadlocked {piece:?} ({color:?}) at {sq} must stay but goal wants {p:?} ({c:?}) there"
                        ));
                    }
                    None => {}
                }
            }
        }
    }
    Ok(mask)
}

fn has_any_destination(pos: &Position, color: Color, piece: Piece, sq: Square) -> bool {
    let idx = sq.as_index();
    let occ = pos.occupied().0;
    let own = pos.occupied_by(color).0;
    let targets = match piece {
        Piece::Knight => knight_attacks(idx),
        Piece::Bishop => bishop_attacks(idx, occ),
        Piece::Rook => rook_attacks(idx, occ),
        Piece::Queen => queen_attacks(idx, occ),
        Piece::King => king_attacks(idx),
        Piece::Pawn => return true, // pawns are handled by the conic-reachability pass instead
    };
    targets & !own != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_to_itself_blocks_every_unmoved_home_pawn() {
        let pos = Position::new();
        let blocked = blocked_set(&pos, &pos).unwrap();
        for file in 0..8 {
            assert!(blocked.contains(Square::new(1, file)));
            assert!(blocked.contains(Square::new(6, file)));
        }
    }

    #[test]
    fn unmoved_rook_blocked_when_goal_keeps_castling_rights() {
        let pos = Position::new();
        let blocked = blocked_set(&pos, &pos).unwrap();
        assert!(blocked.contains(Square::new(0, 4)));
        assert!(blocked.contains(Square::new(0, 0)));
        assert!(blocked.contains(Square::new(0, 7)));
    }
}
