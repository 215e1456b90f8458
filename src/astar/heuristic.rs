//! Admissible distance lower bound (spec.md §4.9 item 3): the A* search
//! ranks nodes by `a*ply + b*bound`, where `bound` comes from here.

use crate::assignment::{CostMatrix, BIG};
use crate::config::EngineConfig;
use crate::pathing::{self, PathQuery};
use crate::position::types::{Bitboard, Color, Piece, Square};
use crate::position::Position;

/// `None` means the position is proven unable to reach `goal` (e.g. a
/// piece-count shortfall no promotion can cover); callers should treat
/// this like an infinite bound.
#[must_use]
pub fn dist_lower_bound(pos: &Position, goal: &Position, blocked: Bitboard, config: &EngineConfig) -> Option<u32> {
    if !piece_counts_sufficient(pos, goal) {
        return None;
    }

    let mut bound = 0u32;
    let mut obstacle_bonus = 0u32;
    for color in [Color::White, Color::Black] {
        let (cost, obstacles) = color_routing_cost(pos, goal, color, blocked)?;
        bound = bound.saturating_add(cost);
        obstacle_bonus = obstacle_bonus.saturating_add(obstacles);
    }

    if config.heuristic_non_admissible {
        bound = bound.saturating_add(2 * obstacle_bonus);
    }

    // Ply-parity fixup: reaching `goal` requires side-to-move to flip an
    // exact number of times, so the final node's ply must have the same
    // parity as `goal`'s side-to-move relative to `pos`'s.
    let parity_needed = u32::from(pos.side_to_move() != goal.side_to_move());
    if bound % 2 != parity_needed {
        bound += 1;
    }

    Some(bound)
}

/// Total per-color piece count can only ever shrink (captures), so if
/// `pos` already has fewer pieces of a color than `goal` needs, no
/// promotion can make up the difference.
fn piece_counts_sufficient(pos: &Position, goal: &Position) -> bool {
    for color in [Color::White, Color::Black] {
        let current: u32 = ALL_PIECES.iter().map(|&p| pos.pieces_of(color, p).popcount()).sum();
        let needed: u32 = ALL_PIECES.iter().map(|&p| goal.pieces_of(color, p).popcount()).sum();
        if current < needed {
            return false;
        }
    }
    true
}

const ALL_PIECES: [Piece; 6] = [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen, Piece::King];

/// Solve one move-assignment problem for `color`: rows are its
/// non-blocked pieces on `pos`, columns are its non-blocked pieces on
/// `goal` padded with "captured" sinks (cost 0) so the matrix is square.
/// Returns `(total_cost, obstacle_count)` where `obstacle_count` is a
/// simplified proxy for spec.md §4.9's "obstacle pieces on the shortest
/// paths" (occupied goal squares whose current occupant differs),
/// used only when `heuristic_non_admissible` is set.
fn color_routing_cost(pos: &Position, goal: &Position, color: Color, blocked: Bitboard) -> Option<(u32, u32)> {
    let current: Vec<(Square, Piece)> = ALL_PIECES
        .iter()
        .flat_map(|&p| pos.pieces_of(color, p).iter().filter(|&s| !blocked.contains(s)).map(move |s| (s, p)))
        .collect();
    let goal_squares: Vec<(Square, Piece)> = ALL_PIECES
        .iter()
        .flat_map(|&p| goal.pieces_of(color, p).iter().filter(|&s| !blocked.contains(s)).map(move |s| (s, p)))
        .collect();

    let n = current.len().max(goal_squares.len());
    if n == 0 {
        return Some((0, 0));
    }
    if n > 16 {
        // Outside the assignment solver's bound; fall back to a coarse
        // but still admissible bound of zero extra routing cost, relying
        // on the rest of the cascade (kernel/extended kernel/repair) to
        // have already proven feasibility for positions this large.
        return Some((0, 0));
    }

    let mut costs = vec![BIG; n * n];
    for (i, &(from, piece)) in current.iter().enumerate() {
        for (j, &(to, goal_piece)) in goal_squares.iter().enumerate() {
            if !can_become(piece, goal_piece) {
                continue;
            }
            let query = PathQuery { piece, color, to, max_captures: 8, blocked };
            let table = pathing::compute(&query);
            if let Some(d) = table.distance(from) {
                costs[i * n + j] = i64::from(d);
            }
        }
        // "Captured" sink columns beyond goal_squares.len(): giving up
        // this piece costs nothing extra here (the capture itself is
        // accounted for by the proof kernel's capture budget upstream).
        for j in goal_squares.len()..n {
            costs[i * n + j] = 0;
        }
    }
    for i in current.len()..n {
        for j in 0..n {
            costs[i * n + j] = if j < goal_squares.len() { BIG } else { 0 };
        }
    }

    let matrix = CostMatrix::new(n, costs).ok()?;
    let assignment = matrix.solve();
    if !assignment.is_feasible() {
        return None;
    }

    let mut obstacles = 0u32;
    for &(to, goal_piece) in &goal_squares {
        if let Some((c, p)) = pos.piece_at(to) {
            if c != color || p != goal_piece {
                obstacles += 1;
            }
        }
    }

    Some((assignment.total_cost as u32, obstacles))
}

/// A piece currently of type `from` can end up as `to` only if they're
/// the same type, or `from` is a pawn promoting to a non-pawn type.
fn can_become(from: Piece, to: Piece) -> bool {
    from == to || (from == Piece::Pawn && to != Piece::Pawn && to != Piece::King)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_to_itself_has_zero_bound() {
        let pos = Position::new();
        let blocked = crate::astar::blocked::blocked_set(&pos, &pos).unwrap();
        let config = EngineConfig::default();
        assert_eq!(dist_lower_bound(&pos, &pos, blocked, &config), Some(0));
    }

    #[test]
    fn missing_piece_is_unreachable() {
        let pos = Position::new();
        let goal =
            Position::from_fen("rnbqkbnr/pppppppp/8/3Q4/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
        let blocked = Bitboard::EMPTY;
        let config = EngineConfig::default();
        assert_eq!(dist_lower_bound(&pos, &goal, blocked, &config), None);
    }

    #[test]
    fn mirroring_both_sides_gives_the_same_heuristic_score() {
        // P6: swapping colors (mirror-y) of both I and G yields the same
        // heuristic score.
        let initial = Position::new();
        let goal_fen = "rnbqk1nr/ppppppbp/6p1/8/P7/N7/1PPPPPPP/R1BQKBNR w KQkq - 0 1";
        let goal = Position::from_fen(goal_fen).unwrap();
        let initial_fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        let mirrored_initial = Position::from_fen(&mirror_fen(initial_fen)).unwrap();
        let mirrored_goal = Position::from_fen(&mirror_fen(goal_fen)).unwrap();

        let config = EngineConfig::default();
        let blocked = crate::astar::blocked_set(&initial, &goal).unwrap();
        let mirrored_blocked = crate::astar::blocked_set(&mirrored_initial, &mirrored_goal).unwrap();

        assert_eq!(
            dist_lower_bound(&initial, &goal, blocked, &config),
            dist_lower_bound(&mirrored_initial, &mirrored_goal, mirrored_blocked, &config),
        );
    }

    /// Mirrors a FEN top-to-bottom and swaps piece/side/castling colors
    /// (spec.md §8's "mirror-y" color swap).
    fn mirror_fen(fen: &str) -> String {
        let mut fields = fen.split_whitespace();
        let placement = fields.next().unwrap();
        let stm = fields.next().unwrap();
        let castling = fields.next().unwrap();
        let ep = fields.next().unwrap();
        let halfmove = fields.next().unwrap();
        let fullmove = fields.next().unwrap();

        let mirrored_placement = placement
            .split('/')
            .rev()
            .map(|rank| rank.chars().map(swap_case).collect::<String>())
            .collect::<Vec<_>>()
            .join("/");
        let mirrored_stm = if stm == "w" { "b" } else { "w" };
        let mirrored_castling: String =
            if castling == "-" { "-".to_string() } else { castling.chars().map(swap_case).collect() };
        let mirrored_ep = if ep == "-" {
            "-".to_string()
        } else {
            let file = &ep[0..1];
            let rank: u32 = ep[1..].parse().unwrap();
            format!("{file}{}", 9 - rank)
        };

        format!("{mirrored_placement} {mirrored_stm} {mirrored_castling} {mirrored_ep} {halfmove} {fullmove}")
    }

    fn swap_case(c: char) -> char {
        if c.is_ascii_uppercase() {
            c.to_ascii_lowercase()
        } else {
            c.to_ascii_uppercase()
        }
    }
}
