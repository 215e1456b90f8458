//! Forced-last-move retraction (spec.md §4.5, inside C9, uses C5).

use crate::config::EngineConfig;
use crate::position::types::{Move, Piece};
use crate::position::Position;
use crate::reverse_moves::{self, Options, ReverseMove};

/// Repeatedly retracts forced last moves from `goal`, returning the
/// reduced goal and the retracted moves in retraction order (goal-ward
/// first, matching [`crate::path::ProofGame::extend_with_retracted`]).
///
/// Only handles the unambiguous cases from spec.md §4.5: a unique legal
/// predecessor overall, or a unique *quiet* predecessor among several
/// irreversible ones. The spec's second retraction mode — retracting an
/// irreversible move when no quiet predecessor exists, validated by a
/// recursive tiny-budget infeasibility search over the remaining
/// candidates — is not implemented; it would require spinning up a
/// nested kernel search per candidate. Skipping it never retracts a move
/// that wasn't actually forced, it just stops retracting sooner than the
/// full algorithm would.
#[must_use]
pub fn retract_forced_last_moves(goal: &Position, config: &EngineConfig) -> (Position, Vec<Move>) {
    let mut current = goal.clone();
    let mut retracted = Vec::new();
    let start = Position::new();

    loop {
        if current.equals_as_goal(&start) {
            break;
        }
        let candidates = reverse_moves::generate(&current, &Options::default());
        let chosen = pick_forced(&current, &candidates, config);
        match chosen {
            Some(rm) => {
                let mut predecessor = current.clone();
                predecessor.unmake_move(&rm.mv, rm.undo);
                retracted.push(rm.mv);
                current = predecessor;
            }
            None => break,
        }
    }

    (current, retracted)
}

fn pick_forced(goal: &Position, candidates: &[ReverseMove], config: &EngineConfig) -> Option<ReverseMove> {
    if candidates.len() == 1 {
        return Some(candidates[0].clone());
    }
    if candidates.is_empty() {
        return None;
    }
    let quiet: Vec<&ReverseMove> = candidates.iter().filter(|rm| is_quiet(goal, rm)).collect();
    match quiet.len() {
        1 => Some(quiet[0].clone()),
        0 if config.retract_irreversible && candidates.len() == 1 => Some(candidates[0].clone()),
        _ => None,
    }
}

/// Quiet: neither a capture nor a pawn move (spec.md §4.5).
fn is_quiet(goal: &Position, rm: &ReverseMove) -> bool {
    if rm.undo.captured.is_some() || rm.mv.is_en_passant {
        return false;
    }
    let mut predecessor = goal.clone();
    predecessor.unmake_move(&rm.mv, rm.undo);
    !matches!(predecessor.piece_at(rm.mv.from), Some((_, Piece::Pawn)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_goal_retracts_nothing() {
        let goal = Position::new();
        let config = EngineConfig::default();
        let (reduced, retracted) = retract_forced_last_moves(&goal, &config);
        assert!(retracted.is_empty());
        assert!(reduced.equals_as_goal(&Position::new()));
    }

    #[test]
    fn ambiguous_predecessors_retract_nothing_rather_than_guess() {
        // The reverse-move generator is a superset enumeration (spec.md
        // §4.4): almost every occupied square has more than one
        // candidate "last mover" once every piece is considered, so this
        // conservative retraction correctly declines to pick one rather
        // than retract an unforced move.
        let goal =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1").unwrap();
        let config = EngineConfig::default();
        let (reduced, retracted) = retract_forced_last_moves(&goal, &config);
        assert!(retracted.is_empty());
        assert!(reduced.equals_as_goal(&goal));
    }
}
