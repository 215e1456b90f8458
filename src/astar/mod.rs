//! Proof-game A* (C9, spec.md §4.9): best-first search over real chess
//! positions, guided by the heuristic in [`heuristic`] and the blocked
//! set in [`blocked`], with forced-last-move retraction ([`retraction`])
//! run first to shrink the goal.

mod blocked;
mod heuristic;
mod retraction;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::BinaryHeap;

pub use blocked::blocked_set;
pub use heuristic::dist_lower_bound;
pub use retraction::retract_forced_last_moves;

use crate::config::EngineConfig;
use crate::path::ProofGame;
use crate::position::types::Move;
use crate::position::Position;

/// Outcome of one A* invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AstarOutcome {
    Solved(ProofGame),
    Infeasible(String),
    BudgetExhausted { nodes_used: u64 },
}

struct Node {
    position: Position,
    parent: Option<u32>,
    last_move: Option<Move>,
    ply: u32,
}

/// Priority-queue entry. Ordered so [`BinaryHeap`] (a max-heap) pops the
/// node spec.md §4.9 ranks highest: smallest `a*ply + b*bound` first,
/// then fewer pieces, then smaller king distance to goal, then more pawn
/// advances, then a deterministic hashed tie-break.
struct QueueKey {
    priority: i64,
    piece_count: u32,
    king_distance: i32,
    pawn_advances: i32,
    rand_tiebreak: u64,
    node: u32,
}

impl PartialEq for QueueKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for QueueKey {}

impl PartialOrd for QueueKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.piece_count.cmp(&self.piece_count))
            .then_with(|| other.king_distance.cmp(&self.king_distance))
            .then_with(|| self.pawn_advances.cmp(&other.pawn_advances))
            .then_with(|| self.rand_tiebreak.cmp(&other.rand_tiebreak))
    }
}

pub struct AstarSearch {
    config: EngineConfig,
}

impl AstarSearch {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        AstarSearch { config }
    }

    /// Runs the cascade's final stage: retracts forced last moves from
    /// `goal`, then searches from `initial` for a legal move sequence
    /// reaching the reduced goal, within `node_budget` expansions.
    pub fn run(&self, initial: &Position, goal: &Position, node_budget: u64) -> AstarOutcome {
        let (reduced_goal, retracted) = retract_forced_last_moves(goal, &self.config);

        let root_blocked = match blocked_set(initial, &reduced_goal) {
            Ok(b) => b,
            Err(reason) => return AstarOutcome::Infeasible(reason),
        };
        if dist_lower_bound(initial, &reduced_goal, root_blocked, &self.config).is_none() {
            return AstarOutcome::Infeasible("piece composition can never reach the goal".to_string());
        }

        let mut arena: Vec<Node> = vec![Node { position: initial.clone(), parent: None, last_move: None, ply: 0 }];
        let mut heap: BinaryHeap<QueueKey> = BinaryHeap::new();
        let mut best_ply: HashMap<u64, u32> = HashMap::new();
        best_ply.insert(initial.hash(), 0);

        let mut best_solution: Option<u32> = None;
        let mut nodes_expanded: u64 = 0;
        let mut rand_state = self.config.random_seed ^ 0x9E3779B97F4A7C15;

        let mut root_key = self.queue_key(0, &arena[0], &reduced_goal, &mut rand_state);
        root_key.node = 0;
        heap.push(root_key);

        while let Some(entry) = heap.pop() {
            if nodes_expanded >= node_budget {
                return match best_solution {
                    Some(idx) => AstarOutcome::Solved(self.reconstruct(&arena, idx, retracted)),
                    None => AstarOutcome::BudgetExhausted { nodes_used: nodes_expanded },
                };
            }

            let idx = entry.node;
            if best_ply.get(&arena[idx as usize].position.hash()).copied() != Some(arena[idx as usize].ply) {
                continue; // superseded by a shorter path found later
            }

            nodes_expanded += 1;
            let pos = arena[idx as usize].position.clone();
            let ply = arena[idx as usize].ply;

            if pos.equals_as_goal(&reduced_goal) {
                if self.config.accept_first {
                    return AstarOutcome::Solved(self.reconstruct(&arena, idx, retracted));
                }
                if best_solution.map_or(true, |b| ply < arena[b as usize].ply) {
                    best_solution = Some(idx);
                }
                continue;
            }

            let blocked = match blocked_set(&pos, &reduced_goal) {
                Ok(b) => b,
                Err(_) => continue, // this branch is a dead end, not a global failure
            };

            let mut scratch = pos.clone();
            for mv in scratch.generate_moves() {
                if blocked.contains(mv.from) || blocked.contains(mv.to) {
                    continue;
                }
                let mut child = pos.clone();
                let _undo = child.make_move(&mv);
                let child_ply = ply + 1;
                let child_hash = child.hash();
                if best_ply.get(&child_hash).map_or(false, |&p| p <= child_ply) {
                    continue;
                }
                best_ply.insert(child_hash, child_ply);
                let child_idx = arena.len() as u32;
                arena.push(Node { position: child, parent: Some(idx), last_move: Some(mv), ply: child_ply });
                let mut key = self.queue_key(child_ply, &arena[child_idx as usize], &reduced_goal, &mut rand_state);
                key.node = child_idx;
                heap.push(key);
            }
        }

        match best_solution {
            Some(idx) => AstarOutcome::Solved(self.reconstruct(&arena, idx, retracted)),
            None => AstarOutcome::BudgetExhausted { nodes_used: nodes_expanded },
        }
    }

    fn queue_key(&self, ply: u32, node: &Node, goal: &Position, rand_state: &mut u64) -> QueueKey {
        let blocked = blocked_set(&node.position, goal).unwrap_or(crate::position::types::Bitboard::EMPTY);
        let bound = dist_lower_bound(&node.position, goal, blocked, &self.config).unwrap_or(u32::MAX / 4);
        let priority = i64::from(self.config.astar_weight_ply) * i64::from(ply)
            + i64::from(self.config.astar_weight_bound) * i64::from(bound);

        let piece_count = node.position.occupied().popcount();
        let king_distance = node
            .position
            .king_square(crate::position::types::Color::White)
            .king_distance(goal.king_square(crate::position::types::Color::White))
            + node
                .position
                .king_square(crate::position::types::Color::Black)
                .king_distance(goal.king_square(crate::position::types::Color::Black));
        let pawn_advances = pawn_advancement(&node.position);

        *rand_state ^= *rand_state << 13;
        *rand_state ^= *rand_state >> 7;
        *rand_state ^= *rand_state << 17;

        QueueKey {
            priority,
            piece_count,
            king_distance,
            pawn_advances,
            rand_tiebreak: *rand_state,
            node: 0, // filled in by caller via the returned struct's `node` field below
        }
    }

    fn reconstruct(&self, arena: &[Node], mut idx: u32, retracted: Vec<Move>) -> ProofGame {
        let mut moves = Vec::new();
        loop {
            let node = &arena[idx as usize];
            match (node.last_move, node.parent) {
                (Some(mv), Some(parent)) => {
                    moves.push(mv);
                    idx = parent;
                }
                _ => break,
            }
        }
        moves.reverse();
        let mut game = ProofGame::new(moves);
        game.extend_with_retracted(retracted);
        game
    }
}

/// Sum, over both colors, of how many ranks each pawn has advanced from
/// its home rank — a cheap proxy for the A* tie-break's "more pawn
/// advances first" rule.
fn pawn_advancement(pos: &Position) -> i32 {
    use crate::position::types::{Color, Piece};
    let mut total = 0i32;
    for sq in pos.pieces_of(Color::White, Piece::Pawn).iter() {
        total += sq.rank() as i32 - 1;
    }
    for sq in pos.pieces_of(Color::Black, Piece::Pawn).iter() {
        total += 6 - sq.rank() as i32;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_to_itself_solves_immediately() {
        let pos = Position::new();
        let search = AstarSearch::new(EngineConfig::default());
        let outcome = search.run(&pos, &pos, 10_000);
        match outcome {
            AstarOutcome::Solved(game) => assert!(game.is_empty()),
            other => panic!("expected Solved(empty), got {other:?}"),
        }
    }

    #[test]
    fn one_legal_pawn_push_is_found() {
        let initial = Position::new();
        let goal =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1").unwrap();
        let search = AstarSearch::new(EngineConfig::default());
        let outcome = search.run(&initial, &goal, 10_000);
        match outcome {
            AstarOutcome::Solved(game) => {
                assert!(!game.is_empty());
                let mut replay = initial.clone();
                for mv in game.moves() {
                    replay.make_move(mv);
                }
                assert!(replay.equals_as_goal(&goal));
            }
            other => panic!("expected Solved, got {other:?}"),
        }
    }

    #[test]
    fn solution_length_never_undercuts_the_admissible_bound() {
        // P5: the returned proof game is never shorter than the admissible
        // distance lower bound computed against the (unreduced) goal --
        // retraction only ever strips moves that were forced anyway, so it
        // cannot make a shorter solution possible than the bound allows.
        let initial = Position::new();
        for goal_fen in [
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1",
            "rnbqk1nr/ppppppbp/6p1/8/P7/N7/1PPPPPPP/R1BQKBNR w KQkq - 0 1",
        ] {
            let goal = Position::from_fen(goal_fen).unwrap();
            let config = EngineConfig::default();
            let blocked = blocked_set(&initial, &goal).unwrap();
            let bound = dist_lower_bound(&initial, &goal, blocked, &config).expect("reachable goal has a finite bound");

            let search = AstarSearch::new(config);
            if let AstarOutcome::Solved(game) = search.run(&initial, &goal, 200_000) {
                assert!(game.len() as u32 >= bound, "solution length {} below bound {bound}", game.len());
            }
        }
    }

    #[test]
    fn castling_rights_stay_consistent_along_the_proof_game() {
        // P7: wherever a castling-rights bit is set, the king sits on its
        // home square and the matching rook sits on its corner.
        use crate::position::types::{Color, Piece, Square};

        let initial = Position::new();
        let goal =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1").unwrap();
        let search = AstarSearch::new(EngineConfig::default());
        let AstarOutcome::Solved(game) = search.run(&initial, &goal, 800_000) else {
            panic!("expected scenario 4 to solve");
        };

        let mut pos = initial.clone();
        check_castling_consistency(&pos);
        for mv in game.moves() {
            pos.make_move(mv);
            check_castling_consistency(&pos);
        }

        fn check_castling_consistency(pos: &Position) {
            let checks = [
                (Color::White, true, Square::new(0, 4), Square::new(0, 7)),
                (Color::White, false, Square::new(0, 4), Square::new(0, 0)),
                (Color::Black, true, Square::new(7, 4), Square::new(7, 7)),
                (Color::Black, false, Square::new(7, 4), Square::new(7, 0)),
            ];
            for (color, kingside, king_home, rook_home) in checks {
                if pos.castling_rights().has(color, kingside) {
                    assert_eq!(pos.piece_at(king_home), Some((color, Piece::King)));
                    assert_eq!(pos.piece_at(rook_home), Some((color, Piece::Rook)));
                }
            }
        }
    }

    #[test]
    fn en_passant_square_always_follows_a_double_pawn_push() {
        // P8: every EP square set along the proof game has exactly the
        // preceding move being a double pawn push to the appropriate square.
        use crate::position::types::Piece;

        let initial = Position::new();
        let goal = Position::from_fen(
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 1",
        )
        .unwrap();
        let search = AstarSearch::new(EngineConfig::default());
        let AstarOutcome::Solved(game) = search.run(&initial, &goal, 800_000) else {
            panic!("expected scenario 5 to solve");
        };

        let mut pos = initial.clone();
        for mv in game.moves() {
            let mover_before = pos.piece_at(mv.from);
            pos.make_move(mv);
            if let Some(ep) = pos.en_passant() {
                assert_eq!(mover_before.map(|(_, p)| p), Some(Piece::Pawn));
                assert_eq!(mv.from.file(), mv.to.file());
                assert_eq!(mv.from.rank().abs_diff(mv.to.rank()), 2);
                assert_eq!(ep.file(), mv.to.file());
            }
        }
    }
}
