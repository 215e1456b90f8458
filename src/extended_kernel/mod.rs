//! Extended-kernel lifter (C7, spec.md §4.7): lifts a [`PkMove`] sequence
//! to a sequence of moves on concrete squares, grounded on
//! `original_source/lib/texelutillib/extproofkernel.{hpp,cpp}`'s
//! `ExtProofKernel` (`allPawns`, `PawnColumn`, `ExtMove`/`VarSquare`).
//!
//! Each pawn still on the board gets one CSP rank variable per point in
//! the [`PkMove`] sequence where it is referenced (the teacher's
//! `Pawn::varIds`); column order and capture geometry become constraints
//! over those variables, and the final variables are pinned to the
//! goal's pawn ranks column by column.

use std::fmt;

use crate::csp::{Constraint, Preference, Solver, Variable};
use crate::error::EngineError;
use crate::kernel::moves::PkMove;
use crate::kernel::PieceKind;
use crate::position::types::Color;
use crate::position::Position;

/// A kernel move lifted onto concrete files and ranks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtPkMove {
    pub color: Color,
    /// `None` for a piece-takes-piece move: the kernel never tracks
    /// which specific non-pawn piece performs a capture, only that the
    /// opponent has a surplus of `captured`'s kind; repair (C8) resolves
    /// the concrete capturing piece from board occupancy.
    pub moving_piece: Option<PieceKind>,
    /// `(file, rank)`, both 0-indexed board coordinates; `rank ==
    /// u8::MAX` has the same "resolve from occupancy" meaning as
    /// `moving_piece == None`.
    pub from: (u8, u8),
    pub capture: bool,
    /// The kind of piece being captured. For a `PawnTakesPawn` move this
    /// is always `Pawn`; repair (C8) uses it to pick a concrete capture
    /// square when `to`'s file is left unresolved.
    pub captured_kind: PieceKind,
    pub to: (u8, u8),
    pub promoted_piece: Option<PieceKind>,
}

/// Text form from spec.md §6: `[w|b]<piece><fromSq>[-|x]<toSq>[<promPiece>]`,
/// with an unresolved square (see [`ExtPkMove::from`]'s doc) simply
/// omitted, generalizing `PkMove`'s own `wxR` shorthand for the same case.
impl fmt::Display for ExtPkMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let color_char = if self.color == Color::White { 'w' } else { 'b' };
        write!(f, "{color_char}")?;
        if let Some(piece) = self.moving_piece {
            write!(f, "{}", piece.to_letter())?;
        }
        if let Some(sq) = square_text(self.from) {
            write!(f, "{sq}")?;
        }
        write!(f, "{}", if self.capture { 'x' } else { '-' })?;
        if self.moving_piece.is_none() {
            write!(f, "{}", self.captured_kind.to_letter())?;
        }
        if let Some(sq) = square_text(self.to) {
            write!(f, "{sq}")?;
        }
        if let Some(promo) = self.promoted_piece {
            write!(f, "{}", promo.to_letter())?;
        }
        Ok(())
    }
}

fn square_text(coord: (u8, u8)) -> Option<String> {
    let (file, rank) = coord;
    if rank == u8::MAX {
        return None;
    }
    Some(format!("{}{}", (b'a' + file) as char, rank + 1))
}

struct PawnTrack {
    color: Color,
    current_var: usize,
}

/// Builds the CSP for a [`PkMove`] path and, if it is satisfiable,
/// returns the corresponding [`ExtPkMove`] sequence.
pub struct ExtendedKernel {
    vars: Vec<Variable>,
    constraints: Vec<Constraint>,
    pawns: Vec<PawnTrack>,
    columns: [Vec<usize>; 8],
}

impl ExtendedKernel {
    #[must_use]
    pub fn new(initial: &Position) -> Self {
        let mut vars = Vec::new();
        let mut pawns = Vec::new();
        let mut columns: [Vec<usize>; 8] = std::array::from_fn(|_| Vec::new());

        for file in 0..8u8 {
            let mut entries: Vec<(u8, Color)> = Vec::new();
            for rank in 1..7u8 {
                let sq = crate::position::types::Square::new(rank as usize, file as usize);
                if let Some((color, crate::position::types::Piece::Pawn)) = initial.piece_at(sq) {
                    entries.push((rank, color));
                }
            }
            entries.sort_by_key(|&(rank, _)| rank);
            for (rank, color) in entries {
                // A pawn can only have moved forward from its current
                // square, and not yet reached a promotion rank, so its
                // rank at the time of its first reference is bounded by
                // its own current rank on one side and the last
                // non-promotion rank on the other.
                let (lo, hi, preference) = if color == Color::White {
                    (i32::from(rank), 6, Preference::Small)
                } else {
                    (1, i32::from(rank), Preference::Large)
                };
                let var = vars.len();
                vars.push(Variable::new(lo, hi, preference));
                let pawn_id = pawns.len();
                pawns.push(PawnTrack { color, current_var: var });
                columns[file as usize].push(pawn_id);
            }
        }

        ExtendedKernel { vars, constraints: Vec::new(), pawns, columns }
    }

    fn alloc_var(&mut self, min: i32, max: i32, preference: Preference) -> usize {
        let id = self.vars.len();
        self.vars.push(Variable::new(min, max, preference));
        id
    }

    fn advance_pawn(&mut self, pawn_id: usize, offset: i32) -> usize {
        let color = self.pawns[pawn_id].color;
        let preference = if color == Color::White { Preference::Small } else { Preference::Large };
        let new_var = self.alloc_var(1, 6, preference);
        self.constraints.push(Constraint::Eq { x: new_var, y: self.pawns[pawn_id].current_var, k: offset });
        self.pawns[pawn_id].current_var = new_var;
        new_var
    }

    fn remove_from_column(&mut self, file: usize, idx: usize) -> usize {
        self.columns[file].remove(idx)
    }

    /// Bishop-color parity required of a pawn landing on the captured
    /// piece's square: the pawn occupies that square after capturing, so
    /// its own resulting square color must match the bishop's.
    fn push_bishop_parity(&mut self, var: usize, file: u8, captured: PieceKind) {
        if let Some(wants_light) = match captured {
            PieceKind::LightBishop => Some(true),
            PieceKind::DarkBishop => Some(false),
            _ => None,
        } {
            let even = if wants_light { file % 2 == 1 } else { file % 2 == 0 };
            self.constraints.push(Constraint::Parity { x: var, even });
        }
    }

    fn apply_move(&mut self, mv: PkMove) {
        match mv {
            PkMove::PawnTakesPawn { color, from_file, from_idx, to_file, to_idx, .. } => {
                // The capturing pawn lands exactly on the victim's
                // square, so it inherits the victim's rank variable
                // outright; the only new constraint is the diagonal-step
                // precondition linking the two pawns' prior ranks.
                let offset = if color == Color::White { 1 } else { -1 };
                let mover = self.columns[from_file as usize][from_idx as usize];
                let victim = self.columns[to_file as usize][to_idx as usize];
                self.constraints.push(Constraint::Eq {
                    x: self.pawns[victim].current_var,
                    y: self.pawns[mover].current_var,
                    k: offset,
                });
                self.pawns[mover].current_var = self.pawns[victim].current_var;
                self.remove_from_column(from_file as usize, from_idx as usize);
                self.remove_from_column(to_file as usize, to_idx as usize);
                self.columns[to_file as usize].insert((to_idx as usize).min(self.columns[to_file as usize].len()), mover);
            }
            PkMove::PawnTakesPiece { color, file, idx, captured, promotes_to, .. } => {
                let pawn = self.columns[file as usize][idx as usize];
                if let Some(_promo) = promotes_to {
                    let promo_rank = if color == Color::White { 6 } else { 1 };
                    let current = self.pawns[pawn].current_var;
                    self.constraints.push(Constraint::GeConst { x: current, c: promo_rank });
                    self.constraints.push(Constraint::LeConst { x: current, c: promo_rank });
                    self.push_bishop_parity(current, file, captured);
                    self.remove_from_column(file as usize, idx as usize);
                } else {
                    let offset = if color == Color::White { 1 } else { -1 };
                    let new_var = self.advance_pawn(pawn, offset);
                    self.push_bishop_parity(new_var, file, captured);
                }
            }
            PkMove::PieceTakesPawn { file, idx, .. } => {
                self.remove_from_column(file as usize, idx as usize);
            }
            PkMove::PieceTakesPiece { .. } => {}
        }
    }

    /// Column ordering: consecutive pawns (by current rank) in the same
    /// file must occupy strictly increasing ranks.
    fn column_order_constraints(&mut self) {
        for file in 0..8 {
            let column = self.columns[file].clone();
            for pair in column.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                self.constraints.push(Constraint::LessEq {
                    x: self.pawns[a].current_var,
                    y: self.pawns[b].current_var,
                    k: -1,
                });
            }
        }
    }

    /// Pins each surviving pawn's final rank to the goal's pawn ranks in
    /// its column, and reports whether every column's surviving-pawn
    /// count matches the goal's (a mismatch means the kernel path
    /// doesn't actually reach the goal, which `find_ext_kernel` treats
    /// as unsatisfiable up front rather than trusting the solver to
    /// notice an under-constrained column).
    fn pin_to_goal(&mut self, goal: &Position) -> bool {
        let mut consistent = true;
        for file in 0..8u8 {
            let mut goal_ranks: Vec<u8> = Vec::new();
            for rank in 1..7u8 {
                let sq = crate::position::types::Square::new(rank as usize, file as usize);
                if let Some((_, crate::position::types::Piece::Pawn)) = goal.piece_at(sq) {
                    goal_ranks.push(rank);
                }
            }
            goal_ranks.sort_unstable();
            let column = self.columns[file as usize].clone();
            if column.len() != goal_ranks.len() {
                consistent = false;
            }
            for (pawn_id, &rank) in column.iter().zip(goal_ranks.iter()) {
                let var = self.pawns[*pawn_id].current_var;
                self.constraints.push(Constraint::GeConst { x: var, c: i32::from(rank) });
                self.constraints.push(Constraint::LeConst { x: var, c: i32::from(rank) });
            }
        }
        consistent
    }

    /// Converts `path` to an [`ExtPkMove`] sequence if the resulting CSP
    /// is satisfiable.
    ///
    /// # Errors
    /// Never returns an error today; the `Result` wrapper matches every
    /// other search component's signature (spec.md §4's ambient-error
    /// convention) and leaves room for a future arithmetic-overflow guard.
    pub fn find_ext_kernel(mut self, goal: &Position, path: &[PkMove]) -> Result<Option<Vec<ExtPkMove>>, EngineError> {
        const UNKNOWN: (u8, usize) = (0, usize::MAX);

        // (from-file, from-var) and (to-file, to-var) per move, `usize::MAX`
        // standing in for "no rank variable: resolved from occupancy by the
        // repair stage instead" (spec.md §4.7's squares that never gain a
        // variable because no pawn is involved).
        let mut resolved_from: Vec<(u8, usize)> = Vec::with_capacity(path.len());
        let mut resolved_to: Vec<(u8, usize)> = Vec::with_capacity(path.len());

        for &mv in path {
            let (from, to) = match mv {
                PkMove::PawnTakesPawn { from_file, from_idx, to_file, .. } => {
                    let mover = self.columns[from_file as usize][from_idx as usize];
                    let from = (from_file, self.pawns[mover].current_var);
                    self.apply_move(mv);
                    let to = (to_file, self.pawns[mover].current_var);
                    (from, to)
                }
                PkMove::PawnTakesPiece { file, idx, .. } => {
                    let pawn = self.columns[file as usize][idx as usize];
                    let from = (file, self.pawns[pawn].current_var);
                    self.apply_move(mv);
                    let to = (file, self.pawns[pawn].current_var);
                    (from, to)
                }
                PkMove::PieceTakesPawn { file, idx, .. } => {
                    let pawn = self.columns[file as usize][idx as usize];
                    let to = (file, self.pawns[pawn].current_var);
                    self.apply_move(mv);
                    (UNKNOWN, to)
                }
                PkMove::PieceTakesPiece { .. } => {
                    self.apply_move(mv);
                    (UNKNOWN, UNKNOWN)
                }
            };
            resolved_from.push(from);
            resolved_to.push(to);
        }

        self.column_order_constraints();
        if !self.pin_to_goal(goal) {
            return Ok(None);
        }

        let solver = Solver::new(self.vars.clone(), self.constraints.clone());
        let Some(solution) = solver.solve() else {
            return Ok(None);
        };

        let resolve = |(file, var): (u8, usize)| (file, if var == usize::MAX { u8::MAX } else { solution[var] as u8 });

        let mut ext_moves = Vec::with_capacity(path.len());
        for (i, &mv) in path.iter().enumerate() {
            let (moving_piece, captured_as_piece, captured_kind, promoted) = move_kinds(mv);
            ext_moves.push(ExtPkMove {
                color: mv.color(),
                moving_piece,
                from: resolve(resolved_from[i]),
                capture: captured_as_piece,
                captured_kind,
                to: resolve(resolved_to[i]),
                promoted_piece: promoted,
            });
        }
        Ok(Some(ext_moves))
    }
}

/// `(moving_piece, capture, captured_kind, promoted_piece)` for an
/// `ExtPkMove`; every kernel move is a capture, so the second element is
/// always `true`.
fn move_kinds(mv: PkMove) -> (Option<PieceKind>, bool, PieceKind, Option<PieceKind>) {
    match mv {
        PkMove::PawnTakesPawn { .. } => (Some(PieceKind::Pawn), true, PieceKind::Pawn, None),
        PkMove::PawnTakesPiece { captured, promotes_to, .. } => (Some(PieceKind::Pawn), true, captured, promotes_to),
        PkMove::PieceTakesPawn { .. } => (None, true, PieceKind::Pawn, None),
        PkMove::PieceTakesPiece { captured, .. } => (None, true, captured, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_from_startpos_to_itself_lifts_to_empty_sequence() {
        let pos = Position::new();
        let kernel = ExtendedKernel::new(&pos);
        let result = kernel.find_ext_kernel(&pos, &[]).unwrap();
        assert_eq!(result, Some(Vec::new()));
    }

    #[test]
    fn single_pawn_capture_lifts_to_a_concrete_square() {
        let initial = Position::new();
        // White's e-pawn captures black's d-pawn, landing on d3 and
        // doubling white's d-file pawns.
        let goal =
            Position::from_fen("rnbqkbnr/ppp1pppp/8/8/8/3P4/PPPP1PPP/RNBQKBNR w KQkq - 0 1").unwrap();
        let mv = PkMove::PawnTakesPawn { color: Color::White, from_file: 4, from_idx: 0, to_file: 3, to_idx: 1 };
        let kernel = ExtendedKernel::new(&initial);
        let result = kernel.find_ext_kernel(&goal, std::slice::from_ref(&mv)).unwrap();
        assert!(result.is_some());
    }

    #[test]
    fn display_renders_known_squares_and_omits_unresolved_ones() {
        let resolved = ExtPkMove {
            color: Color::White,
            moving_piece: Some(PieceKind::Pawn),
            from: (4, 3),
            capture: true,
            captured_kind: PieceKind::Pawn,
            to: (3, 2),
            promoted_piece: None,
        };
        assert_eq!(resolved.to_string(), "wPe4xd3");

        let unresolved = ExtPkMove {
            color: Color::Black,
            moving_piece: None,
            from: (0, u8::MAX),
            capture: true,
            captured_kind: PieceKind::Rook,
            to: (0, u8::MAX),
            promoted_piece: None,
        };
        assert_eq!(unresolved.to_string(), "bxR");
    }
}
