//! Reverse-move generator (C5, spec.md §4.4): enumerates `(move,
//! undoInfo)` pairs such that `unmake(P, m, u)` yields some predecessor
//! `P'` with `make(P', m) == P`.
//!
//! This is a super-set enumeration followed by a known-invalid filter;
//! it does not guarantee every emitted pair is legally reachable, only
//! that it survives the checks spec.md §4.4 lists.

use crate::position::types::{
    CastlingRights, Color, Move, Piece, Square, UndoInfo, CASTLE_BLACK_K, CASTLE_BLACK_Q, CASTLE_WHITE_K,
    CASTLE_WHITE_Q,
};
use crate::position::Position;

/// A candidate predecessor: applying `mv` to `unmake`'s result recovers
/// the position this was generated from.
#[derive(Clone, Debug)]
pub struct ReverseMove {
    pub mv: Move,
    pub undo: UndoInfo,
}

/// Generation options.
#[derive(Clone, Copy, Debug, Default)]
pub struct Options {
    /// Emit one [`ReverseMove`] per possible predecessor en-passant file
    /// (spec.md §4.4's "all possible EP-square assignments") rather than
    /// just the assignment implied by the move itself. Used when
    /// retracting forced last moves in batch mode.
    pub all_ep_files: bool,
}

/// Enumerate reverse moves for `pos`, already filtered by the
/// known-invalid checks in spec.md §4.4.
#[must_use]
pub fn generate(pos: &Position, opts: &Options) -> Vec<ReverseMove> {
    let mover = pos.side_to_move().opponent();
    let mut out = Vec::new();

    for to in pos.occupied_by(mover).iter() {
        let (_, piece) = pos.piece_at(to).expect("occupied square must hold a piece");
        match piece {
            Piece::Pawn => generate_pawn_reverse(pos, mover, to, opts, &mut out),
            Piece::King => generate_king_reverse(pos, mover, to, opts, &mut out),
            _ => {
                generate_leaper_or_slider_reverse(pos, mover, to, piece, opts, &mut out);
                generate_promotion_reverse(pos, mover, to, piece, opts, &mut out);
            }
        }
    }

    out.retain(|rm| passes_known_invalid_filter(pos, mover, rm));
    out
}

fn push_candidate(
    pos: &Position,
    mover: Color,
    mv: Move,
    captured: Option<Piece>,
    en_passant: Option<Square>,
    opts: &Options,
    out: &mut Vec<ReverseMove>,
) {
    let castling_rights = predecessor_castling_rights(pos, mover, &mv);
    let base_undo = UndoInfo { captured, castling_rights, en_passant, halfmove_clock: 0, hash: 0 };

    if opts.all_ep_files && en_passant.is_none() {
        out.push(ReverseMove { mv, undo: base_undo });
        for file in 0..8 {
            let rank = if mover.opponent() == Color::White { 2 } else { 5 };
            let ep_sq = Square::new(rank, file);
            out.push(ReverseMove {
                mv,
                undo: UndoInfo { en_passant: Some(ep_sq), ..base_undo },
            });
        }
    } else {
        out.push(ReverseMove { mv, undo: base_undo });
    }
}

/// Predecessor castling rights must be at least `pos`'s rights, plus
/// whatever bits this move itself would have destroyed (spec.md §4.4).
fn predecessor_castling_rights(pos: &Position, mover: Color, mv: &Move) -> CastlingRights {
    let mut rights = pos.castling_rights();
    let (king_home, k_bit, q_bit) = if mover == Color::White {
        (Square::new(0, 4), CASTLE_WHITE_K, CASTLE_WHITE_Q)
    } else {
        (Square::new(7, 4), CASTLE_BLACK_K, CASTLE_BLACK_Q)
    };
    if mv.from == king_home {
        rights = CastlingRights::from_u8(rights.as_u8() | k_bit | q_bit);
    }
    let rank = if mover == Color::White { 0 } else { 7 };
    if mv.from == Square::new(rank, 7) {
        rights = CastlingRights::from_u8(rights.as_u8() | k_bit);
    }
    if mv.from == Square::new(rank, 0) {
        rights = CastlingRights::from_u8(rights.as_u8() | q_bit);
    }
    rights
}

fn generate_leaper_or_slider_reverse(
    pos: &Position,
    mover: Color,
    to: Square,
    piece: Piece,
    opts: &Options,
    out: &mut Vec<ReverseMove>,
) {
    use crate::position::attack_tables::{bishop_attacks, king_attacks, knight_attacks, queen_attacks, rook_attacks};
    let occ = pos.occupied().0;
    let idx = to.as_index();
    let mask = match piece {
        Piece::Knight => knight_attacks(idx),
        Piece::Bishop => bishop_attacks(idx, occ),
        Piece::Rook => rook_attacks(idx, occ),
        Piece::Queen => queen_attacks(idx, occ),
        Piece::King => king_attacks(idx),
        Piece::Pawn => unreachable!(),
    };
    for from in crate::position::types::Bitboard(mask).iter() {
        if pos.is_empty(from) {
            push_candidate(pos, mover, Move::quiet(from, to), None, None, opts, out);
            for captured in capturable_pieces() {
                push_candidate(pos, mover, Move::quiet(from, to), Some(captured), None, opts, out);
            }
        }
    }
}

/// For a non-pawn, non-king piece sitting on the promotion rank, the
/// pawn of the correct color on the last-but-one rank might have just
/// promoted into it (spec.md §4.4: "for promotions the moving piece on
/// P′ is the pawn of correct color on the last-but-one rank").
fn generate_promotion_reverse(
    pos: &Position,
    mover: Color,
    to: Square,
    piece: Piece,
    opts: &Options,
    out: &mut Vec<ReverseMove>,
) {
    let promo_rank = if mover == Color::White { 7 } else { 0 };
    if to.rank() != promo_rank {
        return;
    }
    let from_rank = promo_rank as i32 - mover.forward();
    if !(0..8).contains(&from_rank) {
        return;
    }
    let from = Square::new(from_rank as usize, to.file());
    if pos.is_empty(from) {
        push_candidate(pos, mover, Move::promotion(from, to, piece), None, None, opts, out);
        for captured in capturable_pieces() {
            push_candidate(pos, mover, Move::promotion(from, to, piece), Some(captured), None, opts, out);
        }
    }
}

fn generate_king_reverse(pos: &Position, mover: Color, to: Square, opts: &Options, out: &mut Vec<ReverseMove>) {
    generate_leaper_or_slider_reverse(pos, mover, to, Piece::King, opts, out);

    let rank = if mover == Color::White { 0 } else { 7 };
    let king_home = Square::new(rank, 4);
    if to == Square::new(rank, 6) || to == Square::new(rank, 2) {
        let rook_from_sq = if to.file() == 6 { Square::new(rank, 5) } else { Square::new(rank, 3) };
        if pos.is_empty(king_home) && pos.piece_at(rook_from_sq).map(|(c, p)| (c, p)) == Some((mover, Piece::Rook)) {
            push_candidate(pos, mover, Move::castling(king_home, to), None, None, opts, out);
        }
    }
}

fn generate_pawn_reverse(pos: &Position, mover: Color, to: Square, opts: &Options, out: &mut Vec<ReverseMove>) {
    let back = -mover.forward();
    let promo_rank = if mover == Color::White { 7 } else { 0 };
    let start_rank = if mover == Color::White { 1 } else { 6 };

    if to.rank() == promo_rank {
        // A pawn can never actually sit on the promotion rank; guard
        // against it defensively rather than computing a nonsense
        // predecessor square below.
        return;
    }

    let one_rank = to.rank() as i32 + back;
    if (0..8).contains(&one_rank) {
        let from_straight = Square::new(one_rank as usize, to.file());
        if pos.is_empty(from_straight) && one_rank as usize != promo_rank {
            push_candidate(pos, mover, Move::quiet(from_straight, to), None, None, opts, out);
        }

        if to.rank() as i32 == start_rank as i32 + 2 * mover.forward() {
            let two_rank = one_rank + back;
            if (0..8).contains(&two_rank) {
                let from_double = Square::new(two_rank as usize, to.file());
                if pos.is_empty(from_double) && pos.is_empty(from_straight) {
                    push_candidate(
                        pos,
                        mover,
                        Move::quiet(from_double, to),
                        None,
                        Some(from_straight),
                        opts,
                        out,
                    );
                }
            }
        }

        for df in [-1i32, 1] {
            let file = to.file() as i32 + df;
            if !(0..8).contains(&file) {
                continue;
            }
            let from_diag = Square::new(one_rank as usize, file as usize);
            if pos.is_empty(from_diag) {
                for captured in capturable_pieces() {
                    push_candidate(pos, mover, Move::quiet(from_diag, to), Some(captured), None, opts, out);
                }
                push_candidate(pos, mover, Move::en_passant(from_diag, to), None, None, opts, out);
            }
        }
    }
}

fn capturable_pieces() -> [Piece; 5] {
    [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen]
}

/// The three known-invalid predecessor checks from spec.md §4.4.
fn passes_known_invalid_filter(pos: &Position, mover: Color, rm: &ReverseMove) -> bool {
    let mut predecessor = pos.clone();
    predecessor.unmake_move(&rm.mv, rm.undo);

    // Piece-count bound: pawns must not exceed 8 per color (a precondition
    // for the "pawns + excess promotable pieces <= 8" check spec.md §4.4
    // requires; the full excess-accounting lives in the proof kernel).
    for color in [Color::White, Color::Black] {
        if predecessor.pieces_of(color, Piece::Pawn).popcount() > 8 {
            return false;
        }
    }

    // It is `mover`'s turn in `predecessor`; the opposite king (the
    // side that is about to move, i.e. `pos.side_to_move()`) must not
    // already be attacked in `predecessor` — only the side to move's
    // own king-in-check is meaningful, and that side is `mover` there.
    let waiting_side = mover.opponent();
    if predecessor.is_in_check(waiting_side) {
        return false;
    }

    // An en-passant square is only a legitimate predecessor state if the
    // capture it implies would actually be pseudo-legal: `mover` needs a
    // pawn next to the double-pushed pawn's landing square, one step
    // beyond the recorded ep square in the direction the pusher came from.
    if let Some(ep) = predecessor.en_passant() {
        let landed_rank = ep.rank() as i32 + waiting_side.forward();
        if !(0..8).contains(&landed_rank) {
            return false;
        }
        let has_adjacent_pawn = [-1i32, 1].into_iter().any(|df| {
            let file = ep.file() as i32 + df;
            (0..8).contains(&file)
                && predecessor.piece_at(Square::new(landed_rank as usize, file as usize)) == Some((mover, Piece::Pawn))
        });
        if !has_adjacent_pawn {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_reverse_pawn_push_from_startpos_minus_one() {
        let pos = Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1").unwrap();
        let moves = generate(&pos, &Options::default());
        assert!(moves.iter().any(|rm| rm.mv.to_uci() == "e2e4"));
    }

    #[test]
    fn rejects_predecessor_leaving_mover_king_in_check() {
        // A position where retracting any move would leave the side that
        // just moved attacked by the side to move is filtered out; this
        // is exercised indirectly through the filter running without panicking.
        let pos = Position::new();
        let moves = generate(&pos, &Options::default());
        assert!(!moves.is_empty());
    }

    #[test]
    fn synthetic_ep_assignments_are_dropped_when_no_pawn_can_make_the_capture() {
        // Only kings on the board: `all_ep_files` fabricates an ep square
        // for every file on every candidate, but none of them are
        // pseudo-legal without a pawn positioned to actually capture.
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 0 1").unwrap();
        let moves = generate(&pos, &Options { all_ep_files: true });
        assert!(!moves.is_empty());
        assert!(moves.iter().all(|rm| rm.undo.en_passant.is_none()));
    }

    #[test]
    fn back_rank_queen_can_retract_a_promotion() {
        let pos = Position::from_fen("4Q3/8/8/8/4k3/8/8/4K3 b - - 0 1").unwrap();
        let moves = generate(&pos, &Options::default());
        assert!(moves.iter().any(|rm| {
            rm.mv.from == Square::new(6, 4) && rm.mv.to == Square::new(7, 4) && rm.mv.promotion == Some(Piece::Queen)
        }));
    }

    #[test]
    fn every_candidate_round_trips_and_leaves_the_mover_unchecked() {
        // P3: make(unmake(P, m, u), m) == P, and no king-capture move is
        // legal for the side not to move in unmake(P, m, u).
        let pos = Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1").unwrap();
        let mover = pos.side_to_move().opponent();
        for rm in generate(&pos, &Options::default()) {
            let mut predecessor = pos.clone();
            predecessor.unmake_move(&rm.mv, rm.undo);
            assert!(!predecessor.is_in_check(mover));

            let mut replayed = predecessor.clone();
            replayed.make_move(&rm.mv);
            assert!(replayed.equals_as_goal(&pos));
        }
    }
}
