//! Pseudo-legal move generation for knights, bishops, rooks, queens,
//! and kings (including castling).

use crate::position::attack_tables::{bishop_attacks, queen_attacks, rook_attacks, KING_ATTACKS, KNIGHT_ATTACKS};
use crate::position::state::Position;
use crate::position::types::{
    Bitboard, Color, Move, MoveList, Piece, Square, CASTLE_BLACK_K, CASTLE_BLACK_Q, CASTLE_WHITE_K,
    CASTLE_WHITE_Q,
};

fn push_targets(from: Square, targets: u64, friendly: Bitboard, out: &mut MoveList) {
    let bb = Bitboard(targets & !friendly.0);
    for to in bb.iter() {
        out.push(Move::quiet(from, to));
    }
}

pub(super) fn generate_knights(pos: &Position, color: Color, out: &mut MoveList) {
    let friendly = pos.occupied_by(color);
    for from in pos.pieces_of(color, Piece::Knight).iter() {
        push_targets(from, KNIGHT_ATTACKS[from.as_index()], friendly, out);
    }
}

pub(super) fn generate_king(pos: &Position, color: Color, out: &mut MoveList) {
    let friendly = pos.occupied_by(color);
    let from = pos.king_square(color);
    push_targets(from, KING_ATTACKS[from.as_index()], friendly, out);
    generate_castling(pos, color, out);
}

fn generate_castling(pos: &Position, color: Color, out: &mut MoveList) {
    let rank = if color == Color::White { 0 } else { 7 };
    let king_from = Square::new(rank, 4);
    if pos.king_square(color) != king_from {
        return;
    }
    let rights = pos.castling_rights();
    let occ = pos.occupied();

    let (kingside, queenside) = if color == Color::White {
        (CASTLE_WHITE_K, CASTLE_WHITE_Q)
    } else {
        (CASTLE_BLACK_K, CASTLE_BLACK_Q)
    };

    if rights.as_u8() & kingside != 0 {
        let f = Square::new(rank, 5);
        let g = Square::new(rank, 6);
        if !occ.contains(f) && !occ.contains(g) {
            out.push(Move::castling(king_from, g));
        }
    }
    if rights.as_u8() & queenside != 0 {
        let d = Square::new(rank, 3);
        let c = Square::new(rank, 2);
        let b = Square::new(rank, 1);
        if !occ.contains(d) && !occ.contains(c) && !occ.contains(b) {
            out.push(Move::castling(king_from, c));
        }
    }
}

pub(super) fn generate_sliders(pos: &Position, color: Color, out: &mut MoveList) {
    let friendly = pos.occupied_by(color);
    let occ = pos.occupied().0;

    for from in pos.pieces_of(color, Piece::Bishop).iter() {
        push_targets(from, bishop_attacks(from.as_index(), occ), friendly, out);
    }
    for from in pos.pieces_of(color, Piece::Rook).iter() {
        push_targets(from, rook_attacks(from.as_index(), occ), friendly, out);
    }
    for from in pos.pieces_of(color, Piece::Queen).iter() {
        push_targets(from, queen_attacks(from.as_index(), occ), friendly, out);
    }
}
