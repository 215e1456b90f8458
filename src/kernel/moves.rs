//! The abstract kernel move (`PkMove`, spec.md §3/§4.6) and its text
//! form (spec.md §6): `[w|b]P<file><idx>x(<piece>|<file>)[<file>(<idx>|<piece>)]`.

use crate::position::types::Color;
use std::fmt;

use super::piece_kind::PieceKind;

/// A single kernel move; each decreases total piece count by exactly 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkMove {
    /// Pawn on file `from_file` index `from_idx` captures a pawn on file
    /// `to_file` index `to_idx`.
    PawnTakesPawn { color: Color, from_file: u8, from_idx: u8, to_file: u8, to_idx: u8 },
    /// Pawn on `file` index `idx` captures a piece, optionally promoting;
    /// `other_promotion_file` is set when the captured piece was itself a
    /// pawn that had promoted from a different file.
    PawnTakesPiece {
        color: Color,
        file: u8,
        idx: u8,
        captured: PieceKind,
        promotes_to: Option<PieceKind>,
        other_promotion_file: Option<u8>,
    },
    /// A piece captures a pawn on `file` index `idx`.
    PieceTakesPawn { color: Color, file: u8, idx: u8 },
    /// A piece captures a piece.
    PieceTakesPiece { color: Color, captured: PieceKind },
}

impl PkMove {
    #[must_use]
    pub fn color(self) -> Color {
        match self {
            PkMove::PawnTakesPawn { color, .. }
            | PkMove::PawnTakesPiece { color, .. }
            | PkMove::PieceTakesPawn { color, .. }
            | PkMove::PieceTakesPiece { color, .. } => color,
        }
    }
}

impl fmt::Display for PkMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file_char = |file: u8| (b'a' + file) as char;
        let color_char = |c: Color| if c == Color::White { 'w' } else { 'b' };
        match *self {
            PkMove::PawnTakesPawn { color, from_file, from_idx, to_file, to_idx } => write!(
                f,
                "{}P{}{}xP{}{}",
                color_char(color),
                file_char(from_file),
                from_idx,
                file_char(to_file),
                to_idx
            ),
            PkMove::PawnTakesPiece { color, file, idx, captured, promotes_to, other_promotion_file } => {
                write!(f, "{}P{}{}x{}", color_char(color), file_char(file), idx, captured.to_letter())?;
                if let Some(file) = other_promotion_file {
                    write!(f, "{}", file_char(file))?;
                }
                if let Some(promo) = promotes_to {
                    write!(f, "{}", promo.to_letter())?;
                }
                Ok(())
            }
            PkMove::PieceTakesPawn { color, file, idx } => {
                write!(f, "{}xP{}{}", color_char(color), file_char(file), idx)
            }
            PkMove::PieceTakesPiece { color, captured } => write!(f, "{}x{}", color_char(color), captured.to_letter()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bishop_captures_render_the_two_letter_code() {
        let mv = PkMove::PieceTakesPiece { color: Color::White, captured: PieceKind::DarkBishop };
        assert_eq!(mv.to_string(), "wxDB");
        let mv = PkMove::PieceTakesPiece { color: Color::Black, captured: PieceKind::LightBishop };
        assert_eq!(mv.to_string(), "bxLB");
    }
}
