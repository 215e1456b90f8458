//! FEN parsing and serialization.

use super::error::FenError;
use super::state::Position;
use super::types::{castle_char_bit, CastlingRights, Color, Piece, Square};

impl Position {
    /// Parse a FEN string into a position. Accepts the standard six
    /// fields; the halfmove and fullmove counters are optional and
    /// default to zero/one when omitted.
    pub fn from_fen(fen: &str) -> Result<Position, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(FenError::TooFewParts { found: parts.len() });
        }

        let mut pos = Position::empty();
        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::InvalidRank { rank: ranks.len() });
        }
        for (rank_from_top, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_from_top;
            let mut file = 0usize;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as usize;
                } else {
                    if file >= 8 {
                        return Err(FenError::TooManyFiles { rank, files: file + 1 });
                    }
                    let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
                    let piece = Piece::from_char(c).ok_or(FenError::InvalidPiece { char: c })?;
                    pos.set_piece(Square::new(rank, file), color, piece);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::TooManyFiles { rank, files: file });
            }
        }

        pos.side_to_move = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::InvalidSideToMove { found: other.to_string() }),
        };

        let mut rights = CastlingRights::none();
        if parts[2] != "-" {
            for c in parts[2].chars() {
                let bit = castle_char_bit(c).ok_or(FenError::InvalidCastling { char: c })?;
                rights = CastlingRights::from_u8(rights.as_u8() | bit);
            }
        }
        pos.castling_rights = rights;

        pos.en_passant = if parts[3] == "-" {
            None
        } else {
            Some(
                parts[3]
                    .parse::<Square>()
                    .map_err(|_| FenError::InvalidEnPassant { found: parts[3].to_string() })?,
            )
        };

        pos.halfmove_clock = parts.get(4).and_then(|s| s.parse().ok()).unwrap_or(0);

        pos.hash = pos.recompute_hash();
        Ok(pos)
    }

    /// Serialize to FEN. Fullmove number is always emitted as 1 since
    /// the engine does not track it.
    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut ranks = Vec::with_capacity(8);
        for rank in (0..8).rev() {
            let mut s = String::new();
            let mut empty = 0;
            for file in 0..8 {
                let sq = Square::new(rank, file);
                match self.piece_at(sq) {
                    Some((color, piece)) => {
                        if empty > 0 {
                            s.push_str(&empty.to_string());
                            empty = 0;
                        }
                        s.push(piece.to_fen_char(color));
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                s.push_str(&empty.to_string());
            }
            ranks.push(s);
        }
        let board = ranks.join("/");

        let mut castling = String::new();
        if self.castling_rights.has(Color::White, true) {
            castling.push('K');
        }
        if self.castling_rights.has(Color::White, false) {
            castling.push('Q');
        }
        if self.castling_rights.has(Color::Black, true) {
            castling.push('k');
        }
        if self.castling_rights.has(Color::Black, false) {
            castling.push('q');
        }
        if castling.is_empty() {
            castling.push('-');
        }

        let ep = self.en_passant.map_or_else(|| "-".to_string(), |sq| sq.to_string());

        format!(
            "{} {} {} {} {} 1",
            board, self.side_to_move, castling, ep, self.halfmove_clock
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_fen_round_trips() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn parses_en_passant_and_partial_rights() {
        let fen = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1";
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(pos.en_passant(), Some("d6".parse().unwrap()));
        assert_eq!(pos.castling_rights(), CastlingRights::none());
    }

    #[test]
    fn rejects_malformed_fen() {
        assert!(Position::from_fen("not a fen").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8 w - - 0 1").is_err());
    }
}
