//! Error types for position construction and move parsing.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    TooFewParts { found: usize },
    InvalidPiece { char: char },
    InvalidCastling { char: char },
    InvalidSideToMove { found: String },
    InvalidEnPassant { found: String },
    InvalidRank { rank: usize },
    TooManyFiles { rank: usize, files: usize },
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenError::TooFewParts { found } => write!(f, "FEN must have at least 4 parts, found {found}"),
            FenError::InvalidPiece { char } => write!(f, "invalid piece character '{char}' in FEN"),
            FenError::InvalidCastling { char } => write!(f, "invalid castling character '{char}'"),
            FenError::InvalidSideToMove { found } => write!(f, "invalid side to move '{found}'"),
            FenError::InvalidEnPassant { found } => write!(f, "invalid en passant square '{found}'"),
            FenError::InvalidRank { rank } => write!(f, "invalid rank index {rank} in FEN"),
            FenError::TooManyFiles { rank, files } => write!(f, "too many files ({files}) in rank {rank}"),
        }
    }
}

impl std::error::Error for FenError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveParseError {
    InvalidLength { len: usize },
    InvalidSquare { notation: String },
    InvalidPromotion { char: char },
    IllegalMove { notation: String },
}

impl fmt::Display for MoveParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveParseError::InvalidLength { len } => write!(f, "move must be 4-5 characters, found {len}"),
            MoveParseError::InvalidSquare { notation } => write!(f, "invalid square notation in '{notation}'"),
            MoveParseError::InvalidPromotion { char } => write!(f, "invalid promotion piece '{char}'"),
            MoveParseError::IllegalMove { notation } => write!(f, "illegal move '{notation}'"),
        }
    }
}

impl std::error::Error for MoveParseError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SquareError {
    RankOutOfBounds { rank: usize },
    FileOutOfBounds { file: usize },
    InvalidNotation { notation: String },
}

impl fmt::Display for SquareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SquareError::RankOutOfBounds { rank } => write!(f, "rank {rank} out of bounds"),
            SquareError::FileOutOfBounds { file } => write!(f, "file {file} out of bounds"),
            SquareError::InvalidNotation { notation } => write!(f, "invalid square notation '{notation}'"),
        }
    }
}

impl std::error::Error for SquareError {}
