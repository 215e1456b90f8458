//! Top-level error and verdict types (spec.md §7).

use std::fmt;

/// The outcome of running the reachability cascade on one goal position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Reachable; carries the proof game as a list of UCI moves.
    Legal { proof: Vec<String> },
    /// Proven unreachable, with a short human-readable reason.
    Illegal { reason: String },
    /// Neither proven nor refuted within the node budget spent so far.
    Unknown { nodes_used: u64 },
}

/// Error categories from spec.md §7.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// Category 1: malformed FEN or PkMove/ExtPkMove text.
    Parse(String),
    /// Category 2: node budget exhausted without a proven verdict.
    ResourceExhausted { used: u64, budget: u64 },
    /// Category 3: logical infeasibility (piece counts, impossible last
    /// move, deadlocked mismatched pieces, unreachable king, a blocked
    /// pawn that needed to move).
    Infeasible(String),
    /// Category 4: an internal invariant was violated (e.g. the
    /// assignment solver returned a non-matching, or kernel make/unmake
    /// was asymmetric). Fatal for the offending task.
    InvariantViolation(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Parse(msg) => write!(f, "parse error: {msg}"),
            EngineError::ResourceExhausted { used, budget } => {
                write!(f, "resource exhausted: used {used} of {budget} nodes")
            }
            EngineError::Infeasible(reason) => write!(f, "infeasible: {reason}"),
            EngineError::InvariantViolation(msg) => write!(f, "internal invariant violated: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl EngineError {
    /// Categories 1-3 are recoverable at the driver; category 4 is
    /// fatal for the offending task (spec.md §7's recovery policy).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EngineError::InvariantViolation(_))
    }
}
