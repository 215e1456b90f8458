//! Pipeline driver (C10, spec.md §4.10/§6/§7): runs the reachability
//! cascade — kernel search (C6) -> extended-kernel lift (C7) -> repair
//! (C8) -> proof-game A\* (C9) — over one goal position per input line,
//! and serialises the result back into the same `FEN : tokens…` shape.

pub mod line;

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

#[cfg(feature = "logging")]
use log::{debug, info};

use crate::astar::{AstarOutcome, AstarSearch};
use crate::config::EngineConfig;
use crate::error::{EngineError, Verdict};
use crate::extended_kernel::ExtendedKernel;
use crate::kernel::{KernelOutcome, KernelSearch};
use crate::position::Position;
use crate::repair::{self, RepairError};
use line::{find, parse_line, resume_nodes, Token};

/// Which stage a line's prior tokens say it has reached. Matches
/// spec.md §4.10's four dispatch branches; `Kernel` and `Path` are
/// collapsed into one resume path here (see [`Driver::cascade`]'s doc).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Legality {
    Initial,
    Kernel,
    Path,
    Illegal,
    Legal,
    Fail,
}

/// Reads a line's first tag and, for `unknown`, which sub-tokens are
/// already present, to decide where a retried line should resume.
#[must_use]
pub fn legality_of(tokens: &[Token]) -> Legality {
    match tokens.first().map(|t| t.name.as_str()) {
        Some("illegal") => Legality::Illegal,
        Some("legal") => Legality::Legal,
        Some("unknown") => {
            if find(tokens, "fail").is_some() {
                Legality::Fail
            } else if find(tokens, "path").is_some() {
                Legality::Path
            } else if find(tokens, "kernel").is_some() {
                Legality::Kernel
            } else {
                Legality::Initial
            }
        }
        _ => Legality::Initial,
    }
}

/// Runs the cascade for batches of goal FENs, one line at a time.
///
/// `initial` is the position every goal is measured against (spec.md §1:
/// "almost always the standard starting array").
pub struct Driver {
    config: EngineConfig,
    initial: Position,
}

impl Driver {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Driver { config, initial: Position::new() }
    }

    #[must_use]
    pub fn with_initial(config: EngineConfig, initial: Position) -> Self {
        Driver { config, initial }
    }

    /// Processes a single line, returning its annotated output line.
    ///
    /// Malformed input (bad FEN, too few fields) is spec.md §7 category
    /// 1: the line is echoed back with an `info:` note and no legality
    /// tag, rather than failing the whole batch.
    #[must_use]
    pub fn run_one(&self, raw: &str) -> String {
        let parsed = match parse_line(raw) {
            Ok(p) => p,
            Err(EngineError::Parse(msg)) => return format!("{raw} info: {msg}"),
            Err(_) => return format!("{raw} info: unexpected parse failure"),
        };

        if matches!(legality_of(&parsed.tokens), Legality::Illegal | Legality::Legal | Legality::Fail) {
            // Terminal states pass through unchanged (spec.md §4.10).
            return raw.trim_end().to_string();
        }

        let goal = match Position::from_fen(&parsed.fen) {
            Ok(g) => g,
            Err(e) => return format!("{} info: {e}", parsed.fen),
        };

        let resume = resume_nodes(&parsed.tokens);
        #[cfg(feature = "logging")]
        info!("running cascade for {}", parsed.fen);
        let (primary, secondary) = self.cascade(&goal, resume);
        let mut out = vec![primary];
        out.extend(secondary);
        line::format_line(&parsed.fen, &out)
    }

    /// Decides reachability for one goal without the line-oriented text
    /// format: the typed counterpart of [`Driver::run_one`] for library
    /// callers that just want a [`Verdict`] (spec.md §9: "encoded as a
    /// sum type `Result<Verdict, ErrorKind>` returned from each stage").
    #[must_use]
    pub fn verdict(&self, goal: &Position) -> Verdict {
        let (primary, secondary) = self.cascade(goal, None);
        match primary.name.as_str() {
            "legal" => {
                let proof = find(&secondary, "proof").map(|t| t.words.clone()).unwrap_or_default();
                Verdict::Legal { proof }
            }
            "illegal" => Verdict::Illegal { reason: primary.words.join(" ") },
            _ => {
                let nodes_used = find(&secondary, "status")
                    .and_then(|t| t.words.iter().find_map(|w| w.strip_prefix("N=")?.parse().ok()))
                    .unwrap_or(0);
                Verdict::Unknown { nodes_used }
            }
        }
    }

    /// Sequential convenience driver (spec.md §5's `run_lines`):
    /// preserves input order trivially since there is no concurrency.
    /// Blank lines are dropped per spec.md §6.
    #[must_use]
    pub fn run_lines<'a>(&self, lines: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        lines.into_iter().map(str::trim_end).filter(|l| !l.is_empty()).map(|l| self.run_one(l)).collect()
    }

    /// Worker-pool convenience driver (spec.md §5): `config.worker_count`
    /// `std::thread`s pull from a shared mutex-protected queue and write
    /// into a shared mutex-protected completion map; output is
    /// re-sorted to input order before returning. Each call to
    /// [`Driver::run_one`] builds its own kernel/A\* state, so no
    /// per-task state is shared between workers (spec.md §5).
    #[must_use]
    pub fn run_many(&self, lines: Vec<String>) -> Vec<String> {
        let total = lines.len();
        let queue: Mutex<VecDeque<(usize, String)>> = Mutex::new(lines.into_iter().enumerate().collect());
        let results: Mutex<HashMap<usize, String>> = Mutex::new(HashMap::new());
        let worker_count = self.config.worker_count.max(1).min(total.max(1));

        std::thread::scope(|scope| {
            for _ in 0..worker_count {
                scope.spawn(|| loop {
                    let next = queue.lock().pop_front();
                    let Some((idx, line)) = next else { break };
                    let output = self.run_one(&line);
                    results.lock().insert(idx, output);
                });
            }
        });

        let mut results = results.into_inner();
        (0..total).map(|i| results.remove(&i).expect("every queued index produces a result")).collect()
    }

    /// Runs kernel search -> extended-kernel lift -> repair -> A\* for
    /// one goal, returning the legality tag to emit plus the secondary
    /// tokens that go with it.
    ///
    /// Kernel/lift/repair are cheap and deterministic given the same
    /// `random_seed`, so a line resuming at `Legality::Kernel` or
    /// `Legality::Path` simply re-derives them rather than parsing the
    /// persisted `kernel:`/`extKernel:` text back into structured moves
    /// — only the A\* budget is actually carried forward, via
    /// `resume_nodes`. `EngineConfig` exposes a single
    /// `kernel_node_budget` with no separate ceiling (unlike A\*'s
    /// initial/max pair), so exhausting it is always terminal: this
    /// collapses spec.md §4.10's "else leave UNKNOWN for retry with
    /// larger budget" branch for the kernel/repair stages into the same
    /// outcome as "mark FAIL if budget exhausted", since nothing here
    /// would produce a different result on a second attempt.
    fn cascade(&self, goal: &Position, resume: Option<u64>) -> (Token, Vec<Token>) {
        let mut kernel = KernelSearch::new(
            self.config.kernel_node_budget,
            self.config.kernel_tt_initial_entries,
            self.config.kernel_tt_max_entries,
            self.config.random_seed,
        );
        let path = match kernel.run(&self.initial, goal) {
            Err(e) => return (Token::marker("unknown"), vec![Token::text("info", &e.to_string()), Token::marker("fail")]),
            Ok(KernelOutcome::Unsolvable) => {
                return (
                    Token::text("illegal", "no abstract capture/promotion sequence reaches the goal material"),
                    Vec::new(),
                )
            }
            Ok(KernelOutcome::BudgetExhausted { nodes_used }) => {
                return (
                    Token::marker("unknown"),
                    vec![status_token(nodes_used), Token::text("info", "kernel node budget exhausted"), Token::marker("fail")],
                )
            }
            Ok(KernelOutcome::Solved(path)) => path,
        };
        #[cfg(feature = "logging")]
        debug!("kernel solved in {} moves ({} nodes)", path.len(), kernel.nodes_visited());

        let lifter = ExtendedKernel::new(&self.initial);
        let ext_moves = match lifter.find_ext_kernel(goal, &path) {
            Err(e) => return (Token::marker("unknown"), vec![Token::text("info", &e.to_string()), Token::marker("fail")]),
            Ok(None) => {
                return (
                    Token::text("illegal", "no pawn-rank assignment lifts the kernel path to concrete squares"),
                    Vec::new(),
                )
            }
            Ok(Some(moves)) => moves,
        };
        let kernel_token = Token::new("kernel", path.iter().map(ToString::to_string).collect());
        let ext_kernel_token = Token::new("extKernel", ext_moves.iter().map(ToString::to_string).collect());

        let repaired = match repair::repair(&self.initial, &ext_moves) {
            Err(RepairError::NoDispersal { .. }) => {
                return (
                    Token::marker("unknown"),
                    vec![
                        kernel_token,
                        ext_kernel_token,
                        Token::text("info", "no legal dispersal for a shared-square piece (spec.md §9 open question)"),
                        Token::marker("fail"),
                    ],
                )
            }
            Err(e) => return (Token::text("illegal", &e.to_string()), Vec::new()),
            Ok(moves) => moves,
        };
        let path_token = Token::new("path", repaired.iter().map(|m| m.to_uci()).collect());

        let mut budget = resume
            .map(|n| grow_budget(n, &self.config).max(self.config.astar_initial_budget))
            .unwrap_or(self.config.astar_initial_budget);
        let search = AstarSearch::new(self.config.clone());
        loop {
            match search.run(&self.initial, goal, budget) {
                AstarOutcome::Solved(game) => {
                    return (Token::marker("legal"), vec![Token::new("proof", game.to_uci_strings())])
                }
                AstarOutcome::Infeasible(reason) => return (Token::text("illegal", &reason), Vec::new()),
                AstarOutcome::BudgetExhausted { nodes_used } => {
                    if budget >= self.config.astar_max_budget {
                        return (
                            Token::marker("unknown"),
                            vec![
                                kernel_token,
                                ext_kernel_token,
                                path_token,
                                status_token(nodes_used),
                                Token::text("info", "A* max node budget exhausted"),
                                Token::marker("fail"),
                            ],
                        );
                    }
                    budget = grow_budget(budget, &self.config).min(self.config.astar_max_budget);
                }
            }
        }
    }
}

fn status_token(nodes_used: u64) -> Token {
    Token::new("status", vec![format!("N={nodes_used}")])
}

fn grow_budget(budget: u64, config: &EngineConfig) -> u64 {
    budget.saturating_mul(config.astar_budget_growth_num) / config.astar_budget_growth_den.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_to_itself_is_legal_with_empty_proof() {
        let driver = Driver::new(EngineConfig::default());
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        let output = driver.run_one(fen);
        assert!(output.starts_with(fen));
        assert!(output.contains("legal:"));
        assert!(output.contains("proof:"));
    }

    #[test]
    fn verdict_matches_run_one_for_startpos() {
        let driver = Driver::new(EngineConfig::default());
        let goal = Position::new();
        assert_eq!(driver.verdict(&goal), Verdict::Legal { proof: Vec::new() });
    }

    #[test]
    fn verdict_is_illegal_for_an_impossible_pawn_count() {
        let driver = Driver::new(EngineConfig::default());
        let goal =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/1PPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
        assert!(matches!(driver.verdict(&goal), Verdict::Illegal { .. }));
    }

    #[test]
    fn impossible_pawn_count_is_illegal() {
        let driver = Driver::new(EngineConfig::default());
        // White has only 7 pawns with no captures recorded anywhere else
        // consistent with reaching this exact material from the start
        // with zero captures -- the kernel proves it unreachable.
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/1PPPPPPP/RNBQKBNR w KQkq - 0 1";
        let output = driver.run_one(fen);
        assert!(output.contains("illegal:"));
    }

    #[test]
    fn blank_lines_are_dropped_by_run_lines() {
        let driver = Driver::new(EngineConfig::default());
        let lines = vec!["", "   ", "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"];
        let out = driver.run_lines(lines);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn malformed_fen_is_echoed_with_an_info_note() {
        let driver = Driver::new(EngineConfig::default());
        let output = driver.run_one("not-a-fen");
        assert!(output.starts_with("not-a-fen"));
        assert!(output.contains("info:"));
    }

    #[test]
    fn terminal_tagged_lines_pass_through_unchanged() {
        let driver = Driver::new(EngineConfig::default());
        let line = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1 legal: proof: e2e4";
        assert_eq!(driver.run_one(line), line);
    }

    #[test]
    fn run_many_preserves_input_order() {
        let mut config = EngineConfig::default();
        config.worker_count = 4;
        let driver = Driver::new(config);
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        let lines: Vec<String> = (0..8).map(|_| fen.to_string()).collect();
        let out = driver.run_many(lines.clone());
        assert_eq!(out.len(), lines.len());
        for line in &out {
            assert!(line.contains("legal:"));
        }
    }
}
