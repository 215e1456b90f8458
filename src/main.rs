//! Thin CLI front end: reads goal-position lines from stdin, runs each
//! through the reachability cascade, and writes the annotated result to
//! stdout (spec.md §6). The worker thread pool that would dispatch
//! these lines across many tasks is deliberately out of scope (spec.md
//! §1); this binary only exercises `pipeline::Driver::run_lines`, the
//! strictly sequential convenience driver built for it.

use std::io::{self, BufRead, Write};

use proofgame_engine::config::EngineConfig;
use proofgame_engine::pipeline::Driver;

fn main() {
    let driver = Driver::new(EngineConfig::default());

    let stdin = io::stdin();
    let lines: Vec<String> = stdin.lock().lines().map_while(Result::ok).collect();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in driver.run_lines(lines.iter().map(String::as_str)) {
        if writeln!(out, "{line}").is_err() {
            break;
        }
    }
}
