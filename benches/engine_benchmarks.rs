//! Benchmarks for the reachability cascade's two search stages, on the
//! spec.md §8 scenario positions.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use proofgame_engine::astar::AstarSearch;
use proofgame_engine::kernel::KernelSearch;
use proofgame_engine::position::Position;
use proofgame_engine::EngineConfig;

const SCENARIOS: &[(&str, &str)] = &[
    ("startpos", "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
    ("fianchetto", "rnbqk1nr/ppppppbp/6p1/8/P7/N7/1PPPPPPP/R1BQKBNR w KQkq - 0 1"),
    ("castling_rights_loss", "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1"),
    ("en_passant", "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 1"),
];

fn bench_kernel(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernel");
    let initial = Position::new();

    for (name, fen) in SCENARIOS {
        let goal = Position::from_fen(fen).unwrap();
        group.bench_with_input(BenchmarkId::new("run", name), &goal, |b, goal| {
            b.iter(|| {
                let mut search = KernelSearch::new(1_000_000, 1 << 12, 1 << 20, 0);
                black_box(search.run(&initial, goal))
            })
        });
    }

    group.finish();
}

fn bench_astar(c: &mut Criterion) {
    let mut group = c.benchmark_group("astar");
    group.sample_size(10);
    let initial = Position::new();
    let config = EngineConfig::default();

    for (name, fen) in SCENARIOS {
        let goal = Position::from_fen(fen).unwrap();
        group.bench_with_input(BenchmarkId::new("run", name), &goal, |b, goal| {
            b.iter(|| {
                let search = AstarSearch::new(config.clone());
                black_box(search.run(&initial, goal, config.astar_max_budget))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_kernel, bench_astar);
criterion_main!(benches);
