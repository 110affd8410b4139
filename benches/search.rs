use std::hint::black_box;
use std::time::Duration;

use ai_4096::engine::Board;
use ai_4096::expectimax::{SearchConfig, Searcher};
use ai_4096::tables;
use criterion::{criterion_group, criterion_main, Criterion};

fn midgame_board() -> Board {
    Board::from_grid(&[
        [256, 64, 8, 2],
        [128, 32, 4, 0],
        [16, 8, 2, 0],
        [2, 0, 0, 0],
    ])
    .expect("valid bench board")
}

fn bench_best_move(c: &mut Criterion) {
    tables::init();
    let board = midgame_board();
    let mut group = c.benchmark_group("search/best_move");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(5));
    for budget_ms in [50u64, 150] {
        group.bench_function(format!("{budget_ms}ms"), |bch| {
            let mut searcher = Searcher::with_config(SearchConfig {
                time_budget: Duration::from_millis(budget_ms),
                ..SearchConfig::default()
            });
            bch.iter(|| black_box(searcher.best_move(board)))
        });
    }
    group.finish();
}

criterion_group!(search, bench_best_move);
criterion_main!(search);
