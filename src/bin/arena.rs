use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use ai_4096::engine::Board;
use ai_4096::expectimax::{SearchConfig, Searcher};
use ai_4096::{tables, trace};

#[derive(Debug, Parser)]
#[command(name = "arena", about = "Batch self-play runner for the 4096 expectimax engine")]
struct Args {
    /// Number of games to play
    #[arg(long, default_value_t = 1)]
    games: u64,

    /// Per-decision wall-clock budget in milliseconds
    #[arg(long, default_value_t = 150)]
    budget_ms: u64,

    /// Hard cap on search depth
    #[arg(long, default_value_t = 8)]
    max_depth: u8,

    /// Base RNG seed; game i plays with seed+i. Random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Per-game: stop after this many moves
    #[arg(long)]
    steps: Option<u64>,

    /// Per-game: stop once the highest tile reaches this value
    #[arg(long)]
    stop_tile: Option<u32>,

    /// Write one binary trace per game into this directory
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Maximum total GB allowed in out_dir (default 10.0)
    #[arg(long)]
    max_gb: Option<f64>,

    /// Run games sequentially instead of across the rayon pool
    #[arg(long)]
    serial: bool,

    /// Suppress the progress bar
    #[arg(long)]
    quiet: bool,
}

struct GameReport {
    seed: u64,
    moves: u64,
    score: u64,
    highest_tile: u32,
    elapsed_s: f64,
    start_unix_s: u64,
    // Recorded only when traces are requested.
    states: Vec<u64>,
    move_bytes: Vec<u8>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    tables::init();

    let base_seed = args.seed.unwrap_or_else(rand::random);
    let record = args.out_dir.is_some();

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(args.games);
        pb.set_style(ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] {bar:30} {pos}/{len} games | {msg}",
        )?);
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    };

    let start = Instant::now();
    let play = |i: u64| {
        let report = run_single_game(&args, base_seed.wrapping_add(i), record);
        pb.set_message(format!("last: {} (score {})", report.highest_tile, report.score));
        pb.inc(1);
        report
    };
    // Each game owns its searcher and cache; only the read-only row tables
    // are shared across the pool.
    let mut reports: Vec<GameReport> = if args.serial {
        (0..args.games).map(play).collect()
    } else {
        (0..args.games).into_par_iter().map(play).collect()
    };
    pb.finish_and_clear();
    reports.sort_by_key(|r| r.seed);

    if let Some(dir) = &args.out_dir {
        write_traces(dir, &reports, &args)?;
    }
    print_summary(&reports, start.elapsed());
    Ok(())
}

fn run_single_game(args: &Args, seed: u64, record: bool) -> GameReport {
    let start = Instant::now();
    let start_unix_s = trace::now_unix_seconds();
    let mut searcher = Searcher::with_config(SearchConfig {
        time_budget: Duration::from_millis(args.budget_ms),
        max_depth: args.max_depth,
        ..SearchConfig::default()
    });
    let mut rng = StdRng::seed_from_u64(seed);
    let mut board = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);

    let mut states = Vec::new();
    let mut move_bytes = Vec::new();
    if record {
        states.push(board.raw());
    }

    let mut score = 0u64;
    let mut moves = 0u64;
    while let Some(dir) = searcher.best_move(board) {
        let outcome = board.shift(dir);
        score += outcome.points as u64;
        board = outcome.board.with_random_tile(&mut rng);
        moves += 1;
        if record {
            move_bytes.push(trace::move_to_byte(dir));
            states.push(board.raw());
        }
        if args.steps.is_some_and(|cap| moves >= cap) {
            break;
        }
        if args.stop_tile.is_some_and(|target| board.highest_tile() >= target) {
            break;
        }
    }

    GameReport {
        seed,
        moves,
        score,
        highest_tile: board.highest_tile(),
        elapsed_s: start.elapsed().as_secs_f64(),
        start_unix_s,
        states,
        move_bytes,
    }
}

fn write_traces(dir: &Path, reports: &[GameReport], args: &Args) -> Result<()> {
    fs::create_dir_all(dir)?;
    let gb = args.max_gb.unwrap_or(10.0);
    let max_bytes: u64 = if gb.is_finite() && gb > 0.0 { (gb * 1e9) as u64 } else { 10_000_000_000 };
    let mut bytes_written = directory_size_bytes(dir)?;
    let mut skipped = 0u64;

    for report in reports {
        if bytes_written >= max_bytes {
            skipped += 1;
            continue;
        }
        let meta = trace::Meta {
            steps: report.move_bytes.len() as u32,
            start_unix_s: report.start_unix_s,
            elapsed_s: report.elapsed_s as f32,
            score: report.score,
            highest_tile: report.highest_tile,
            budget_ms: args.budget_ms.min(u16::MAX as u64) as u16,
            engine_str: Some(format!("expectimax-d{}", args.max_depth)),
        };
        let bytes = trace::encode_run(&meta, &report.states, &report.move_bytes);
        let path = dir.join(format!("run-{}-{:016x}.a4run", report.start_unix_s, report.seed));
        fs::write(&path, &bytes)?;
        bytes_written = bytes_written.saturating_add(bytes.len() as u64);
    }
    if skipped > 0 {
        eprintln!("Size cap reached in {}: skipped {} trace(s)", dir.display(), skipped);
    }
    Ok(())
}

fn directory_size_bytes(dir: &Path) -> Result<u64> {
    let mut total = 0u64;
    if !dir.exists() {
        return Ok(0);
    }
    for entry in walkdir::WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_file() {
            if let Ok(md) = entry.metadata() {
                total = total.saturating_add(md.len());
            }
        }
    }
    Ok(total)
}

fn print_summary(reports: &[GameReport], elapsed: Duration) {
    if reports.is_empty() {
        println!("No games played.");
        return;
    }
    let games = reports.len() as u64;
    let total_moves: u64 = reports.iter().map(|r| r.moves).sum();
    let total_score: u64 = reports.iter().map(|r| r.score).sum();
    let best = reports.iter().max_by_key(|r| r.score).map(|r| r.score).unwrap_or(0);
    let rate = total_moves as f64 / elapsed.as_secs_f64().max(1e-6);

    let mut tiles: BTreeMap<u32, u64> = BTreeMap::new();
    for report in reports {
        *tiles.entry(report.highest_tile).or_default() += 1;
    }

    println!(
        "Games: {} | avg score: {:.0} | best score: {} | moves: {} ({:.1}/s)",
        games,
        total_score as f64 / games as f64,
        best,
        total_moves,
        rate
    );
    for (tile, count) in tiles.iter().rev() {
        println!(
            "  reached {:>5}: {:>4} ({:.1}%)",
            tile,
            count,
            *count as f64 * 100.0 / games as f64
        );
    }
}
