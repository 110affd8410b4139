//! Expectimax search policy for 4096.
//!
//! The searcher alternates maximizing nodes (the player's four directions)
//! with chance nodes (the 90/10 two-or-four spawn in every empty cell),
//! evaluated at the leaves by stage-tiered row heuristics. Iterative
//! deepening bounds wall-clock cost: each depth is searched in full, and
//! when the budget runs out mid-depth the previous completed depth's answer
//! stands.
//!
//! Notes
//! - The row/heuristic tables are process-wide and read-only after first
//!   use; constructors force them for you.
//! - Each [`Searcher`] owns its transposition cache. Searchers can run
//!   side by side (one game each) over the shared tables, but a single
//!   searcher handles one decision at a time.
//! - The search is fully deterministic; randomness happens outside the
//!   engine when the host spawns a tile after applying the decision.
//!
//! Quick start
//! ```
//! use ai_4096::engine::Board;
//! use ai_4096::expectimax::Searcher;
//!
//! let board = Board::from_grid(&[
//!     [2, 0, 0, 0],
//!     [0, 0, 0, 0],
//!     [0, 0, 0, 0],
//!     [0, 0, 0, 2],
//! ])
//! .unwrap();
//! let mut searcher = Searcher::new();
//! assert!(searcher.best_move(board).is_some());
//! ```

use std::time::Duration;

mod cache;
mod eval;
mod search;

pub use cache::TranspositionTable;
pub use search::{SearchStats, Searcher};

/// Knobs for one searcher. Defaults mirror real-time play.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Wall-clock budget per decision (soft: a depth in flight when the
    /// budget expires is abandoned, not interrupted mid-loop).
    pub time_budget: Duration,
    /// Hard cap on iterative-deepening depth.
    pub max_depth: u8,
    /// Transposition cache size as a power-of-two bit width.
    pub cache_bits: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { time_budget: Duration::from_millis(150), max_depth: 8, cache_bits: 20 }
    }
}

/// Bench-only: expose the raw heuristic value for a board.
///
/// Enabled only with the `bench-internal` feature to keep the public API
/// small.
#[cfg(feature = "bench-internal")]
#[inline]
pub fn heuristic_value(board: crate::engine::Board) -> f64 {
    eval::evaluate(board)
}
