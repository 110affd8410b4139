//! ai-4096: a move-search engine for the 4096 sliding-tile puzzle.
//!
//! This crate provides:
//! - A packed `Board` value type with table-driven moves (`engine` module)
//! - A time-budgeted expectimax policy (`expectimax` module)
//! - A thread-isolated request/response boundary for interactive hosts
//!   (`service` module)
//! - A binary trace format for recorded runs (`trace` module)
//!
//! Quick start:
//! ```
//! use ai_4096::engine::{Board, Move};
//! use ai_4096::expectimax::Searcher;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Deterministic board setup with a seeded RNG
//! let mut rng = StdRng::seed_from_u64(42);
//! let board = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
//!
//! // The engine picks a direction; the caller applies it and spawns.
//! let mut searcher = Searcher::new();
//! if let Some(dir) = searcher.best_move(board) {
//!     let outcome = board.shift(dir);
//!     let _next = outcome.board.with_random_tile(&mut rng);
//! }
//! ```
//!
//! The searcher never spawns tiles itself: a turn is "engine decides, host
//! applies the shift, host spawns". Interactive hosts should go through
//! [`service::DecisionService`] so the search runs off their event loop.

pub mod engine;
pub mod expectimax;
pub mod service;
pub mod tables;
pub mod trace;
