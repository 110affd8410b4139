//! The boundary between an interactive host and the search.
//!
//! The search is synchronous, CPU-bound code; a host with an event loop
//! must not run it inline. [`DecisionService`] isolates one [`Searcher`] on
//! a dedicated thread and talks to it over channels: the host hands in a
//! plain snapshot, the worker converts, searches, and sends back the
//! direction. Requests are naturally serialized by the single worker, so
//! the engine is never re-entered while a decision is in flight.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Sender};

use crate::engine::{Board, Grid, GridError, Move};
use crate::expectimax::{SearchConfig, SearchStats, Searcher};

/// Errors surfaced by the decision boundary.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The snapshot failed validation; nothing was searched.
    #[error(transparent)]
    InvalidBoard(#[from] GridError),
    /// The worker thread is gone (only after the service was dropped or the
    /// worker panicked).
    #[error("decision worker disconnected")]
    Disconnected,
}

/// The outcome of one decision request.
#[derive(Debug, Clone, Copy)]
pub struct Decision {
    /// Chosen direction, or `None` when no move is legal (game over from
    /// the caller's perspective).
    pub dir: Option<Move>,
    pub stats: SearchStats,
}

enum Request {
    Decide { grid: Grid, reply: Sender<Result<Decision, GridError>> },
    Reset,
}

/// Handle to the search worker. Cheap to call from a UI/game thread; drops
/// close the channel and join the worker.
pub struct DecisionService {
    tx: Option<Sender<Request>>,
    worker: Option<JoinHandle<()>>,
}

impl DecisionService {
    pub fn spawn(cfg: SearchConfig) -> Self {
        let (tx, rx) = unbounded::<Request>();
        let worker = thread::spawn(move || {
            let mut searcher = Searcher::with_config(cfg);
            while let Ok(req) = rx.recv() {
                match req {
                    Request::Decide { grid, reply } => {
                        let result = Board::from_grid(&grid).map(|board| {
                            let dir = searcher.best_move(board);
                            Decision { dir, stats: searcher.last_stats() }
                        });
                        // A caller that hung up just forfeits its answer.
                        let _ = reply.send(result);
                    }
                    Request::Reset => searcher.reset(),
                }
            }
        });
        Self { tx: Some(tx), worker: Some(worker) }
    }

    /// Ask for the best direction for `grid`, blocking until the search
    /// completes (bounded by the configured time budget).
    pub fn decide(&self, grid: &Grid) -> Result<Option<Move>, ServiceError> {
        Ok(self.decide_with_stats(grid)?.dir)
    }

    /// Like [`decide`](Self::decide), with the search statistics attached.
    pub fn decide_with_stats(&self, grid: &Grid) -> Result<Decision, ServiceError> {
        let Some(tx) = &self.tx else {
            return Err(ServiceError::Disconnected);
        };
        let (reply_tx, reply_rx) = bounded(1);
        tx.send(Request::Decide { grid: *grid, reply: reply_tx })
            .map_err(|_| ServiceError::Disconnected)?;
        let result = reply_rx.recv().map_err(|_| ServiceError::Disconnected)?;
        Ok(result?)
    }

    /// Clear the worker's transposition cache, e.g. between games.
    pub fn reset(&self) -> Result<(), ServiceError> {
        let Some(tx) = &self.tx else {
            return Err(ServiceError::Disconnected);
        };
        tx.send(Request::Reset).map_err(|_| ServiceError::Disconnected)
    }
}

impl Drop for DecisionService {
    fn drop(&mut self) {
        // Closing the request channel ends the worker's recv loop.
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
