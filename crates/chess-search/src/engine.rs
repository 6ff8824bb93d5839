//! Asynchronous search on a dedicated worker thread.
//!
//! The caller and the worker share a single job slot behind a mutex. The
//! caller fills in the root position and parameters, then raises
//! `can_search`; the worker wakes, searches a copy of the position, hands the
//! [`SearchReport`] to the callback and clears the flag. While a request is
//! pending every setter and [`Engine::find_best_move`] is rejected, so the
//! in-flight request is never overwritten.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use chess_core::FenError;
use chess_engine::{FixedHistory, Position};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::search::{SearchReport, Searcher};

const WORKER_STACK: usize = 16 * 1024 * 1024;

/// Errors returned by the [`Engine`] setters.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search depth {depth} out of range: must be between 1 and {limit}")]
    DepthOutOfRange { depth: u8, limit: u8 },
    #[error("Invalid root position: {0}")]
    Fen(#[from] FenError),
    #[error("A search request is already pending")]
    Busy,
    #[error("The search worker is already running")]
    WorkerRunning,
    #[error("Failed to spawn the search worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// The job slot. Everything here is written by the caller between searches
/// and read by the worker when a search starts.
struct Job {
    can_search: bool,
    stop: bool,
    position: Position<FixedHistory>,
    max_depth: u8,
    tt_size_mb: usize,
    resize_tt: bool,
}

struct Shared {
    job: Mutex<Job>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Job> {
        self.job.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A chess engine searching on its own thread.
///
/// ```no_run
/// use chess_search::{Engine, EngineConfig};
///
/// let mut engine = Engine::new(EngineConfig::default())?;
/// engine.start_worker(|report| println!("bestmove {:?}", report.best_move))?;
/// engine.find_best_move();
/// engine.stop();
/// # Ok::<(), chess_search::SearchError>(())
/// ```
pub struct Engine {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::with_checked_config(EngineConfig::default())
    }
}

/// Rejects depths the fixed search history cannot hold.
fn check_depth(depth: u8) -> Result<(), SearchError> {
    let limit = (FixedHistory::PLY_CEILING - 1) as u8;
    if depth == 0 || depth > limit {
        warn!(depth, limit, "search depth rejected");
        return Err(SearchError::DepthOutOfRange { depth, limit });
    }
    Ok(())
}

impl Engine {
    /// Creates an idle engine on the start position. No thread runs until
    /// [`Engine::start_worker`].
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::DepthOutOfRange`] if `config.max_depth` cannot
    /// be searched.
    pub fn new(config: EngineConfig) -> Result<Self, SearchError> {
        check_depth(config.max_depth)?;
        Ok(Engine::with_checked_config(config))
    }

    fn with_checked_config(config: EngineConfig) -> Self {
        let job = Job {
            can_search: false,
            stop: false,
            position: Position::startpos(),
            max_depth: config.max_depth,
            tt_size_mb: config.tt_size_mb,
            resize_tt: false,
        };
        Engine {
            shared: Arc::new(Shared {
                job: Mutex::new(job),
                wake: Condvar::new(),
            }),
            worker: None,
        }
    }

    /// Locks the job slot for a setter, refusing while a request is pending.
    fn idle_job(&self, what: &str) -> Result<MutexGuard<'_, Job>, SearchError> {
        let job = self.shared.lock();
        if job.can_search {
            warn!(setter = what, "search pending; change rejected");
            return Err(SearchError::Busy);
        }
        Ok(job)
    }

    /// Sets the root position from a FEN string.
    pub fn set_position(&self, fen: &str) -> Result<(), SearchError> {
        let position = Position::from_fen(fen)?;
        self.idle_job("position")?.position = position;
        Ok(())
    }

    /// Sets the root position, keeping its repetition history.
    pub fn set_search_position(
        &self,
        position: Position<FixedHistory>,
    ) -> Result<(), SearchError> {
        self.idle_job("position")?.position = position;
        Ok(())
    }

    /// Sets the iterative-deepening limit.
    pub fn set_max_depth(&self, depth: u8) -> Result<(), SearchError> {
        check_depth(depth)?;
        self.idle_job("max_depth")?.max_depth = depth;
        Ok(())
    }

    /// Resizes the transposition table before the next search. The table's
    /// contents are lost.
    pub fn set_tt_size(&self, mb: usize) -> Result<(), SearchError> {
        let mut job = self.idle_job("tt_size")?;
        job.tt_size_mb = mb;
        job.resize_tt = true;
        Ok(())
    }

    pub fn max_depth(&self) -> u8 {
        self.shared.lock().max_depth
    }

    /// Spawns the worker. `callback` runs on the worker thread once per
    /// accepted request, before the request is marked complete.
    pub fn start_worker<F>(&mut self, mut callback: F) -> Result<(), SearchError>
    where
        F: FnMut(SearchReport) + Send + 'static,
    {
        if self.worker.is_some() {
            warn!("search worker already running");
            return Err(SearchError::WorkerRunning);
        }
        self.shared.lock().stop = false;

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("search-worker".to_string())
            .stack_size(WORKER_STACK)
            .spawn(move || run_worker(&shared, &mut callback))?;
        self.worker = Some(handle);
        debug!("search worker started");
        Ok(())
    }

    /// Asks the worker to search the current root position.
    ///
    /// Returns `false`, leaving the pending request untouched, when a search
    /// is already pending or no worker is running.
    pub fn find_best_move(&self) -> bool {
        let mut job = self.shared.lock();
        if self.worker.is_none() || job.stop {
            warn!("no search worker running; request ignored");
            return false;
        }
        if job.can_search {
            warn!("search already pending; request ignored");
            return false;
        }
        job.can_search = true;
        drop(job);
        self.shared.wake.notify_one();
        true
    }

    /// True from an accepted [`Engine::find_best_move`] until its callback
    /// has returned.
    pub fn is_searching(&self) -> bool {
        self.shared.lock().can_search
    }

    /// Stops the worker and waits for it to exit.
    ///
    /// A request the worker has not picked up yet is dropped; a search that
    /// is already running finishes and reports first.
    pub fn stop(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };
        {
            let mut job = self.shared.lock();
            job.stop = true;
        }
        self.shared.wake.notify_all();
        if handle.join().is_err() {
            warn!("search worker panicked");
        }
        // Nothing will consume a request left in the slot.
        self.shared.lock().can_search = false;
        debug!("search worker stopped");
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(shared: &Shared, callback: &mut dyn FnMut(SearchReport)) {
    let mut searcher = {
        let mut job = shared.lock();
        job.resize_tt = false;
        Searcher::new(job.max_depth, job.tt_size_mb)
    };

    loop {
        let mut position = {
            let mut job = shared
                .wake
                .wait_while(shared.lock(), |job| !job.can_search && !job.stop)
                .unwrap_or_else(PoisonError::into_inner);
            if job.stop {
                break;
            }
            if job.resize_tt {
                job.resize_tt = false;
                searcher.resize_tt(job.tt_size_mb);
            }
            searcher.set_max_depth(job.max_depth);
            job.position.fork::<FixedHistory>()
        };

        let report = searcher.search(&mut position);
        callback(report);
        shared.lock().can_search = false;
    }
}
