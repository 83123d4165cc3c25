//! Concurrent bulk reads with in-order streaming delivery.
//!
//! A [`ReadAllJob`] reads one sample per path. In parallel mode the reads
//! run on a rayon pool while the calling thread consumes results through
//! [`ReadAllJob::move_next`] (or the `Iterator` impl). Results are always
//! delivered in path-list order: a slow early path holds back faster later
//! ones.
//!
//! ```text
//!   workers                       consumer
//!   -------                       --------
//!   execute(i) -> slot[i].set()   move_next():
//!              -> signal()          scan slots in order
//!                                   first undelivered slot written? deliver
//!                                   otherwise wait on signal (timeout)
//! ```
//!
//! Per pass every slot moves from undelivered to delivered once. A reset
//! starts a new pass over the already read results.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use rayon::prelude::*;

use crate::collection::SampleHolder;
use crate::scene::Scene;
use crate::schema::Sample;
use crate::util::{Error, Path, Result};

/// Consumer wait bound used when none is configured.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Where the reads of a job run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// All reads on the calling thread, in path order, before the first result.
    Sequential,
    /// Reads on a rayon pool; the calling thread only consumes.
    #[default]
    Parallel,
}

/// Bulk read configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadJobOptions {
    pub mode: ExecutionMode,
    /// Longest a consumer waits for the next result without any progress.
    pub wait_timeout: Duration,
    /// Dedicated pool size; `None` uses the global rayon pool.
    pub num_threads: Option<usize>,
}

impl Default for ReadJobOptions {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Parallel,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            num_threads: None,
        }
    }
}

impl ReadJobOptions {
    pub fn sequential() -> Self {
        Self {
            mode: ExecutionMode::Sequential,
            ..Default::default()
        }
    }

    pub fn parallel() -> Self {
        Self::default()
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn with_num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n.max(1));
        self
    }
}

/// Lifecycle of a [`ReadAllJob`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    /// Nothing dispatched yet.
    Created,
    /// Reads dispatched, nothing consumed.
    Running,
    /// Consumer scanning for the next result.
    Draining,
    /// Consumer waiting for a worker.
    Blocked,
    /// Every result delivered.
    Exhausted,
    /// A wait cycle passed without progress.
    TimedOut,
    /// A read failed.
    Failed,
}

impl JobState {
    /// Check if no further results will be delivered.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted | Self::TimedOut | Self::Failed)
    }
}

enum Outcome<T> {
    Read(Option<T>),
    Excluded,
    Failed,
}

/// State shared between the consumer and the workers of one job.
struct JobShared<T> {
    scene: Arc<Scene>,
    paths: Vec<Path>,
    claimed: Vec<AtomicBool>,
    results: Vec<OnceLock<Outcome<T>>>,
    done: Vec<AtomicBool>,
    errors: Vec<Mutex<Option<Error>>>,
    // Readiness signal: generation bumped on every written slot.
    ready: Mutex<u64>,
    ready_cv: Condvar,
}

impl<T: Sample> JobShared<T> {
    fn new(scene: Arc<Scene>, paths: Vec<Path>) -> Self {
        let n = paths.len();
        Self {
            scene,
            paths,
            claimed: (0..n).map(|_| AtomicBool::new(false)).collect(),
            results: (0..n).map(|_| OnceLock::new()).collect(),
            done: (0..n).map(|_| AtomicBool::new(false)).collect(),
            errors: (0..n).map(|_| Mutex::new(None)).collect(),
            ready: Mutex::new(0),
            ready_cv: Condvar::new(),
        }
    }

    /// Read slot `index` unless another thread already has.
    fn execute(&self, index: usize) {
        if self.claimed[index].swap(true, Ordering::AcqRel) {
            return;
        }
        let path = &self.paths[index];
        let outcome = if !self.scene.should_read(path) {
            tracing::trace!(%path, "excluded by access mask");
            self.done[index].store(true, Ordering::Release);
            Outcome::Excluded
        } else {
            match self.scene.read::<T>(path) {
                Ok(sample) => Outcome::Read(sample),
                Err(e) => {
                    tracing::error!(%path, "read failed: {}", e);
                    *self.errors[index].lock() = Some(e);
                    Outcome::Failed
                }
            }
        };
        let _ = self.results[index].set(outcome);
        self.signal();
    }

    fn signal(&self) {
        let mut generation = self.ready.lock();
        *generation = generation.wrapping_add(1);
        self.ready_cv.notify_all();
    }

    fn pending(&self) -> usize {
        self.done
            .iter()
            .filter(|d| !d.load(Ordering::Acquire))
            .count()
    }
}

/// Reads `T` at every path of a list, streaming results in list order.
///
/// All state is owned by the job; concurrent jobs share nothing but the
/// scene.
pub struct ReadAllJob<T: Sample> {
    shared: Arc<JobShared<T>>,
    options: ReadJobOptions,
    _pool: Option<rayon::ThreadPool>, // keeps a dedicated pool alive
    state: JobState,
    current: Option<SampleHolder<T>>,
}

impl<T: Sample> ReadAllJob<T> {
    /// Job with default options (parallel, 1s wait bound).
    pub fn new(scene: Arc<Scene>, paths: Vec<Path>) -> Self {
        Self::with_options(scene, paths, ReadJobOptions::default())
    }

    pub fn with_options(scene: Arc<Scene>, paths: Vec<Path>, options: ReadJobOptions) -> Self {
        Self {
            shared: Arc::new(JobShared::new(scene, paths)),
            options,
            _pool: None,
            state: JobState::Created,
            current: None,
        }
    }

    pub fn len(&self) -> usize {
        self.shared.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.paths.is_empty()
    }

    pub fn paths(&self) -> &[Path] {
        &self.shared.paths
    }

    pub fn options(&self) -> &ReadJobOptions {
        &self.options
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Check if slot `index` holds a result (or was excluded).
    pub fn is_written(&self, index: usize) -> bool {
        self.shared.results.get(index).is_some_and(|r| r.get().is_some())
    }

    /// Check if slot `index` was delivered or skipped in this pass.
    pub fn is_done(&self, index: usize) -> bool {
        self.shared
            .done
            .get(index)
            .is_some_and(|d| d.load(Ordering::Acquire))
    }

    /// Check if slot `index` was skipped by the access mask.
    pub fn is_excluded(&self, index: usize) -> bool {
        matches!(
            self.shared.results.get(index).and_then(|r| r.get()),
            Some(Outcome::Excluded)
        )
    }

    /// Result delivered by the last successful [`move_next`](Self::move_next).
    pub fn current(&self) -> Option<&SampleHolder<T>> {
        self.current.as_ref()
    }

    /// Execute every pending read on the calling thread.
    ///
    /// Results are then consumed without waiting. Reads already picked up by
    /// pool workers are not repeated.
    pub fn run(&mut self) {
        for index in 0..self.len() {
            self.shared.execute(index);
        }
        if self.state == JobState::Created {
            self.state = JobState::Running;
        }
    }

    fn start(&mut self) -> Result<()> {
        let n = self.len();
        tracing::debug!(paths = n, mode = ?self.options.mode, "starting read job");
        match self.options.mode {
            ExecutionMode::Sequential => {
                for index in 0..n {
                    self.shared.execute(index);
                }
            }
            ExecutionMode::Parallel => {
                let shared = Arc::clone(&self.shared);
                let work = move || (0..n).into_par_iter().for_each(|i| shared.execute(i));
                match self.options.num_threads {
                    Some(threads) => {
                        let pool = rayon::ThreadPoolBuilder::new()
                            .num_threads(threads)
                            .thread_name(|i| format!("stagebind-read-{}", i))
                            .build()
                            .map_err(|e| Error::InvalidArgument(format!("read pool: {}", e)))?;
                        pool.spawn(work);
                        self._pool = Some(pool);
                    }
                    None => rayon::spawn(work),
                }
            }
        }
        self.state = JobState::Running;
        Ok(())
    }

    /// Advance to the next result in path order.
    ///
    /// Returns `Ok(false)` once every slot was delivered. A read failure is
    /// returned when its slot is reached and ends the job; so does waiting
    /// a full [`wait_timeout`](ReadJobOptions::wait_timeout) without any
    /// worker progress.
    pub fn move_next(&mut self) -> Result<bool> {
        if self.state.is_terminal() {
            self.current = None;
            return Ok(false);
        }
        if self.state == JobState::Created {
            self.start()?;
        }

        let shared = Arc::clone(&self.shared);
        loop {
            self.state = JobState::Draining;
            let seen = *shared.ready.lock();

            let mut blocked = false;
            for index in 0..shared.paths.len() {
                if shared.done[index].load(Ordering::Acquire) {
                    continue;
                }
                match shared.results[index].get() {
                    None => {
                        blocked = true;
                        break;
                    }
                    Some(Outcome::Excluded) => {
                        shared.done[index].store(true, Ordering::Release);
                    }
                    Some(Outcome::Failed) => {
                        shared.done[index].store(true, Ordering::Release);
                        self.state = JobState::Failed;
                        self.current = None;
                        let err = shared.errors[index].lock().take().unwrap_or_else(|| {
                            Error::store(format!("read of {} failed", shared.paths[index]))
                        });
                        return Err(err);
                    }
                    Some(Outcome::Read(sample)) => {
                        shared.done[index].store(true, Ordering::Release);
                        self.current = Some(SampleHolder {
                            path: shared.paths[index].clone(),
                            sample: sample.clone(),
                        });
                        return Ok(true);
                    }
                }
            }

            if !blocked {
                tracing::debug!(paths = shared.paths.len(), "read job exhausted");
                self.state = JobState::Exhausted;
                self.current = None;
                return Ok(false);
            }

            self.state = JobState::Blocked;
            let mut generation = shared.ready.lock();
            if *generation == seen {
                let timeout = self.options.wait_timeout;
                let waited = shared.ready_cv.wait_for(&mut generation, timeout);
                if waited.timed_out() && *generation == seen {
                    drop(generation);
                    let pending = shared.pending();
                    tracing::error!(
                        waited_ms = timeout.as_millis() as u64,
                        pending,
                        "timed out waiting for bulk read results"
                    );
                    self.state = JobState::TimedOut;
                    self.current = None;
                    return Err(Error::Timeout {
                        waited_ms: timeout.as_millis() as u64,
                        pending,
                    });
                }
            }
        }
    }

    /// Start a new delivery pass over the results already read.
    ///
    /// No-op before the first read and after a timeout or failure.
    pub fn reset(&mut self) {
        match self.state {
            JobState::Created => return,
            JobState::TimedOut | JobState::Failed => {
                tracing::warn!(state = ?self.state, "reset ignored");
                return;
            }
            _ => {}
        }
        for (index, done) in self.shared.done.iter().enumerate() {
            let excluded = matches!(self.shared.results[index].get(), Some(Outcome::Excluded));
            done.store(excluded, Ordering::Release);
        }
        self.current = None;
        self.state = JobState::Draining;
    }

    /// Finish with the job.
    ///
    /// Reads still running on the pool complete in the background and are
    /// discarded.
    pub fn dispose(self) {
        tracing::trace!(
            paths = self.len(),
            state = ?self.state,
            "read job disposed"
        );
    }
}

impl<T: Sample> Iterator for ReadAllJob<T> {
    type Item = Result<SampleHolder<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.move_next() {
            Ok(true) => self.current.clone().map(Ok),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
