use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::jobs::{Job, JobPool};
use crate::{Error, Result};

/// Lets background work poke the presentation thread.
pub trait Wakeup: Send + Sync + 'static {
    fn wake(&self);
}

impl Wakeup for () {
    fn wake(&self) {}
}

/// Where the display components run their work.
///
/// Background jobs may run on any thread. The two presentation hooks only
/// ask the owner of the presentation thread to come back and pump: it
/// answers `wake_presentation` by calling `update()` on its nodes and
/// `request_display_tick` by calling `display_tick()` on the next frame.
pub trait Scheduler: Send + Sync + 'static {
    /// Fails when the job can't be queued; it will never run.
    fn run_background(&self, job: Job) -> Result<()>;

    fn wake_presentation(&self);

    fn request_display_tick(&self);
}

/// A [`JobPool`] for background work plus a wakeup hook for the UI loop.
pub struct PoolScheduler<W = ()> {
    pool: JobPool,
    wakeup: W,
}

impl<W: Wakeup> PoolScheduler<W> {
    pub fn new(pool: JobPool, wakeup: W) -> Self {
        Self { pool, wakeup }
    }

    pub fn pool(&self) -> &JobPool {
        &self.pool
    }
}

impl<W: Wakeup> Scheduler for PoolScheduler<W> {
    fn run_background(&self, job: Job) -> Result<()> {
        self.pool.schedule_no_output(job)
    }

    fn wake_presentation(&self) {
        self.wakeup.wake();
    }

    fn request_display_tick(&self) {
        self.wakeup.wake();
    }
}

/// Queues background jobs until the owner runs them.
///
/// Useful for hosts that want to drive everything from one loop, and for
/// deterministic tests.
#[derive(Default)]
pub struct ManualScheduler {
    background: Mutex<VecDeque<Job>>,
    presentation_wakes: AtomicUsize,
    display_tick_requests: AtomicUsize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_background(&self) -> usize {
        self.background.lock().map(|queue| queue.len()).unwrap_or(0)
    }

    /// Run the oldest queued job. Returns false if there was none.
    pub fn run_next(&self) -> bool {
        // Pop first so the job can queue more work without deadlocking.
        let job = match self.background.lock() {
            Ok(mut queue) => queue.pop_front(),
            Err(_) => None,
        };

        match job {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Run queued jobs until the queue is empty. Returns how many ran.
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }

    pub fn presentation_wakes(&self) -> usize {
        self.presentation_wakes.load(Ordering::Acquire)
    }

    pub fn display_tick_requests(&self) -> usize {
        self.display_tick_requests.load(Ordering::Acquire)
    }
}

impl Scheduler for ManualScheduler {
    fn run_background(&self, job: Job) -> Result<()> {
        let mut queue = self
            .background
            .lock()
            .map_err(|e| Error::Generic(format!("background queue poisoned: {e}")))?;
        queue.push_back(job);
        Ok(())
    }

    fn wake_presentation(&self) {
        self.presentation_wakes.fetch_add(1, Ordering::AcqRel);
    }

    fn request_display_tick(&self) {
        self.display_tick_requests.fetch_add(1, Ordering::AcqRel);
    }
}
