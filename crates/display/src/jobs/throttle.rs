//! Single-flight, latest-wins job runner.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel as chan;

use crate::jobs::Scheduler;

/// A single-slot cell. Latching overwrites whatever was there.
#[derive(Debug)]
pub struct Latch<T> {
    slot: Option<T>,
}

impl<T> Default for Latch<T> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<T> Latch<T> {
    /// Store `value`, returning the unconsumed value it replaced.
    pub fn latch(&mut self, value: T) -> Option<T> {
        self.slot.replace(value)
    }

    pub fn take(&mut self) -> Option<T> {
        self.slot.take()
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}

/// What happened to a submitted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submitted {
    /// Started running right away
    Started,
    /// Latched behind the running job
    Latched,
    /// Latched, dropping an older pending input
    Replaced,
    /// The scheduler refused the job; nothing is in flight
    Rejected,
}

struct Completed<O> {
    generation: u64,
    /// `None` when the job panicked
    output: Option<O>,
}

type RunFn<I, O> = dyn Fn(I) -> O + Send + Sync;

/// Runs at most one job at a time; while one runs, only the newest input waits.
///
/// Owned by the presentation side. Outputs travel back through a channel and
/// are handed out by [`Throttled::take_completed`], which also starts the
/// latched input. Cancelling bumps a generation counter shared with the
/// background jobs: jobs of an older generation skip their work and their
/// outputs are discarded.
pub struct Throttled<I, O> {
    scheduler: Arc<dyn Scheduler>,
    run: Arc<RunFn<I, O>>,
    synchronous: bool,
    generation: Arc<AtomicU64>,
    in_flight: bool,
    pending: Latch<I>,
    completed_tx: chan::Sender<Completed<O>>,
    completed_rx: chan::Receiver<Completed<O>>,
}

impl<I, O> Throttled<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub fn new(
        scheduler: Arc<dyn Scheduler>,
        run: impl Fn(I) -> O + Send + Sync + 'static,
    ) -> Self {
        let (completed_tx, completed_rx) = chan::unbounded();
        Self {
            scheduler,
            run: Arc::new(run),
            synchronous: false,
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: false,
            pending: Latch::default(),
            completed_tx,
            completed_rx,
        }
    }

    /// Run inline on the caller's thread instead of on the scheduler.
    pub fn set_synchronous(&mut self, synchronous: bool) {
        self.synchronous = synchronous;
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn submit(&mut self, input: I) -> Submitted {
        if !self.in_flight {
            return if self.start(input) {
                Submitted::Started
            } else {
                Submitted::Rejected
            };
        }

        if self.pending.latch(input).is_some() {
            tracing::debug!("replacing pending throttled input");
            Submitted::Replaced
        } else {
            Submitted::Latched
        }
    }

    /// Outputs of finished jobs, oldest first. Starts the latched input once
    /// the running job has finished, whether it produced an output or panicked.
    #[profiling::function]
    pub fn take_completed(&mut self) -> Vec<O> {
        let mut outputs = Vec::new();
        let current = self.generation.load(Ordering::Acquire);

        // Synchronous jobs started inside this loop land here too
        while let Ok(completed) = self.completed_rx.try_recv() {
            if completed.generation != current {
                tracing::trace!("discarding output of cancelled job");
                continue;
            }

            self.in_flight = false;
            match completed.output {
                Some(output) => outputs.push(output),
                None => tracing::warn!("throttled job panicked, moving on"),
            }

            if let Some(next) = self.pending.take() {
                self.start(next);
            }
        }

        outputs
    }

    /// Forget the running job and the pending input.
    pub fn cancel(&mut self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.in_flight = false;
        self.pending.clear();
    }

    /// Returns false if the scheduler refused the job.
    fn start(&mut self, input: I) -> bool {
        self.in_flight = true;

        let generation = self.generation.load(Ordering::Acquire);
        let job = {
            let current = self.generation.clone();
            let run = self.run.clone();
            let completed_tx = self.completed_tx.clone();
            let scheduler = self.scheduler.clone();
            move || {
                if current.load(Ordering::Acquire) != generation {
                    tracing::trace!("skipping cancelled job");
                    return;
                }

                // Always report back, or the owner would wait on this job forever.
                let output = panic::catch_unwind(AssertUnwindSafe(|| run(input))).ok();
                if completed_tx.send(Completed { generation, output }).is_err() {
                    tracing::trace!("throttled owner went away before completion");
                    return;
                }
                scheduler.wake_presentation();
            }
        };

        if self.synchronous {
            job();
            return true;
        }

        tracing::trace!("spawning throttled job");
        if let Err(e) = self.scheduler.run_background(Box::new(job)) {
            tracing::error!("could not schedule throttled job: {e}");
            self.in_flight = false;
            return false;
        }
        true
    }
}

impl<I, O> Drop for Throttled<I, O> {
    fn drop(&mut self) {
        // Anything still queued sees a stale generation and bails out.
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::ManualScheduler;
    use std::sync::Mutex;

    fn recording(
        scheduler: &Arc<ManualScheduler>,
    ) -> (Throttled<u32, u32>, Arc<Mutex<Vec<u32>>>) {
        let ran = Arc::new(Mutex::new(Vec::new()));
        let ran_c = ran.clone();
        let throttled = Throttled::new(scheduler.clone(), move |n: u32| {
            ran_c.lock().unwrap().push(n);
            n * 10
        });
        (throttled, ran)
    }

    #[test]
    fn latest_input_wins() {
        let scheduler = Arc::new(ManualScheduler::new());
        let (mut throttled, ran) = recording(&scheduler);

        assert_eq!(throttled.submit(1), Submitted::Started);
        assert_eq!(throttled.submit(2), Submitted::Latched);
        assert_eq!(throttled.submit(3), Submitted::Replaced);
        assert_eq!(throttled.submit(4), Submitted::Replaced);

        // Only the first job has been handed to the scheduler.
        assert_eq!(scheduler.pending_background(), 1);
        scheduler.run_all();
        assert_eq!(throttled.take_completed(), vec![10]);

        // Completion started the latched input.
        assert!(throttled.is_in_flight());
        scheduler.run_all();
        assert_eq!(throttled.take_completed(), vec![40]);
        assert!(!throttled.is_in_flight());

        assert_eq!(*ran.lock().unwrap(), vec![1, 4]);
    }

    #[test]
    fn cancel_discards_running_job() {
        let scheduler = Arc::new(ManualScheduler::new());
        let (mut throttled, ran) = recording(&scheduler);

        throttled.submit(1);
        throttled.submit(2);
        throttled.cancel();
        assert!(!throttled.has_pending());

        scheduler.run_all();
        assert!(throttled.take_completed().is_empty());
        assert!(ran.lock().unwrap().is_empty());
    }

    #[test]
    fn cancel_after_work_ran_discards_output() {
        let scheduler = Arc::new(ManualScheduler::new());
        let (mut throttled, _ran) = recording(&scheduler);

        throttled.submit(1);
        scheduler.run_all();
        throttled.cancel();

        assert_eq!(throttled.submit(2), Submitted::Started);
        scheduler.run_all();
        assert_eq!(throttled.take_completed(), vec![20]);
    }

    #[test]
    fn synchronous_runs_inline() {
        let scheduler = Arc::new(ManualScheduler::new());
        let (mut throttled, _ran) = recording(&scheduler);
        throttled.set_synchronous(true);

        assert_eq!(throttled.submit(5), Submitted::Started);
        assert_eq!(scheduler.pending_background(), 0);
        assert_eq!(throttled.take_completed(), vec![50]);
    }

    #[test]
    fn dropped_owner_skips_queued_job() {
        let scheduler = Arc::new(ManualScheduler::new());
        let (mut throttled, ran) = recording(&scheduler);

        throttled.submit(1);
        drop(throttled);
        scheduler.run_all();
        assert!(ran.lock().unwrap().is_empty());
    }

    #[test]
    fn panicking_job_does_not_wedge() {
        let scheduler = Arc::new(ManualScheduler::new());
        let mut throttled = Throttled::new(scheduler.clone(), |n: u32| {
            if n == 1 {
                panic!("bad input");
            }
            n * 10
        });

        throttled.submit(1);
        assert_eq!(throttled.submit(2), Submitted::Latched);
        scheduler.run_all();

        // The panic yields no output but still starts the latched input.
        assert!(throttled.take_completed().is_empty());
        assert!(throttled.is_in_flight());
        scheduler.run_all();
        assert_eq!(throttled.take_completed(), vec![20]);
        assert!(!throttled.is_in_flight());
    }

    #[test]
    fn synchronous_panic_is_contained() {
        let scheduler = Arc::new(ManualScheduler::new());
        let mut throttled = Throttled::new(scheduler.clone(), |n: u32| {
            if n == 1 {
                panic!("bad input");
            }
            n
        });
        throttled.set_synchronous(true);

        throttled.submit(1);
        assert!(throttled.take_completed().is_empty());
        assert!(!throttled.is_in_flight());
        assert_eq!(throttled.submit(2), Submitted::Started);
        assert_eq!(throttled.take_completed(), vec![2]);
    }

    struct ClosedScheduler;

    impl Scheduler for ClosedScheduler {
        fn run_background(&self, _job: crate::jobs::Job) -> crate::Result<()> {
            Err(crate::Error::PoolClosed)
        }

        fn wake_presentation(&self) {}

        fn request_display_tick(&self) {}
    }

    #[test]
    fn rejected_job_leaves_nothing_in_flight() {
        let mut throttled = Throttled::new(Arc::new(ClosedScheduler), |n: u32| n);

        assert_eq!(throttled.submit(1), Submitted::Rejected);
        assert!(!throttled.is_in_flight());
        assert_eq!(throttled.submit(2), Submitted::Rejected);
        assert!(!throttled.has_pending());
    }

    #[test]
    fn completion_wakes_presentation() {
        let scheduler = Arc::new(ManualScheduler::new());
        let (mut throttled, _ran) = recording(&scheduler);

        throttled.submit(1);
        assert_eq!(scheduler.presentation_wakes(), 0);
        scheduler.run_all();
        assert_eq!(scheduler.presentation_wakes(), 1);
    }
}
