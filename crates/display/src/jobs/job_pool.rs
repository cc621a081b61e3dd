use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use crossbeam_channel as chan;
use tokio::sync::oneshot;

use crate::{Error, Result};

pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed set of worker threads pulling boxed jobs off a shared queue.
///
/// Workers exit once every handle to the pool is dropped.
#[derive(Clone)]
pub struct JobPool {
    tx: chan::Sender<Job>,
}

impl Default for JobPool {
    fn default() -> Self {
        JobPool::new(2)
    }
}

impl JobPool {
    pub fn new(num_threads: usize) -> Self {
        Self::named(num_threads, "display-job")
    }

    pub fn named(num_threads: usize, worker_name: &str) -> Self {
        let (tx, rx) = chan::unbounded::<Job>();

        let workers = num_threads.max(1);
        for idx in 0..workers {
            let rx = rx.clone();
            let name = format!("{worker_name}-{idx}");
            let spawned = thread::Builder::new().name(name.clone()).spawn(move || {
                while let Ok(job) = rx.recv() {
                    // Keep the worker alive when a job panics.
                    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                        tracing::error!("job panicked on a pool worker");
                    }
                }
                tracing::trace!("job worker shutting down");
            });

            if let Err(e) = spawned {
                tracing::error!("failed to spawn job worker {name}: {e}");
            }
        }

        Self { tx }
    }

    #[profiling::function]
    pub fn schedule_no_output(&self, job: Job) -> Result<()> {
        self.tx.send(job).map_err(|_| Error::PoolClosed)
    }

    /// Run `job` on a worker, resolving to its output.
    pub fn schedule<F, T>(&self, job: F) -> impl Future<Output = Result<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx_result, rx_result) = oneshot::channel::<T>();

        let scheduled = self.schedule_no_output(Box::new(move || {
            let output = job();
            let _ = tx_result.send(output);
        }));

        async move {
            scheduled?;
            rx_result.await.map_err(|_| Error::PoolClosed)
        }
    }
}

/// Compute a worker count based on available parallelism, clamped to a max.
pub fn worker_count(max_workers: usize) -> usize {
    let available = thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(1);
    let max_workers = max_workers.max(1);
    available.clamp(1, max_workers)
}
