mod job_pool;
mod scheduler;
mod throttle;

pub use job_pool::{worker_count, Job, JobPool};
pub use scheduler::{ManualScheduler, PoolScheduler, Scheduler, Wakeup};
pub use throttle::{Latch, Submitted, Throttled};
