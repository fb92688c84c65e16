pub mod job;
pub mod pool;
pub mod queue;
pub mod tasks;

pub use job::{Job, JobKind, JobResult};
pub use pool::{PoolHandle, WorkerPool};
pub use queue::{JobQueue, QueueError, RecordingQueue};
