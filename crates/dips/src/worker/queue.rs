use std::sync::Mutex;

use thiserror::Error;

use super::job::Job;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Job channel closed")]
    ChannelClosed,

    #[error("Worker pool needs at least one worker")]
    NoWorkers,

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Job queue lock poisoned")]
    Poisoned,
}

/// Accepts jobs for asynchronous execution.
pub trait JobQueue: Send + Sync {
    fn submit(&self, job: Job) -> Result<(), QueueError>;
}

/// Keeps submitted jobs in memory without running them.
///
/// Useful when the caller wants to run jobs itself, in order, on its own
/// thread.
#[derive(Default)]
pub struct RecordingQueue {
    jobs: Mutex<Vec<Job>>,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes every job submitted so far, oldest first.
    pub fn drain(&self) -> Vec<Job> {
        self.jobs
            .lock()
            .map(|mut jobs| std::mem::take(&mut *jobs))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().map(|jobs| jobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl JobQueue for RecordingQueue {
    fn submit(&self, job: Job) -> Result<(), QueueError> {
        self.jobs
            .lock()
            .map_err(|_| QueueError::Poisoned)?
            .push(job);
        Ok(())
    }
}
