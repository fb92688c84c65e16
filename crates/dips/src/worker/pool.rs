use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, error, info};

use super::job::{Job, JobResult};
use super::queue::{JobQueue, QueueError};
use super::tasks;
use crate::db::Database;
use crate::search::SearchIndex;
use crate::sync::IndexSynchronizer;

/// Jobs submitted but not finished yet.
#[derive(Default)]
struct PendingJobs {
    count: Mutex<usize>,
    idle: Condvar,
}

impl PendingJobs {
    fn add(&self) {
        if let Ok(mut count) = self.count.lock() {
            *count += 1;
        }
    }

    fn done(&self) {
        if let Ok(mut count) = self.count.lock() {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.idle.notify_all();
            }
        }
    }

    fn wait_idle(&self, timeout: Duration) -> bool {
        let Ok(count) = self.count.lock() else {
            return false;
        };
        match self.idle.wait_timeout_while(count, timeout, |count| *count > 0) {
            Ok((_, result)) => !result.timed_out(),
            Err(_) => false,
        }
    }
}

/// Submission side of a [`WorkerPool`].
///
/// Workers hold one too, so jobs may enqueue follow-up jobs.
#[derive(Clone)]
pub struct PoolHandle {
    job_sender: Sender<Job>,
    shutdown: Arc<AtomicBool>,
    pending: Arc<PendingJobs>,
}

impl JobQueue for PoolHandle {
    fn submit(&self, job: Job) -> Result<(), QueueError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(QueueError::ChannelClosed);
        }

        self.pending.add();
        self.job_sender.send(job).map_err(|_| {
            self.pending.done();
            QueueError::ChannelClosed
        })
    }
}

pub struct WorkerPool {
    handle: Arc<PoolHandle>,
    result_receiver: Receiver<JobResult>,
    workers: Vec<JoinHandle<()>>,
    synchronizer: IndexSynchronizer,
}

impl WorkerPool {
    /// Starts `worker_count` threads that run jobs against `db` and `index`.
    ///
    /// The job channel is unbounded because workers submit cascade jobs
    /// into it themselves.
    pub fn new(
        db: Database,
        index: Arc<dyn SearchIndex>,
        worker_count: usize,
    ) -> Result<Self, QueueError> {
        if worker_count == 0 {
            return Err(QueueError::NoWorkers);
        }

        let (job_sender, job_receiver) = unbounded::<Job>();
        let (result_sender, result_receiver) = bounded::<JobResult>(worker_count * 64);
        let handle = Arc::new(PoolHandle {
            job_sender,
            shutdown: Arc::new(AtomicBool::new(false)),
            pending: Arc::new(PendingJobs::default()),
        });
        let synchronizer = IndexSynchronizer::new(db, index, handle.clone());

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let result_tx = result_sender.clone();
            let worker_handle = Arc::clone(&handle);
            let worker_sync = synchronizer.clone();

            let worker = thread::Builder::new()
                .name(format!("dips-worker-{}", worker_id))
                .spawn(move || {
                    run_worker(worker_id, job_rx, result_tx, worker_handle, worker_sync);
                })
                .map_err(|e| {
                    handle.shutdown.store(true, Ordering::Relaxed);
                    QueueError::Spawn(e)
                })?;

            workers.push(worker);
        }

        info!("Started {} workers", worker_count);

        Ok(Self {
            handle,
            result_receiver,
            workers,
            synchronizer,
        })
    }

    pub fn handle(&self) -> Arc<PoolHandle> {
        Arc::clone(&self.handle)
    }

    /// A synchronizer whose cascade jobs run on this pool.
    pub fn synchronizer(&self) -> &IndexSynchronizer {
        &self.synchronizer
    }

    pub fn submit(&self, job: Job) -> Result<(), QueueError> {
        self.handle.submit(job)
    }

    pub fn try_recv_result(&self) -> Option<JobResult> {
        self.result_receiver.try_recv().ok()
    }

    pub fn recv_result_timeout(&self, timeout: Duration) -> Option<JobResult> {
        self.result_receiver.recv_timeout(timeout).ok()
    }

    /// Blocks until every submitted job, including follow-up jobs, has
    /// finished. Returns `false` on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.handle.pending.wait_idle(timeout)
    }

    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.handle.shutdown.store(true, Ordering::Relaxed);
    }

    /// Stops the workers and joins them. Jobs still queued are dropped.
    pub fn wait(self) {
        // Workers keep the sender alive through their handles, so the
        // channel never disconnects on its own.
        self.handle.shutdown.store(true, Ordering::Relaxed);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
    }

    pub fn is_shutdown(&self) -> bool {
        self.handle.shutdown.load(Ordering::Relaxed)
    }
}

fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<Job>,
    result_sender: Sender<JobResult>,
    handle: Arc<PoolHandle>,
    sync: IndexSynchronizer,
) {
    debug!("Worker {} started", worker_id);

    loop {
        if handle.shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match job_receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(job) => {
                debug!("Worker {} processing job {} ({})", worker_id, job.id, job.name());

                let result = tasks::run(&sync, &job);
                if result_sender.try_send(result).is_err() {
                    debug!("Worker {} dropped result of job {}", worker_id, job.id);
                }
                handle.pending.done();
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Worker {} job channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}
