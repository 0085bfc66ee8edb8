//! Owns N workers and the single producer handle to the job queue.
//!
//! Structurally this is the teacher repo's `ThreadPool`/`Worker`/`Drop`
//! shape (spawn N workers around a shared receiver, join them in `Drop`),
//! generalized from `std::sync::mpsc` onto the closable `JobQueue` this
//! spec requires, so that `close()` wakes every blocked worker at once
//! rather than relying on the cascade of one-at-a-time `mpsc::Receiver`
//! wakeups.

use crate::job::Job;
use crate::job_queue::JobQueue;
use crate::worker::Worker;

pub struct WorkerPool {
    queue: JobQueue<Job>,
    workers: Vec<Worker>,
    closed: bool,
}

impl WorkerPool {
    /// Creates a pool of `size` workers around a fresh job queue.
    ///
    /// # Panics
    ///
    /// Panics if `size == 0` — matching the teacher's own
    /// `assert!(size > 0)`; a pool with no workers can never drain its
    /// queue, so it is a construction error rather than a valid empty
    /// pool.
    pub fn new(size: usize) -> WorkerPool {
        assert!(size > 0, "WorkerPool size must be at least 1");

        let queue = JobQueue::new();
        let workers = (0..size)
            .map(|id| Worker::new(id, queue.clone()))
            .collect();

        WorkerPool {
            queue,
            workers,
            closed: false,
        }
    }

    /// Enqueues a job for some worker to pick up. Never blocks beyond the
    /// queue's internal mutex.
    ///
    /// # Panics
    ///
    /// Panics if called after `close()` — submitting into a shut-down
    /// pool is a logic error.
    pub fn submit(&self, job: Job) {
        self.queue.push(job);
    }

    /// Closes the queue and joins every worker, in reverse spawn order.
    /// Idempotent: calling this explicitly and then letting `Drop` run
    /// again is silently absorbed.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.queue.close();
        for worker in self.workers.iter_mut().rev() {
            log::debug!("joining worker {}", worker.id());
            worker.join();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.close();
    }
}
