//! A single background thread that repeatedly pops a job, runs it, and
//! writes its result to the network. Terminates when the queue becomes
//! closed-and-empty, or when a job panics — a panicking handler takes
//! down only the worker that ran it, not the whole pool (see
//! DESIGN.md).

use crate::job::Job;
use crate::job_queue::{JobQueue, QueueClosed};
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

pub struct Worker {
    id: usize,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn new(id: usize, queue: JobQueue<Job>) -> Worker {
        let thread = thread::spawn(move || run(id, queue));
        Worker {
            id,
            thread: Some(thread),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Blocks until the worker's thread has exited. A no-op on the
    /// second call (the handle was already taken).
    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run(id: usize, queue: JobQueue<Job>) {
    loop {
        match queue.pop() {
            Ok(job) => {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| job.execute_and_send()));
                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => log::warn!("worker {id}: {e}"),
                    Err(_) => {
                        log::error!("Worker {id} disconnected due to an error: handler panicked");
                        break;
                    }
                }
            }
            Err(QueueClosed) => {
                log::info!("Worker {id} disconnected: shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Version;
    use std::net::{TcpListener, TcpStream};
    use std::time::Duration;

    fn loopback_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();
        (client, server)
    }

    #[test]
    fn worker_exits_when_queue_closes_while_idle() {
        let queue: JobQueue<Job> = JobQueue::new();
        let mut worker = Worker::new(0, queue.clone());
        std::thread::sleep(Duration::from_millis(20));
        queue.close();
        worker.join();
        assert!(worker.thread.is_none());
    }

    #[test]
    fn worker_survives_a_panicking_job_is_not_required_but_terminates_cleanly() {
        let queue: JobQueue<Job> = JobQueue::new();
        let (_client, server) = loopback_pair();
        let handler: crate::job::Handler = std::sync::Arc::new(|_req| {
            panic!("simulated fatal body I/O failure");
        });
        let req = crate::http::test_support::fake_request(server, Version::V1_1);
        queue.push(Job::new(req, handler));
        let mut worker = Worker::new(0, queue.clone());
        std::thread::sleep(Duration::from_millis(50));
        // The worker thread has already exited on its own after the panic;
        // join() still completes promptly rather than hanging.
        worker.join();
    }
}
