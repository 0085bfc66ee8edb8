//! A closable, unbounded-capacity FIFO shared between one producer (the
//! server loop) and N consumers (workers).
//!
//! A single mutex guards both the element list and the closed flag; one
//! condvar is signaled on `push` (wakes one waiter) and on `close` (wakes
//! all waiters). This mirrors the job-server pattern elsewhere in the
//! ecosystem (a `Mutex` + `Condvar` pair guarding shared pool state)
//! rather than layering on top of `std::sync::mpsc`, because `close` must
//! wake every blocked popper at once, not just whichever one happens to
//! be holding a shared receiver lock.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

/// Returned by `pop` once the queue is closed and drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueClosed;

struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

struct Inner<T> {
    state: Mutex<State<T>>,
    not_empty_or_closed: Condvar,
}

/// Shared handle to the queue. Cloning increments the reference count;
/// the queue itself is dropped once the last `Inserter` and every
/// `Extractor` are gone.
pub struct JobQueue<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for JobQueue<T> {
    fn clone(&self) -> Self {
        JobQueue {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> JobQueue<T> {
    pub fn new() -> JobQueue<T> {
        JobQueue {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    items: VecDeque::new(),
                    closed: false,
                }),
                not_empty_or_closed: Condvar::new(),
            }),
        }
    }

    /// Appends to the tail and wakes one waiter.
    ///
    /// # Panics
    ///
    /// Panics if the queue has already been closed — pushing after close
    /// is a programming error, not a recoverable condition.
    pub fn push(&self, item: T) {
        let mut state = self.inner.state.lock().unwrap();
        assert!(!state.closed, "push on a closed JobQueue");
        state.items.push_back(item);
        drop(state);
        self.inner.not_empty_or_closed.notify_one();
    }

    /// Removes and returns the head, blocking until one is available or
    /// the queue is closed. Items enqueued before `close()` are always
    /// delivered before `QueueClosed` is reported.
    pub fn pop(&self) -> Result<T, QueueClosed> {
        let mut state = self.inner.state.lock().unwrap();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Ok(item);
            }
            if state.closed {
                return Err(QueueClosed);
            }
            state = self.inner.not_empty_or_closed.wait(state).unwrap();
        }
    }

    /// Sets the closed flag and wakes every waiter. Idempotent: a second
    /// call (e.g. a redundant call from a destructor) is silently
    /// absorbed.
    pub fn close(&self) {
        let mut state = self.inner.state.lock().unwrap();
        if state.closed {
            return;
        }
        state.closed = true;
        drop(state);
        self.inner.not_empty_or_closed.notify_all();
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().unwrap().closed
    }
}

impl<T> Default for JobQueue<T> {
    fn default() -> Self {
        JobQueue::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn fifo_single_consumer() {
        let q: JobQueue<i32> = JobQueue::new();
        q.push(1);
        q.push(2);
        q.push(3);
        assert_eq!(q.pop(), Ok(1));
        assert_eq!(q.pop(), Ok(2));
        assert_eq!(q.pop(), Ok(3));
    }

    #[test]
    fn pop_after_close_drains_then_fails() {
        let q: JobQueue<i32> = JobQueue::new();
        q.push(1);
        q.close();
        assert_eq!(q.pop(), Ok(1));
        assert_eq!(q.pop(), Err(QueueClosed));
        assert_eq!(q.pop(), Err(QueueClosed));
    }

    #[test]
    fn close_is_idempotent() {
        let q: JobQueue<i32> = JobQueue::new();
        q.close();
        q.close();
        assert!(q.is_closed());
    }

    #[test]
    #[should_panic(expected = "push on a closed JobQueue")]
    fn push_after_close_is_fatal() {
        let q: JobQueue<i32> = JobQueue::new();
        q.close();
        q.push(1);
    }

    #[test]
    fn close_wakes_all_blocked_poppers() {
        let q: JobQueue<i32> = JobQueue::new();
        let n = 4;
        let barrier = Arc::new(Barrier::new(n + 1));

        let handles: Vec<_> = (0..n)
            .map(|_| {
                let q = q.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    q.pop()
                })
            })
            .collect();

        barrier.wait();
        thread::sleep(Duration::from_millis(50));
        q.close();

        for h in handles {
            assert_eq!(h.join().unwrap(), Err(QueueClosed));
        }
    }

    #[test]
    fn no_loss_no_duplication_across_many_consumers() {
        let q: JobQueue<usize> = JobQueue::new();
        let total = 200;
        for i in 0..total {
            q.push(i);
        }
        q.close();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let q = q.clone();
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    while let Ok(item) = q.pop() {
                        seen.push(item);
                    }
                    seen
                })
            })
            .collect();

        let mut all: Vec<usize> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        all.sort_unstable();
        assert_eq!(all, (0..total).collect::<Vec<_>>());
    }
}
