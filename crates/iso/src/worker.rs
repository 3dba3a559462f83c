//! Bounded-lifetime worker for oracle calls that may run arbitrarily long.
//!
//! [`run_bounded`] runs one task on a scoped thread and waits for its result
//! up to a deadline. On expiry the task's [`CancelFlag`] is raised and the
//! thread is joined before returning, so no background work survives the
//! call whatever the outcome.

use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Shared cancellation signal polled by long-running oracle code.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Outcome of [`run_bounded`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bounded<T> {
    /// The task returned within the deadline.
    Completed(T),
    /// The deadline elapsed; the task was cancelled and has terminated.
    TimedOut,
}

/// Runs `task` on a worker thread, waiting at most `deadline` for its result.
///
/// The task receives a [`CancelFlag`] that is raised when the deadline
/// expires. Cooperative tasks should poll it and return early; the call does
/// not return until the worker thread has been joined, so an uncooperative
/// task delays the caller until it finishes on its own. A result produced
/// after the deadline is discarded.
///
/// # Panics
///
/// Resumes the worker's panic, if any, on the calling thread.
pub fn run_bounded<T, F>(deadline: Duration, task: F) -> Bounded<T>
where
    T: Send,
    F: FnOnce(&CancelFlag) -> T + Send,
{
    let cancel = CancelFlag::new();
    let (sender, receiver) = mpsc::channel();

    thread::scope(|scope| {
        let worker_cancel = cancel.clone();
        let worker = scope.spawn(move || {
            // the receiver is gone once the deadline has passed
            let _ = sender.send(task(&worker_cancel));
        });

        let received = receiver.recv_timeout(deadline);
        if let Err(RecvTimeoutError::Timeout) = received {
            tracing::debug!(?deadline, "worker exceeded its deadline, cancelling");
            cancel.cancel();
        }
        if let Err(payload) = worker.join() {
            panic::resume_unwind(payload);
        }

        match received {
            Ok(value) => Bounded::Completed(value),
            Err(_) => Bounded::TimedOut,
        }
    })
}
