//! In-order command queue with deferred execution.
//!
//! Enqueued work does not run until the queue is drained by
//! [`CommandQueue::wait_for_events`] or [`CommandQueue::finish`], which
//! models a device executing asynchronously with respect to the host.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use tracing::trace;

use crate::error::{device_error, validation_error, Result};

type Job = Box<dyn FnOnce() -> Result<()> + Send>;

/// Completion handle for one enqueued command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Event {
    queue: usize,
    seq: u64,
}

impl Event {
    pub fn queue_id(&self) -> usize {
        self.queue
    }
}

struct QueueState {
    pending: VecDeque<(u64, Job)>,
    submitted: u64,
    completed: u64,
}

pub struct CommandQueue {
    id: usize,
    state: Mutex<QueueState>,
}

impl fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandQueue")
            .field("id", &self.id)
            .field("pending", &self.pending())
            .finish()
    }
}

impl CommandQueue {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                submitted: 0,
                completed: 0,
            }),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    fn lock(&self) -> Result<MutexGuard<'_, QueueState>> {
        self.state
            .lock()
            .map_err(|_| device_error(-36, format!("command queue {} is poisoned", self.id)))
    }

    /// Appends a command; it runs when the queue is next drained.
    pub fn enqueue<J>(&self, job: J) -> Result<Event>
    where
        J: FnOnce() -> Result<()> + Send + 'static,
    {
        let mut state = self.lock()?;
        state.submitted += 1;
        let seq = state.submitted;
        state.pending.push_back((seq, Box::new(job)));
        trace!(queue = self.id, seq, "enqueued command");
        Ok(Event { queue: self.id, seq })
    }

    /// Number of commands not yet executed.
    pub fn pending(&self) -> usize {
        self.state.lock().map(|s| s.pending.len()).unwrap_or(0)
    }

    /// Runs pending commands in order until `seq` has completed.
    fn run_until(&self, seq: u64) -> Result<()> {
        loop {
            let (job_seq, job) = {
                let mut state = self.lock()?;
                if state.completed >= seq {
                    return Ok(());
                }
                match state.pending.pop_front() {
                    Some(entry) => entry,
                    None => return Ok(()),
                }
            };

            let outcome = job();
            self.lock()?.completed = job_seq;
            outcome?;
        }
    }

    /// Blocks until every event in `events` has completed.
    pub fn wait_for_events(&self, events: &[Event]) -> Result<()> {
        if let Some(foreign) = events.iter().find(|e| e.queue != self.id) {
            return Err(validation_error(format!(
                "event belongs to queue {}, not queue {}",
                foreign.queue, self.id
            )));
        }
        match events.iter().map(|e| e.seq).max() {
            Some(seq) => self.run_until(seq),
            None => Ok(()),
        }
    }

    /// Blocks until all previously enqueued commands have completed.
    pub fn finish(&self) -> Result<()> {
        self.run_until(u64::MAX)
    }

    /// Drops every command that has not run yet, releasing whatever the
    /// commands hold, and returns how many were dropped.
    pub fn discard_pending(&self) -> Result<usize> {
        let dropped: Vec<(u64, Job)> = {
            let mut state = self.lock()?;
            state.completed = state.submitted;
            state.pending.drain(..).collect()
        };
        let count = dropped.len();
        drop(dropped);
        if count > 0 {
            trace!(queue = self.id, count, "discarded pending commands");
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_work_is_deferred_until_finish() {
        let queue = CommandQueue::new(0);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            queue
                .enqueue(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(queue.pending(), 3);

        queue.finish().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_wait_runs_only_up_to_event() {
        let queue = CommandQueue::new(0);
        let first = queue.enqueue(|| Ok(())).unwrap();
        let _second = queue.enqueue(|| Ok(())).unwrap();

        queue.wait_for_events(&[first]).unwrap();
        assert_eq!(queue.pending(), 1);
    }

    #[test]
    fn test_failure_is_reported() {
        let queue = CommandQueue::new(0);
        queue.enqueue(|| Err(device_error(-5, "out of resources"))).unwrap();
        let err = queue.finish().unwrap_err();
        assert!(err.to_string().contains("out of resources"));
    }

    #[test]
    fn test_failure_mid_queue_can_be_discarded() {
        let queue = CommandQueue::new(0);
        let held = Arc::new(());
        queue.enqueue(|| Err(device_error(-5, "out of resources"))).unwrap();
        for _ in 0..2 {
            let held = Arc::clone(&held);
            queue
                .enqueue(move || {
                    drop(held);
                    Ok(())
                })
                .unwrap();
        }
        assert!(queue.finish().is_err());
        assert_eq!(queue.pending(), 2);
        assert_eq!(Arc::strong_count(&held), 3);

        assert_eq!(queue.discard_pending().unwrap(), 2);
        assert_eq!(queue.pending(), 0);
        assert_eq!(Arc::strong_count(&held), 1);
        // nothing left to run
        queue.finish().unwrap();
    }

    #[test]
    fn test_foreign_event_rejected() {
        let a = CommandQueue::new(0);
        let b = CommandQueue::new(1);
        let event = b.enqueue(|| Ok(())).unwrap();
        assert!(a.wait_for_events(&[event]).is_err());
    }
}
