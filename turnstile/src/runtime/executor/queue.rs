use crate::runtime::task::TaskHeader;

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Instant;

/// The executor's run queue.
///
/// Woken tasks are pushed to the back and polled from the front, so tasks
/// run in the order they became ready. The queue is the only part of the
/// runtime reachable from other threads (through wakers); it parks the
/// executor thread on a condition variable while there is nothing to run.
pub(crate) struct RunQueue {
    /// Headers of tasks ready to be polled.
    queue: Mutex<VecDeque<Arc<TaskHeader>>>,

    /// Condition variable used to wake the parked executor.
    condvar: Condvar,
}

impl RunQueue {
    /// Creates an empty run queue.
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
        }
    }

    /// Pushes a ready task and unparks the executor.
    pub(crate) fn push(&self, task: Arc<TaskHeader>) {
        self.queue.lock().unwrap().push_back(task);
        self.condvar.notify_one();
    }

    /// Pops the oldest ready task.
    pub(crate) fn pop(&self) -> Option<Arc<TaskHeader>> {
        self.queue.lock().unwrap().pop_front()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.lock().unwrap().is_empty()
    }

    /// Parks the current thread until a task is pushed.
    ///
    /// With a `deadline`, also returns once the deadline has passed.
    pub(crate) fn park(&self, deadline: Option<Instant>) {
        let mut queue = self.queue.lock().unwrap();

        while queue.is_empty() {
            queue = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return;
                    }

                    self.condvar.wait_timeout(queue, deadline - now).unwrap().0
                }
                None => self.condvar.wait(queue).unwrap(),
            };
        }
    }

    /// Drops every queued header.
    ///
    /// Headers point back at this queue, so this breaks the cycle when the
    /// runtime shuts down.
    pub(crate) fn clear(&self) {
        let drained: Vec<_> = self.queue.lock().unwrap().drain(..).collect();
        drop(drained);
    }
}
