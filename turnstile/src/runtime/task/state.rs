/// Task is idle and not scheduled.
///
/// The task exists but is waiting for a wake-up.
pub(crate) const IDLE: usize = 0;

/// Task is queued for execution.
///
/// The task has been scheduled and is waiting in the run queue.
pub(crate) const QUEUED: usize = 1;

/// Task is currently being polled by the executor.
pub(crate) const RUNNING: usize = 2;

/// Task has completed execution.
///
/// The future has returned `Poll::Ready` or panicked and will not be
/// polled again. Wake-ups are ignored.
pub(crate) const COMPLETED: usize = 3;

/// Task has been woken while running.
///
/// The task is re-queued once the current poll returns.
pub(crate) const NOTIFIED: usize = 4;
