use super::handle::{JoinError, JoinHandle, JoinState};
use super::state::{COMPLETED, IDLE, NOTIFIED, QUEUED, RUNNING};
use crate::runtime::context;
use crate::runtime::executor::queue::RunQueue;

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

/// Key reserved for the future driven by `block_on`.
pub(crate) const ROOT_KEY: usize = usize::MAX;

/// The thread-safe part of a task.
///
/// Wakers point at a `TaskHeader`, never at the future itself. The header
/// knows the task's key in the executor's slab and the run queue to push
/// itself onto when woken, which is all a wake-up needs.
pub(crate) struct TaskHeader {
    /// Slab key of the task, or [`ROOT_KEY`].
    pub(crate) key: usize,

    /// The current lifecycle state of the task (IDLE, RUNNING, etc.).
    state: AtomicUsize,

    /// Run queue the task is pushed onto when woken.
    queue: Arc<RunQueue>,
}

impl TaskHeader {
    /// Creates a header in the `QUEUED` state.
    ///
    /// The caller is responsible for pushing it onto the run queue.
    pub(crate) fn new(key: usize, queue: Arc<RunQueue>) -> Arc<Self> {
        Arc::new(Self {
            key,
            state: AtomicUsize::new(QUEUED),
            queue,
        })
    }

    /// Transitions a dequeued task to `RUNNING`.
    ///
    /// Returns `false` if the task is not runnable, which happens for
    /// entries left in the queue after the task completed.
    pub(crate) fn begin(&self) -> bool {
        self.state
            .compare_exchange(QUEUED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Called after a poll returned `Poll::Pending`.
    ///
    /// Returns to `IDLE` unless a wake-up arrived during the poll, in which
    /// case the task goes straight back to the run queue.
    pub(crate) fn suspend(self: &Arc<Self>) {
        if self
            .state
            .compare_exchange(RUNNING, IDLE, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.state.store(QUEUED, Ordering::Release);
            self.queue.push(self.clone());
        }
    }

    /// Marks the task as finished. Later wake-ups are ignored.
    pub(crate) fn complete(&self) {
        self.state.store(COMPLETED, Ordering::Release);
    }

    /// Signals the task to be rescheduled.
    ///
    /// If the task is `IDLE`, it moves to `QUEUED` and is pushed to the run
    /// queue. If the task is `RUNNING`, it moves to `NOTIFIED` so that it is
    /// re-queued right after its current poll.
    pub(crate) fn wake(self: Arc<Self>) {
        loop {
            let state = self.state.load(Ordering::Acquire);

            match state {
                IDLE => {
                    if self
                        .state
                        .compare_exchange(IDLE, QUEUED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        self.queue.push(self.clone());
                        return;
                    }
                }
                RUNNING => {
                    if self
                        .state
                        .compare_exchange(RUNNING, NOTIFIED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                }
                // Already scheduled or finished.
                _ => return,
            }
        }
    }
}

/// A spawned unit of work, erased over its output type.
///
/// The executor owns tasks as `Box<dyn Runnable>` in its slab.
pub(crate) trait Runnable {
    /// Polls the task once. On completion the output has already been
    /// handed to the task's `JoinHandle`.
    fn poll(&mut self, cx: &mut Context<'_>) -> Poll<()>;

    /// Drops the future, then reports `error` to the `JoinHandle`.
    fn abandon(self: Box<Self>, error: JoinError);
}

/// A spawned future together with the slot its `JoinHandle` reads from.
pub(crate) struct Task<T> {
    future: Pin<Box<dyn Future<Output = T>>>,
    join: Rc<JoinState<T>>,
}

impl<T: 'static> Task<T> {
    /// Wraps `future`, returning the task and the handle observing it.
    pub(crate) fn new<F>(future: F) -> (Self, JoinHandle<T>)
    where
        F: Future<Output = T> + 'static,
    {
        let join = Rc::new(JoinState::new());

        let task = Self {
            future: Box::pin(future),
            join: join.clone(),
        };

        (task, JoinHandle::new(join))
    }
}

impl<T: 'static> Runnable for Task<T> {
    fn poll(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        match self.future.as_mut().poll(cx) {
            Poll::Ready(value) => {
                self.join.complete(Ok(value));
                Poll::Ready(())
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn abandon(self: Box<Self>, error: JoinError) {
        let Task { future, join } = *self;

        // Locals still owned by the future (guards included) go first, so
        // whoever awaits the handle sees their effects.
        drop(future);
        join.complete(Err(error));
    }
}

/// Spawns a future as a task onto the current runtime.
///
/// The future does not need to be `Send`: it runs on the thread driving the
/// runtime. The returned [`JoinHandle`] resolves to the task's output, or to
/// a [`JoinError`] if the task panicked.
///
/// # Panics
///
/// Panics if called outside the context of a running runtime.
///
/// # Examples
///
/// ```rust,ignore
/// let handle = task::spawn(async { 6 * 7 });
/// assert_eq!(handle.await.unwrap(), 42);
/// ```
pub fn spawn<F, T>(future: F) -> JoinHandle<T>
where
    F: Future<Output = T> + 'static,
    T: 'static,
{
    context::with_current(|executor| executor.spawn(future))
        .expect("spawn must be called within the context of a runtime")
}
