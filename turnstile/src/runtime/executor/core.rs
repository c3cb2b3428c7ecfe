use super::queue::RunQueue;
use super::timer::TimerEntry;
use crate::runtime::builder::Config;
use crate::runtime::error::RuntimeError;
use crate::runtime::task::waker::make_waker;
use crate::runtime::task::{JoinError, JoinHandle, ROOT_KEY, Runnable, Task, TaskHeader};
use crate::utils::Slab;

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::BinaryHeap;
use std::future::Future;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::pin::{Pin, pin};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::task::{Context, Poll, Waker};
use std::time::Instant;

/// Heap size below which cancelled timers are left for `next_deadline`.
const MIN_TIMER_SWEEP: usize = 64;

/// Single-threaded cooperative task executor.
///
/// The `Executor` is responsible for:
/// - owning spawned tasks,
/// - polling ready tasks in the order they were woken,
/// - firing timers,
/// - parking the thread while nothing is runnable.
///
/// Exactly one task is polled at any instant; tasks interleave only at
/// their `.await` points.
pub(crate) struct Executor {
    /// Spawned tasks by key. A slot is `None` while its task is being polled.
    tasks: RefCell<Slab<Option<Box<dyn Runnable>>>>,

    /// Ready tasks, shared with every waker.
    queue: Arc<RunQueue>,

    /// Armed timers, earliest deadline first.
    timers: RefCell<BinaryHeap<TimerEntry>>,

    /// Heap size at which cancelled timers are swept out.
    sweep_at: Cell<usize>,
}

impl Executor {
    pub(crate) fn new() -> Self {
        Self {
            tasks: RefCell::new(Slab::new(64)),
            queue: Arc::new(RunQueue::new()),
            timers: RefCell::new(BinaryHeap::new()),
            sweep_at: Cell::new(MIN_TIMER_SWEEP),
        }
    }

    /// Spawns a new task. It first runs on the next scheduler tick.
    pub(crate) fn spawn<F, T>(&self, future: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + 'static,
        T: 'static,
    {
        let (task, handle) = Task::new(future);

        let key = self.tasks.borrow_mut().insert(Some(Box::new(task)));
        self.queue.push(TaskHeader::new(key, self.queue.clone()));

        handle
    }

    /// Arms a timer that wakes `waker` at `deadline` unless cancelled.
    ///
    /// Cancelled entries buried below the earliest deadline are swept out
    /// whenever the heap doubles past its last live size.
    pub(crate) fn register_timer(&self, deadline: Instant, waker: Waker, cancelled: Arc<AtomicBool>) {
        let mut timers = self.timers.borrow_mut();

        if timers.len() >= self.sweep_at.get() {
            let before = timers.len();
            timers.retain(|entry| !entry.is_cancelled());

            log::trace!("swept {} cancelled timer(s)", before - timers.len());
            self.sweep_at.set((timers.len() * 2).max(MIN_TIMER_SWEEP));
        }

        timers.push(TimerEntry {
            deadline,
            waker,
            cancelled,
        });
    }

    /// Drives `future` and every spawned task until `future` completes.
    ///
    /// Each tick polls at most `config.tick_budget` ready tasks, then fires
    /// due timers. When nothing is runnable the thread parks until the next
    /// deadline. With no deadline either, the future can never complete
    /// unless woken from another thread; this is reported as a stall when
    /// stall detection is enabled.
    pub(crate) fn block_on<F: Future>(
        &self,
        future: F,
        config: &Config,
    ) -> Result<F::Output, RuntimeError> {
        let mut future = pin!(future);

        let root = TaskHeader::new(ROOT_KEY, self.queue.clone());
        self.queue.push(root.clone());

        loop {
            for _ in 0..config.tick_budget {
                let Some(header) = self.queue.pop() else {
                    break;
                };

                if header.key != ROOT_KEY {
                    self.run_task(header);
                    continue;
                }

                // Headers of earlier `block_on` calls may still be around.
                if !Arc::ptr_eq(&header, &root) {
                    continue;
                }

                if let Some(output) = self.poll_root(&root, future.as_mut()) {
                    return Ok(output);
                }
            }

            self.fire_timers();

            if !self.queue.is_empty() {
                continue;
            }

            match self.next_deadline() {
                Some(deadline) => self.queue.park(Some(deadline)),
                None if config.stall_detection => {
                    let pending = self.tasks.borrow().len();
                    log::debug!("runtime stalled with {pending} pending task(s)");

                    return Err(RuntimeError::Stalled { pending });
                }
                None => self.queue.park(None),
            }
        }
    }

    /// Drops every task and timer.
    ///
    /// Dropping a task runs the destructors of everything it owns, so
    /// guards held by unfinished tasks are released here.
    pub(crate) fn shutdown(&self) {
        let tasks = self.tasks.borrow_mut().drain();
        drop(tasks);

        let timers = mem::take(&mut *self.timers.borrow_mut());
        drop(timers);

        self.queue.clear();
    }

    fn poll_root<F: Future>(&self, root: &Arc<TaskHeader>, future: Pin<&mut F>) -> Option<F::Output> {
        if !root.begin() {
            return None;
        }

        let waker = make_waker(root.clone());
        let mut cx = Context::from_waker(&waker);

        match future.poll(&mut cx) {
            Poll::Ready(output) => {
                root.complete();
                Some(output)
            }
            Poll::Pending => {
                root.suspend();
                None
            }
        }
    }

    /// Polls one spawned task.
    ///
    /// A panicking task is completed with [`JoinError::Panicked`]; the panic
    /// does not reach the executor.
    fn run_task(&self, header: Arc<TaskHeader>) {
        if !header.begin() {
            return;
        }

        let taken = self
            .tasks
            .borrow_mut()
            .get_mut(header.key)
            .and_then(Option::take);

        let Some(mut task) = taken else {
            return;
        };

        let waker = make_waker(header.clone());
        let mut cx = Context::from_waker(&waker);

        match panic::catch_unwind(AssertUnwindSafe(|| task.poll(&mut cx))) {
            Ok(Poll::Pending) => {
                if let Some(slot) = self.tasks.borrow_mut().get_mut(header.key) {
                    *slot = Some(task);
                }

                header.suspend();
            }
            Ok(Poll::Ready(())) => {
                header.complete();
                self.tasks.borrow_mut().remove(header.key);

                drop(task);
            }
            Err(payload) => {
                header.complete();
                self.tasks.borrow_mut().remove(header.key);

                let message = panic_message(payload.as_ref());
                log::debug!("task {} panicked: {message}", header.key);

                task.abandon(JoinError::Panicked(message));
            }
        }
    }

    /// Wakes every timer whose deadline has passed.
    fn fire_timers(&self) {
        let now = Instant::now();
        let mut due = Vec::new();

        {
            let mut timers = self.timers.borrow_mut();

            while timers.peek().is_some_and(|entry| entry.deadline <= now) {
                if let Some(entry) = timers.pop() {
                    due.push(entry);
                }
            }
        }

        for entry in due {
            if !entry.is_cancelled() {
                entry.waker.wake();
            }
        }
    }

    /// Earliest deadline among armed timers, discarding cancelled ones.
    fn next_deadline(&self) -> Option<Instant> {
        let mut timers = self.timers.borrow_mut();

        while timers.peek().is_some_and(TimerEntry::is_cancelled) {
            timers.pop();
        }

        timers.peek().map(|entry| entry.deadline)
    }
}

/// Extracts a readable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
