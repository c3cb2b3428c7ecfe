use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// A fair, non-reentrant asynchronous mutex.
///
/// `Mutex` guards a critical section rather than a value. Tasks that find
/// the lock held are suspended and queued; [`release`](Self::release) hands
/// ownership directly to the oldest waiter, so waiters are admitted in strict
/// arrival order and the lock is never observably free between two holders.
///
/// The mutex is meant for the single-threaded runtime and is `!Sync`. Share
/// it between tasks with an [`Rc`].
///
/// There are no ownership tokens: any caller may [`release`](Self::release),
/// and releasing a free mutex is a no-op. Prefer [`lock`](Self::lock) or
/// [`with_lock`](Self::with_lock), which pair the release for you.
///
/// # Examples
///
/// ```rust,ignore
/// let mutex = Rc::new(Mutex::new());
///
/// let value = mutex.with_lock(|| async { 42 }).await;
/// assert_eq!(value, 42);
/// assert!(!mutex.is_held());
/// ```
pub struct Mutex {
    /// Whether some task currently owns the critical section.
    held: Cell<bool>,

    /// Tasks waiting for ownership, oldest first.
    ///
    /// Never non-empty while `held` is false.
    waiters: RefCell<VecDeque<Rc<Waiter>>>,
}

/// One-shot resumption handle for a queued task.
struct Waiter {
    /// Set by `release` when ownership is handed to this waiter.
    granted: Cell<bool>,

    /// Waker of the suspended task, refreshed on every pending poll.
    waker: RefCell<Option<Waker>>,
}

impl Waiter {
    fn new(waker: &Waker) -> Self {
        Self {
            granted: Cell::new(false),
            waker: RefCell::new(Some(waker.clone())),
        }
    }

    /// Hands ownership to the waiting task and wakes it.
    fn grant(&self) {
        self.granted.set(true);

        if let Some(waker) = self.waker.borrow_mut().take() {
            waker.wake();
        }
    }
}

impl Mutex {
    /// Creates a new, unlocked mutex with no waiters.
    pub fn new() -> Self {
        Self {
            held: Cell::new(false),
            waiters: RefCell::new(VecDeque::new()),
        }
    }

    /// Returns `true` if some task currently holds the lock.
    pub fn is_held(&self) -> bool {
        self.held.get()
    }

    /// Attempts to take the lock without suspending.
    ///
    /// Returns `false` whenever the lock is held, even if no task is queued.
    /// A failed attempt never queues the caller.
    pub fn try_acquire(&self) -> bool {
        if self.held.get() {
            return false;
        }

        self.held.set(true);
        true
    }

    /// Returns a future that resolves once the caller holds the lock.
    ///
    /// If the lock is free it is taken on the first poll without suspending.
    /// Otherwise the caller joins the back of the queue and is resumed by the
    /// [`release`](Self::release) that hands it ownership.
    ///
    /// The lock is not reentrant: a holder that acquires again waits behind
    /// itself until someone else releases.
    pub fn acquire(&self) -> Acquire<'_> {
        Acquire {
            mutex: self,
            waiter: None,
            done: false,
        }
    }

    /// Releases the lock.
    ///
    /// If tasks are waiting, ownership passes to the oldest one and the lock
    /// stays held. Otherwise the lock becomes free. Releasing a free mutex
    /// does nothing.
    pub fn release(&self) {
        let next = self.waiters.borrow_mut().pop_front();

        match next {
            Some(waiter) => {
                log::trace!("mutex: ownership transferred to next waiter");
                waiter.grant();
            }
            None => {
                if self.held.replace(false) {
                    log::trace!("mutex: released, no waiters");
                }
            }
        }
    }

    /// Attempts to take the lock without suspending, returning a guard that
    /// releases it when dropped.
    pub fn try_lock(&self) -> Option<MutexGuard<'_>> {
        if self.try_acquire() {
            Some(MutexGuard { mutex: self })
        } else {
            None
        }
    }

    /// Returns a future that resolves to a guard once the lock is held.
    ///
    /// Dropping the guard releases the lock.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let guard = mutex.lock().await;
    /// // critical section
    /// drop(guard);
    /// ```
    pub fn lock(&self) -> Lock<'_> {
        Lock {
            acquire: self.acquire(),
        }
    }

    /// Runs `task` while holding the lock and returns its output.
    ///
    /// The lock is taken through the non-suspending fast path when possible.
    /// It is released exactly once however the task ends: by returning
    /// (including an `Err` value, which is passed through untouched), by
    /// panicking, or by this future being dropped mid-task.
    pub async fn with_lock<F, Fut>(&self, task: F) -> Fut::Output
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        let _guard = match self.try_lock() {
            Some(guard) => guard,
            None => self.lock().await,
        };

        task().await
    }

    /// Removes a waiter that gave up before being granted.
    fn forget(&self, waiter: &Rc<Waiter>) {
        self.waiters
            .borrow_mut()
            .retain(|queued| !Rc::ptr_eq(queued, waiter));
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Mutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex")
            .field("held", &self.held.get())
            .field("waiters", &self.waiters.borrow().len())
            .finish()
    }
}

/// Future returned by [`Mutex::acquire`].
///
/// Dropping it while queued removes the caller from the queue. Dropping it
/// after ownership was handed over but before it was observed releases the
/// lock again, so the next waiter is not stranded.
#[must_use = "futures do nothing unless polled"]
pub struct Acquire<'a> {
    mutex: &'a Mutex,
    waiter: Option<Rc<Waiter>>,
    done: bool,
}

impl Future for Acquire<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();

        if this.done {
            return Poll::Ready(());
        }

        match &this.waiter {
            None => {
                if this.mutex.try_acquire() {
                    this.done = true;
                    return Poll::Ready(());
                }

                let waiter = Rc::new(Waiter::new(cx.waker()));
                this.mutex.waiters.borrow_mut().push_back(waiter.clone());
                this.waiter = Some(waiter);

                log::trace!("mutex: contended, task queued");
                Poll::Pending
            }
            Some(waiter) => {
                if waiter.granted.get() {
                    this.done = true;
                    this.waiter = None;
                    return Poll::Ready(());
                }

                *waiter.waker.borrow_mut() = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl Drop for Acquire<'_> {
    fn drop(&mut self) {
        let Some(waiter) = self.waiter.take() else {
            return;
        };

        if waiter.granted.get() {
            self.mutex.release();
        } else {
            self.mutex.forget(&waiter);
        }
    }
}

/// Future returned by [`Mutex::lock`].
#[must_use = "futures do nothing unless polled"]
pub struct Lock<'a> {
    acquire: Acquire<'a>,
}

impl<'a> Future for Lock<'a> {
    type Output = MutexGuard<'a>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        match Pin::new(&mut this.acquire).poll(cx) {
            Poll::Ready(()) => Poll::Ready(MutexGuard {
                mutex: this.acquire.mutex,
            }),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Scoped ownership of a [`Mutex`].
///
/// Releases the lock when dropped, including during unwinding.
#[must_use = "if unused the Mutex will immediately unlock"]
pub struct MutexGuard<'a> {
    mutex: &'a Mutex,
}

impl MutexGuard<'_> {
    /// Returns the mutex this guard holds.
    pub fn mutex(&self) -> &Mutex {
        self.mutex
    }
}

impl Drop for MutexGuard<'_> {
    fn drop(&mut self) {
        self.mutex.release();
    }
}

impl fmt::Debug for MutexGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutexGuard").finish_non_exhaustive()
    }
}
