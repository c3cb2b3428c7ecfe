use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Error returned by a [`JoinHandle`] whose task did not run to completion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    /// The task panicked. Holds the panic message when it was a string.
    #[error("task panicked: {0}")]
    Panicked(String),
}

impl JoinError {
    /// Returns `true` if the task panicked.
    pub fn is_panic(&self) -> bool {
        matches!(self, JoinError::Panicked(_))
    }
}

/// Completion slot shared between a task and its handle.
pub(crate) struct JoinState<T> {
    result: RefCell<Option<Result<T, JoinError>>>,
    finished: Cell<bool>,
    waker: RefCell<Option<Waker>>,
}

impl<T> JoinState<T> {
    pub(crate) fn new() -> Self {
        Self {
            result: RefCell::new(None),
            finished: Cell::new(false),
            waker: RefCell::new(None),
        }
    }

    /// Stores the outcome of the task and wakes the handle, if awaited.
    pub(crate) fn complete(&self, result: Result<T, JoinError>) {
        *self.result.borrow_mut() = Some(result);
        self.finished.set(true);

        if let Some(waker) = self.waker.borrow_mut().take() {
            waker.wake();
        }
    }
}

/// A handle to a spawned task.
///
/// A `JoinHandle` allows awaiting the result of a task spawned onto
/// the runtime. It implements [`Future`] and resolves once the task
/// has completed.
///
/// Dropping the `JoinHandle` does **not** cancel the task; it only
/// discards the ability to observe its result.
pub struct JoinHandle<T> {
    state: Rc<JoinState<T>>,
}

impl<T> JoinHandle<T> {
    pub(crate) fn new(state: Rc<JoinState<T>>) -> Self {
        Self { state }
    }

    /// Returns `true` once the task has finished, successfully or not.
    pub fn is_finished(&self) -> bool {
        self.state.finished.get()
    }
}

impl<T> Future for JoinHandle<T> {
    /// The output of the spawned task, or why it has none.
    type Output = Result<T, JoinError>;

    /// Polls the join handle.
    ///
    /// If the task has already completed, its result is returned
    /// immediately. Otherwise, the current waker is registered and
    /// the future returns `Poll::Pending`.
    ///
    /// # Panics
    ///
    /// Panics if polled again after returning `Poll::Ready`.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.state.finished.get() {
            let result = self
                .state
                .result
                .borrow_mut()
                .take()
                .expect("JoinHandle polled after completion");

            return Poll::Ready(result);
        }

        *self.state.waker.borrow_mut() = Some(cx.waker().clone());
        Poll::Pending
    }
}
