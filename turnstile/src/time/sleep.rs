use crate::runtime::context;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Creates a future that completes after the given duration.
///
/// The returned sleep future arms a timer on the current runtime and
/// completes once the duration has elapsed.
///
/// # Panics
///
/// Panics if polled outside of a running runtime.
///
/// # Examples
///
/// ```rust,ignore
/// use std::time::Duration;
///
/// sleep(Duration::from_millis(10)).await;
/// ```
pub fn sleep(duration: Duration) -> Sleep {
    Sleep::new(duration)
}

/// A future that completes once a specific deadline is reached.
///
/// `Sleep` arms a timer on first poll. The timer is cancelled if the
/// future is dropped before completion, so an abandoned sleep never wakes
/// its task.
#[must_use = "futures do nothing unless polled"]
pub struct Sleep {
    /// Absolute point in time when the sleep completes.
    deadline: Instant,

    /// Whether the timer has already been armed.
    registered: bool,

    /// Cancellation flag shared with the timer entry.
    cancelled: Arc<AtomicBool>,
}

impl Sleep {
    /// Creates a new `Sleep` future that completes after `duration`.
    ///
    /// The timer is not armed until the future is first polled.
    pub(crate) fn new(duration: Duration) -> Self {
        Self {
            deadline: Instant::now() + duration,
            registered: false,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns the instant at which the sleep completes.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if Instant::now() >= this.deadline {
            return Poll::Ready(());
        }

        if !this.registered {
            this.registered = true;

            context::with_current(|executor| {
                executor.register_timer(this.deadline, cx.waker().clone(), this.cancelled.clone());
            })
            .expect("Sleep polled outside of runtime");
        }

        Poll::Pending
    }
}

impl Drop for Sleep {
    /// Cancels the timer if the sleep future is dropped before completion.
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Release);
    }
}
