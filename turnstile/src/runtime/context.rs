use crate::runtime::executor::core::Executor;

use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    /// Thread-local handle to the executor currently driving this thread.
    ///
    /// This is set while inside `block_on` and allows runtime components
    /// (spawning, timers) to reach the executor without explicit parameter
    /// passing.
    static CURRENT_EXECUTOR: RefCell<Option<Rc<Executor>>> = const { RefCell::new(None) };
}

/// Restores the previous context when dropped, including during unwinding.
struct ContextGuard {
    previous: Option<Rc<Executor>>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT_EXECUTOR.with(|cell| *cell.borrow_mut() = previous);
    }
}

/// Enters the runtime execution context for the current thread.
///
/// This function installs `executor` as the current executor for the
/// duration of the closure `f`. After the closure completes, or unwinds,
/// the previous context is restored.
pub(crate) fn enter_context<R>(executor: Rc<Executor>, f: impl FnOnce() -> R) -> R {
    let previous = CURRENT_EXECUTOR.with(|cell| cell.borrow_mut().replace(executor));
    let _guard = ContextGuard { previous };

    f()
}

/// Returns `true` if this thread is already driving a runtime.
pub(crate) fn is_entered() -> bool {
    CURRENT_EXECUTOR.with(|cell| cell.borrow().is_some())
}

/// Runs `f` with the current executor, or returns `None` outside a runtime.
pub(crate) fn with_current<R>(f: impl FnOnce(&Executor) -> R) -> Option<R> {
    let executor = CURRENT_EXECUTOR.with(|cell| cell.borrow().clone())?;
    Some(f(&executor))
}
