use super::builder::Config;
use super::context;
use super::error::RuntimeError;
use super::executor::core::Executor;
use super::task::JoinHandle;

use std::future::Future;
use std::rc::Rc;

/// The main runtime handle.
///
/// `Runtime` is responsible for:
/// - spawning asynchronous tasks,
/// - driving task execution on the current thread,
/// - firing timers,
/// - providing a synchronous entry point via [`block_on`](Self::block_on).
///
/// All tasks run on the thread calling `block_on`, one at a time. Tasks
/// are therefore not required to be `Send`, and the runtime itself is
/// neither `Send` nor `Sync`.
///
/// Dropping the runtime drops every unfinished task.
pub struct Runtime {
    /// Task executor responsible for scheduling and running futures.
    executor: Rc<Executor>,

    /// Parameters chosen through the builder.
    config: Config,
}

impl Runtime {
    /// Creates a new runtime instance.
    pub(crate) fn new(config: Config) -> Self {
        Self {
            executor: Rc::new(Executor::new()),
            config,
        }
    }

    /// Spawns a future onto the runtime.
    ///
    /// The task starts running at the next call to
    /// [`block_on`](Self::block_on), or immediately if called from a task
    /// of this runtime.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let handle = runtime.spawn(async { 1 + 1 });
    /// assert_eq!(runtime.block_on(handle).unwrap(), 2);
    /// ```
    pub fn spawn<F, T>(&self, future: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + 'static,
        T: 'static,
    {
        self.executor.spawn(future)
    }

    /// Runs a future to completion, blocking the current thread.
    ///
    /// This method is typically used as the synchronous entry point
    /// of the runtime (e.g. in `main` or tests). Spawned tasks make
    /// progress while the future runs.
    ///
    /// # Panics
    ///
    /// Panics if the runtime stalls before the future completes (see
    /// [`RuntimeBuilder::stall_detection`](super::RuntimeBuilder::stall_detection)),
    /// if called from within a runtime, or if the future itself panics.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let result = runtime.block_on(async {
    ///     42
    /// });
    /// assert_eq!(result, 42);
    /// ```
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        match self.try_block_on(future) {
            Ok(output) => output,
            Err(err) => panic!("block_on failed: {err}"),
        }
    }

    /// Runs a future to completion, reporting a stall instead of panicking.
    pub fn try_block_on<F: Future>(&self, future: F) -> Result<F::Output, RuntimeError> {
        if context::is_entered() {
            return Err(RuntimeError::Nested);
        }

        log::debug!("runtime: entering block_on");

        let result = context::enter_context(self.executor.clone(), || {
            self.executor.block_on(future, &self.config)
        });

        log::debug!("runtime: leaving block_on");
        result
    }
}

impl Drop for Runtime {
    /// Shuts down the runtime, dropping unfinished tasks and timers.
    fn drop(&mut self) {
        context::enter_context(self.executor.clone(), || self.executor.shutdown());
    }
}
